//! Records status messages and uptime-probe results against services,
//! creating each service on first sight.

pub mod app;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pool;
pub mod rows;
pub mod schema;
pub mod service;
pub mod state;
pub mod timestamps;
pub mod tls;
pub mod writer;
