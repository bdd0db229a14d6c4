use ingest_service::{app, config::IngestConfig, pool, schema, state::AppState};
use status_common::{bind_listener, init_tracing, shutdown_signal};

#[tokio::main]
async fn main() {
    let _guards = init_tracing("ingest-service");

    let config = IngestConfig::from_env().expect("database configuration");
    let store = pool::connect(config.database.clone(), config.pool_settings())
        .await
        .expect("connect db");

    if config.bootstrap_schema {
        let mut client = pool::acquire(&store).await.expect("bootstrap connection");
        schema::bootstrap(&mut client).await.expect("bootstrap schema");
    }

    let state = AppState {
        pool: store,
        max_tx_attempts: config.max_tx_attempts,
    };
    let app = app::build_router(state, config.request_timeout);
    let listener = bind_listener(config.port).await.expect("bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("serve");
}
