use crate::pool::StorePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: StorePool,
    pub max_tx_attempts: u32,
}
