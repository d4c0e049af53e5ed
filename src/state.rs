use crate::config::Config;
use crate::store::TransactionStore;

pub struct AppState {
    pub config: Config,
    pub store: TransactionStore,
}
