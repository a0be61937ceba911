use std::sync::Arc;

use storage::Database;

use crate::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
    pub checkout_base_url: Arc<str>,
}
