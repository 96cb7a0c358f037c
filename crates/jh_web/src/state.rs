use std::sync::Arc;

use jh_providers::Services;
use jh_storage::Moderator;

pub struct AppState {
    pub services: Arc<Services>,
    pub moderator: Moderator,
}

impl AppState {
    pub fn new(services: Services, moderator: Moderator) -> Self {
        Self {
            services: Arc::new(services),
            moderator,
        }
    }
}
