use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::db::UserStore;

/// Application context containing shared dependencies.
/// Built once at startup; handlers and middleware receive it as `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenService>, config: Arc<Config>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }
}
