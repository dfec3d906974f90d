use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;

use crate::auth::TokenService;
use crate::config::Config;
use crate::store::Store;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    /// Built once at startup; the signing secret and token lifetimes are
    /// fixed for the life of the process.
    pub tokens: Arc<TokenService>,
}

impl SharedState {
    pub async fn new(config: Config, signing_secret: &str) -> anyhow::Result<Self> {
        let store = Store::open(config.general.data_path.as_str()).await?;

        let tokens = Arc::new(TokenService::new(
            signing_secret,
            Duration::hours(config.auth.session_ttl_hours),
            Duration::minutes(config.auth.reset_ttl_minutes),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tokens,
        })
    }
}
