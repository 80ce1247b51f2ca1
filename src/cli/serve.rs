use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

use crate::api::{self, AppState};
use crate::auth::TokenAuthenticator;
use crate::config::Config;
use crate::service::SparkService;

pub async fn run(config: &Config, service: SparkService, bind: Option<String>) -> Result<()> {
    let addr = match bind {
        Some(bind) => bind.parse()?,
        None => config.bind_addr()?,
    };

    let authenticator = TokenAuthenticator::from_config(&config.auth);
    if authenticator.is_empty() {
        warn!("no auth tokens configured, every request will be rejected");
    }
    if config.generator.api_key().is_none() {
        warn!(
            env = %config.generator.api_key_env,
            "no generator API key, sparks will use the fallback suggestion"
        );
    }

    api::serve(AppState::new(service, Arc::new(authenticator)), addr).await
}
