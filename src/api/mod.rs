//! HTTP API
//!
//! Every route except `/health` resolves the caller from the bearer token
//! before touching the store.

mod goals;
mod sparks;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{bearer_token, Authenticator};
use crate::error::{ApiError, ApiResult};
use crate::service::SparkService;

#[derive(Clone)]
pub struct AppState {
    pub service: SparkService,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(service: SparkService, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            authenticator,
        }
    }

    /// User id of the authenticated caller; provisions their profile
    async fn caller(&self, headers: &HeaderMap) -> ApiResult<String> {
        let Some(token) = bearer_token(headers) else {
            warn!("request without bearer token");
            return Err(ApiError::Unauthorized);
        };

        let Some(user_id) = self.authenticator.authenticate(token).await else {
            warn!("request with unknown bearer token");
            return Err(ApiError::Unauthorized);
        };

        self.service.ensure_profile(&user_id)?;
        Ok(user_id)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/goals", get(goals::list).post(goals::create))
        .route(
            "/goals/{id}",
            get(goals::show).patch(goals::update).delete(goals::remove),
        )
        .route("/goals/{id}/completed-sparks", get(goals::completed))
        .route("/sparks/generate", post(sparks::generate))
        .route("/sparks/complete", post(sparks::complete))
        .route("/sparks/{goal_id}", get(sparks::list))
        .with_state(state)
}

/// Serve the API until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "spark API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Distinguish an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
