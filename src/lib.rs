pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod service;
pub mod session;
pub mod store;

pub use api::{router, AppState};
pub use auth::{Authenticator, TokenAuthenticator};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use generator::{ChatCompletionsGenerator, SparkGenerator, Suggestion};
pub use service::SparkService;
pub use store::SparkStore;
