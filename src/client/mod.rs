//! Authenticated REST client
//!
//! ## Architecture
//!
//! - **HttpTransport**: sends one request, no auth knowledge (`ReqwestTransport` in production)
//! - **TokenRefresher**: exchanges a refresh token (`HttpTokenRefresher` over the raw transport)
//! - **ApiClient**: bearer decoration plus single-flight refresh and request queuing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use engage_client::client::build_api_client;
//! use engage_client::client::api_client::LogRedirect;
//! use engage_client::config::ApiConfig;
//! use engage_client::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let client = build_api_client(&ApiConfig::default(), Arc::new(MemoryStore::new()), Arc::new(LogRedirect))?;
//! let conversations: serde_json::Value = client.get("/conversations").await?;
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod refresh;
pub mod transport;

pub use api_client::{ApiClient, LogRedirect, LoginRedirect, LOGIN_PATH};
pub use refresh::{HttpTokenRefresher, TokenRefresher};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, TransportConfig};

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::errors::AppResult;
use crate::storage::CredentialStore;

/// Wire the production stack: reqwest transport, HTTP refresher, shared store
pub fn build_api_client(
    config: &ApiConfig,
    store: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
) -> AppResult<Arc<ApiClient>> {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.into())?);
    let refresher = Arc::new(HttpTokenRefresher::new(transport.clone()));
    Ok(Arc::new(ApiClient::new(transport, store, refresher, redirect)))
}
