//! Fulcrum records API client
//!
//! Submissions are fire-and-forget: each one runs on its own thread and only
//! reports through the log. Polling is synchronous and returns the page to the
//! caller.

mod poll;
mod submit;

pub use poll::PagePoller;
pub use submit::{DetachedSubmitter, Receipt, RecordSender, SubmissionTracker, Submit};

use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::ServiceConfig;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "X-ApiToken";

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("API token variable {0} is not set")]
    MissingToken(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service answered {status}")]
    Status { status: StatusCode, body: String },
}

/// API token looked up in the environment on every request, so a rotated
/// token is picked up without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    env_var: String,
}

impl Credentials {
    pub fn from_env_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    pub fn token(&self) -> Result<String, RemoteError> {
        match std::env::var(&self.env_var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(RemoteError::MissingToken(self.env_var.clone())),
        }
    }
}

/// Blocking HTTP client for the records endpoint.
///
/// Cheap to share behind an `Arc`: concurrent requests do not wait on each
/// other.
pub struct FulcrumClient {
    http: Client,
    config: ServiceConfig,
    credentials: Credentials,
}

impl FulcrumClient {
    pub fn new(config: ServiceConfig) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let credentials = Credentials::from_env_var(config.token_env.clone());
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
