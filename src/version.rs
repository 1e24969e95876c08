//! Built-in version service.
//!
//! Registered on every listener whose spec carries a [`Version`]; answers
//! `GET` or `POST /version.API/GetVersion`.

use std::fmt;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Service name the version methods are mounted under.
pub const SERVICE_NAME: &str = "version.API";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    /// Free-form suffix, e.g. `-rc1`.
    #[serde(default)]
    pub additional: String,
}

impl Version {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            additional: String::new(),
        }
    }

    pub fn with_additional(mut self, additional: impl Into<String>) -> Self {
        self.additional = additional.into();
        self
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}{}", self.major, self.minor, self.micro, self.additional)
    }
}

/// Method routes of the version service.
pub fn version_service(version: Version) -> Router {
    Router::new()
        .route("/GetVersion", get(get_version).post(get_version))
        .with_state(Arc::new(version))
}

async fn get_version(State(version): State<Arc<Version>>) -> Json<Version> {
    Json(version.as_ref().clone())
}
