//! Transport Trait
//!
//! The seam between the typed backend API and the wire. `HttpClient` is the
//! production implementation; tests substitute scripted transports.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::request::ApiRequest;

/// Sends one request and returns the decoded JSON body.
///
/// Implementations must reject with a classified [`crate::ApiError`] on any
/// non-2xx response or transport failure, and must log the failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<serde_json::Value>;
}
