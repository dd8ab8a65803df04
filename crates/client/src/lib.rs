//! AspirePath Client
//!
//! Network layer for the AspirePath backend:
//! - `http_client` - the configured reqwest-backed [`Transport`]
//! - `dedup` - coalescing of concurrent identical requests
//! - `api` - typed backend operations and envelope decoding
//! - `error` - the `network`/`timeout`/`client`/`server`/`malformed-response`/
//!   `application-failure` taxonomy

pub mod api;
pub mod dedup;
pub mod error;
pub mod http_client;
pub mod request;
pub mod transport;

pub use api::{CareerApi, ReviewEnvelope};
pub use dedup::{Deduped, RequestDeduplicator};
pub use error::{parse_http_error, ApiError, ApiErrorKind, ApiResult};
pub use http_client::{build_http_client, ClientConfig, HttpClient};
pub use request::{ApiRequest, FormPart, RequestBody};
pub use transport::Transport;
