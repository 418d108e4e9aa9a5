//! Typed API request client core.
//!
//! # Overview
//! Turns declarative `Endpoint` descriptions into HTTP calls against an
//! `Environment`, decodes the responses into caller-chosen types, and
//! reports every failure as one `RequestError` variant.
//!
//! # Design
//! - `RequestClient` is stateless across calls; it holds only its
//!   `ClientConfig` and collaborators.
//! - The network sits behind the `Transport` trait. `ReqwestTransport` is
//!   the bundled implementation (feature `reqwest-transport`, on by default).
//! - Decoding (`Decoder`), logging (`LogSink`) and TLS trust
//!   (`TrustEvaluator`) are likewise injected.
//! - `RequestClient::build_request` is pure, so the exact outgoing request
//!   can be inspected in tests without a server.

pub mod client;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logging;
pub mod transport;
pub mod trust;
pub mod validate;

pub use client::RequestClient;
pub use config::{ClientConfig, ConfigError, DEFAULT_API_KEY_HEADER};
pub use decode::{DecodeError, Decoder, JsonDecoder};
pub use endpoint::{Endpoint, Environment, JsonMap};
pub use error::{classify, error_chain, BoxError, RequestError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use logging::{LogRecord, LogSink, TracingSink};
pub use transport::Transport;
#[cfg(feature = "reqwest-transport")]
pub use transport::{ReqwestTransport, ReqwestTransportBuilder};
pub use trust::{
    DefaultTrustEvaluator, DisabledTrustEvaluator, PinnedCertificatesEvaluator, TrustAnchors,
    TrustEvaluator, TrustPolicy,
};
pub use validate::{AcceptAll, Predicate, Validator};

pub use tokio_util::sync::CancellationToken;
