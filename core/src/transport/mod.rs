//! The seam between the client and the network.
//!
//! # Design
//! A `Transport` executes one fully built `HttpRequest` and reports either
//! the raw response or a `TransportError` with a reason code. Non-2xx
//! responses are returned as data; the client decides what is acceptable.
//! The trust policy is passed on every call so a transport never needs to
//! be rebuilt when it is shared between clients.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::trust::TrustPolicy;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport;

#[cfg(feature = "reqwest-transport")]
pub use reqwest_transport::{ReqwestTransport, ReqwestTransportBuilder};

/// Executes HTTP requests on behalf of `RequestClient`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: HttpRequest,
        trust: &TrustPolicy,
    ) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(
        &self,
        request: HttpRequest,
        trust: &TrustPolicy,
    ) -> Result<HttpResponse, TransportError> {
        (**self).execute(request, trust).await
    }
}
