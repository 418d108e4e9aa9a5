//! Typed request client.
//!
//! # Design
//! `RequestClient` holds only read-only configuration and its collaborators,
//! so one instance can serve any number of concurrent calls. A call runs in
//! a fixed order: build the `HttpRequest` (pure), log it, execute it through
//! the `Transport`, validate status and content type, decode, then run the
//! validation hook. Every failure is classified into a `RequestError` and
//! logged once before it is returned.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::config::ClientConfig;
use crate::decode::{Decoder, JsonDecoder};
use crate::endpoint::{apply_query, resolve_url, Endpoint};
use crate::error::{error_chain, RequestError, TransportError, TransportErrorKind};
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse};
use crate::logging::{emit, LogRecord, LogSink, TracingSink};
use crate::transport::Transport;
use crate::validate::{AcceptAll, Validator};

const REDACTED: &str = "<redacted>";

/// Builds, executes and decodes requests described by `Endpoint`s.
#[derive(Clone)]
pub struct RequestClient<X, D = JsonDecoder> {
    config: ClientConfig,
    transport: X,
    decoder: D,
    sink: Arc<dyn LogSink>,
}

impl<X: Transport> RequestClient<X> {
    /// Client decoding JSON and logging through `tracing`.
    pub fn new(config: ClientConfig, transport: X) -> Self {
        Self {
            config,
            transport,
            decoder: JsonDecoder,
            sink: Arc::new(TracingSink),
        }
    }
}

impl<X: Transport, D: Decoder> RequestClient<X, D> {
    pub fn with_decoder<D2: Decoder>(self, decoder: D2) -> RequestClient<X, D2> {
        RequestClient {
            config: self.config,
            transport: self.transport,
            decoder,
            sink: self.sink,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve `endpoint` against the environment without doing any I/O.
    pub fn build_request(&self, endpoint: &Endpoint) -> Result<HttpRequest, RequestError> {
        let env = &self.config.environment;
        let base = endpoint.base_url.as_ref().unwrap_or(&env.base_url);
        let mut url = resolve_url(base, &endpoint.path).map_err(|e| {
            RequestError::InvalidRequest(
                format!("cannot resolve path {:?} against {base}", endpoint.path),
                Some(e.into()),
            )
        })?;
        if let Some(query) = &endpoint.query {
            apply_query(&mut url, query);
        }

        let mut headers = Vec::new();
        if !env.api_key.is_empty() {
            set_header(&mut headers, &self.config.api_key_header, &env.api_key);
        }
        for (name, value) in &endpoint.headers {
            set_header(&mut headers, name, value);
        }

        let body = match &endpoint.body {
            Some(body) if endpoint.method.is_mutating() => {
                let json = serde_json::to_string(body).map_err(|e| {
                    RequestError::InvalidRequest("body is not serializable".to_string(), Some(e.into()))
                })?;
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                    set_header(&mut headers, "content-type", "application/json");
                }
                Some(json)
            }
            _ => None,
        };

        Ok(HttpRequest {
            method: endpoint.method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Execute `endpoint` and decode the response as `T`, accepting any
    /// well-formed value (`AcceptAll`).
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, RequestError> {
        self.run(endpoint, &AcceptAll, None).await
    }

    /// Like `request`, then run `validator` over the decoded value. A
    /// rejection yields `RequestError::Validation` and the value is dropped.
    pub async fn request_validated<T, V>(
        &self,
        endpoint: &Endpoint,
        validator: &V,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        V: Validator<T> + ?Sized,
    {
        self.run(endpoint, validator, None).await
    }

    /// Like `request`, but gives up as soon as `token` is cancelled. The
    /// in-flight transport call is dropped and the result is
    /// `RequestError::Unknown` wrapping a cancelled `TransportError`.
    pub async fn request_until_cancelled<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        token: &CancellationToken,
    ) -> Result<T, RequestError> {
        self.run(endpoint, &AcceptAll, Some(token)).await
    }

    async fn run<T, V>(
        &self,
        endpoint: &Endpoint,
        validator: &V,
        token: Option<&CancellationToken>,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        V: Validator<T> + ?Sized,
    {
        let request = match self.build_request(endpoint) {
            Ok(request) => request,
            Err(err) => {
                // No URL to report, so the bare path stands in.
                self.log_failure(endpoint.method, &endpoint.path, &err);
                return Err(err);
            }
        };
        self.log_request(endpoint, &request);

        let method = request.method;
        let url = request.url.clone();
        let result = match token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(RequestError::from(TransportError::cancelled())),
                result = self.perform(request, validator) => result,
            },
            None => self.perform(request, validator).await,
        };
        if let Err(err) = &result {
            self.log_failure(method, &url, err);
        }
        result
    }

    async fn perform<T, V>(&self, request: HttpRequest, validator: &V) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        V: Validator<T> + ?Sized,
    {
        let method = request.method;
        let url = request.url.clone();
        let accept = request.header("accept").map(str::to_owned);
        let response = self.transport.execute(request, &self.config.trust).await?;
        self.log_response(method, &url, &response);
        check_response(&response, accept.as_deref())?;

        let value: T = self.decode(method, &response)?;
        validator.validate(&value).map_err(RequestError::Validation)?;
        Ok(value)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        response: &HttpResponse,
    ) -> Result<T, RequestError> {
        let empty_allowed = matches!(response.status, 204 | 205) || method == HttpMethod::Head;
        let bytes: &[u8] = if response.body.is_empty() && empty_allowed {
            b"null"
        } else {
            &response.body
        };
        Ok(self.decoder.decode(bytes)?)
    }

    fn log(&self, record: LogRecord) {
        emit(self.sink.as_ref(), &record);
    }

    fn log_request(&self, endpoint: &Endpoint, request: &HttpRequest) {
        if !self.config.logging_enabled {
            return;
        }
        let mut record = LogRecord::new(Level::INFO, "sending request");
        record.method = Some(request.method);
        record.url = Some(request.url.clone());
        record.query = endpoint.query.clone().unwrap_or_default();
        record.headers = request
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(&self.config.api_key_header) {
                    (k.clone(), REDACTED.to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect();
        record.body = request.body.clone();
        self.log(record);
    }

    fn log_response(&self, method: HttpMethod, url: &str, response: &HttpResponse) {
        if !self.config.logging_enabled {
            return;
        }
        let mut record = LogRecord::new(Level::DEBUG, "received response");
        record.method = Some(method);
        record.url = Some(url.to_string());
        record.status = Some(response.status);
        self.log(record);
    }

    fn log_failure(&self, method: HttpMethod, url: &str, err: &RequestError) {
        if !self.config.logging_enabled {
            return;
        }
        let mut record = LogRecord::new(Level::ERROR, "request failed");
        record.method = Some(method);
        record.url = Some(url.to_string());
        record.status = err.status();
        record.error = Some(error_chain(err));
        self.log(record);
    }
}

/// Reject non-2xx statuses and, when the request named acceptable media
/// types, bodies whose content type is not among them.
fn check_response(response: &HttpResponse, accept: Option<&str>) -> Result<(), TransportError> {
    if !response.is_success() {
        return Err(TransportError::unacceptable_status(response.status));
    }
    let (Some(accept), Some(content_type)) = (accept, response.header("content-type")) else {
        return Ok(());
    };
    if response.body.is_empty() || media_type_accepted(accept, content_type) {
        return Ok(());
    }
    Err(TransportError::new(
        TransportErrorKind::ResponseValidation,
        format!("response content type {content_type:?} is not acceptable: {accept}"),
    ))
}

fn media_type_accepted(accept: &str, content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let Some((kind, _)) = essence.split_once('/') else {
        return false;
    };
    accept.split(',').any(|range| {
        let range = range.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match range.split_once('/') {
            Some(("*", "*")) => true,
            Some((range_kind, "*")) => range_kind == kind,
            _ => range == essence,
        }
    })
}
