//! `Transport` backed by `reqwest`.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Certificate, Client, ClientBuilder, Method, Url};

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::trust::{TrustAnchors, TrustPolicy};

const USER_AGENT: &str = concat!("request-core/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configures timeouts and the user agent of a `ReqwestTransport`.
#[derive(Debug, Clone)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: String,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ReqwestTransportBuilder {
    /// Total time allowed for one request, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the shared client and warm the trust client cache with the
    /// anchors used by `trust`.
    pub fn build(self, trust: &TrustPolicy) -> Result<ReqwestTransport, TransportError> {
        let default = self.client_builder().build().map_err(map_reqwest_error)?;
        let mut clients = HashMap::new();
        for (_, evaluator) in trust.hosts() {
            let anchors = evaluator.anchors();
            if clients.contains_key(&anchors) {
                continue;
            }
            if let Some(client) = self.client_for_anchors(&anchors)? {
                clients.insert(anchors, client);
            }
        }
        Ok(ReqwestTransport {
            builder: self,
            default,
            clients: Arc::new(RwLock::new(clients)),
        })
    }

    fn client_builder(&self) -> ClientBuilder {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
    }

    fn client_for_anchors(&self, anchors: &TrustAnchors) -> Result<Option<Client>, TransportError> {
        let builder = match anchors {
            TrustAnchors::System => return Ok(None),
            TrustAnchors::Pinned(certificates) => {
                let mut builder = self.client_builder().tls_built_in_root_certs(false);
                for pem in certificates {
                    let certificate = Certificate::from_pem(pem).map_err(|e| {
                        TransportError::invalid_request("pinned certificate is not valid PEM")
                            .with_source(e)
                    })?;
                    builder = builder.add_root_certificate(certificate);
                }
                builder
            }
            TrustAnchors::AcceptAny => self.client_builder().danger_accept_invalid_certs(true),
        };
        builder.build().map(Some).map_err(map_reqwest_error)
    }
}

/// HTTP transport over a pooled `reqwest::Client`.
///
/// Trust comes from the policy passed to each `execute` call. Clients for
/// non-system anchors are cached by anchors, so hosts sharing a pin share a
/// connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    builder: ReqwestTransportBuilder,
    default: Client,
    clients: Arc<RwLock<HashMap<TrustAnchors, Client>>>,
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Transport with default settings, pre-building clients for `trust`.
    pub fn new(trust: &TrustPolicy) -> Result<Self, TransportError> {
        Self::builder().build(trust)
    }

    /// Pick the client for `host` under the per-call `trust` policy.
    fn client_for(&self, host: &str, trust: &TrustPolicy) -> Result<Client, TransportError> {
        let anchors = anchors_for(host, trust);
        if anchors == TrustAnchors::System {
            return Ok(self.default.clone());
        }
        if let Some(client) = self.clients.read().ok().and_then(|c| c.get(&anchors).cloned()) {
            return Ok(client);
        }
        let client = match self.builder.client_for_anchors(&anchors)? {
            Some(client) => client,
            None => return Ok(self.default.clone()),
        };
        if let Ok(mut clients) = self.clients.write() {
            clients.entry(anchors).or_insert_with(|| client.clone());
        }
        Ok(client)
    }
}

/// Anchors for `host`; hosts absent from `trust` use system roots.
fn anchors_for(host: &str, trust: &TrustPolicy) -> TrustAnchors {
    trust
        .evaluator_for(host)
        .map(|evaluator| evaluator.anchors())
        .unwrap_or(TrustAnchors::System)
}

#[async_trait]
impl super::Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        trust: &TrustPolicy,
    ) -> Result<HttpResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(|e| {
            TransportError::invalid_request(format!("invalid url {}", request.url)).with_source(e)
        })?;
        let client = match url.host_str() {
            Some(host) => self.client_for(host, trust)?,
            None => self.default.clone(),
        };

        let mut builder = client
            .request(method(request.method), url)
            .headers(header_map(&request.headers)?);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (k, v) in headers {
        let name = HeaderName::from_str(k).map_err(|e| {
            TransportError::invalid_request(format!("invalid header name ({k})")).with_source(e)
        })?;
        let value = HeaderValue::from_str(v).map_err(|e| {
            TransportError::invalid_request(format!("invalid header value for {k}")).with_source(e)
        })?;
        map.append(name, value);
    }
    Ok(map)
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::TimedOut
    } else if err.is_connect() {
        TransportErrorKind::NotConnected
    } else if err.is_builder() {
        TransportErrorKind::InvalidRequest
    } else if let Some(status) = err.status() {
        TransportErrorKind::UnacceptableStatus(status.as_u16())
    } else {
        TransportErrorKind::Other
    };
    let message = match err.url() {
        Some(url) => format!("request to {url} failed"),
        None => "request failed".to_string(),
    };
    TransportError::new(kind, message).with_source(err)
}
