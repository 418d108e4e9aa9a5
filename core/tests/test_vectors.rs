//! Verify request building and error classification against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON, not raw strings, so field order in the
//! vector files does not matter.

use async_trait::async_trait;
use request_core::{
    classify, ClientConfig, Endpoint, Environment, HttpMethod, HttpRequest, HttpResponse,
    JsonMap, RequestClient, RequestError, Transport, TransportError, TransportErrorKind,
    TrustPolicy,
};

/// Building requests never reaches the transport.
struct Unreachable;

#[async_trait]
impl Transport for Unreachable {
    async fn execute(
        &self,
        _request: HttpRequest,
        _trust: &TrustPolicy,
    ) -> Result<HttpResponse, TransportError> {
        Err(TransportError::not_connected("test vectors do not touch the network"))
    }
}

fn pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn endpoint_from(value: &serde_json::Value) -> Endpoint {
    let method: HttpMethod = serde_json::from_value(value["method"].clone()).unwrap();
    let mut endpoint = Endpoint::new(method, value["path"].as_str().unwrap());
    if let Some(headers) = value.get("headers") {
        for (name, v) in pairs(headers) {
            endpoint = endpoint.with_header(&name, &v);
        }
    }
    if let Some(query) = value.get("query") {
        endpoint = endpoint.with_query_pairs(pairs(query));
    }
    if let Some(body) = value.get("body") {
        let body: JsonMap = serde_json::from_value(body.clone()).unwrap();
        endpoint = endpoint.with_body(body);
    }
    endpoint
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let env = Environment::new(base_url, case["api_key"].as_str().unwrap()).unwrap();
        let client = RequestClient::new(ClientConfig::new(env), Unreachable);
        let expected = &case["expected_request"];

        let req = client.build_request(&endpoint_from(&case["endpoint"])).unwrap();

        let method: HttpMethod = serde_json::from_value(expected["method"].clone()).unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, pairs(&expected["headers"]), "{name}: headers");

        match req.body.as_deref() {
            Some(body) => {
                let body: serde_json::Value = serde_json::from_str(body).unwrap();
                assert_eq!(body, expected["body"], "{name}: body");
            }
            None => assert!(expected["body"].is_null(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classify
// ---------------------------------------------------------------------------

fn transport_error(case: &serde_json::Value) -> TransportError {
    match case["kind"].as_str().unwrap() {
        "status" => TransportError::unacceptable_status(case["status"].as_u64().unwrap() as u16),
        "response_validation" => {
            TransportError::new(TransportErrorKind::ResponseValidation, "content type mismatch")
        }
        "timed_out" => TransportError::timed_out("timed out"),
        "not_connected" => TransportError::not_connected("offline"),
        "invalid_request" => TransportError::invalid_request("bad header"),
        "cancelled" => TransportError::cancelled(),
        "other" => TransportError::new(TransportErrorKind::Other, "handshake failed"),
        other => panic!("unknown kind: {other}"),
    }
}

fn variant(err: &RequestError) -> &'static str {
    match err {
        RequestError::Decoding(_) => "Decoding",
        RequestError::Timeout => "Timeout",
        RequestError::NoConnection => "NoConnection",
        RequestError::InvalidRequest(..) => "InvalidRequest",
        RequestError::Client(_) => "Client",
        RequestError::Server(_) => "Server",
        RequestError::UnexpectedResponse(_) => "UnexpectedResponse",
        RequestError::Unknown(_) => "Unknown",
        RequestError::Validation(_) => "Validation",
    }
}

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let err = classify(transport_error(case));
        assert_eq!(variant(&err), case["expected"].as_str().unwrap(), "{name}");

        if let Some(status) = case.get("status").and_then(|s| s.as_u64()) {
            assert_eq!(err.status(), Some(status as u16), "{name}: status");
        }
    }
}
