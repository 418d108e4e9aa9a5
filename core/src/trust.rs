//! TLS trust configuration handed through to the transport.
//!
//! # Design
//! The client never inspects trust evaluators. It stores a `TrustPolicy`
//! (host to evaluator) at construction and passes it to every
//! `Transport::execute` call. A host without an entry gets the transport's
//! default system trust.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Root material a transport should trust for one host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrustAnchors {
    /// The platform's built-in root store.
    System,
    /// Only these PEM-encoded certificates.
    Pinned(Vec<Vec<u8>>),
    /// No certificate verification at all. Test deployments only.
    AcceptAny,
}

/// Policy object governing certificate acceptance for a host.
pub trait TrustEvaluator: fmt::Debug + Send + Sync {
    fn anchors(&self) -> TrustAnchors;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTrustEvaluator;

impl TrustEvaluator for DefaultTrustEvaluator {
    fn anchors(&self) -> TrustAnchors {
        TrustAnchors::System
    }
}

/// Trusts only the given certificates for the host it is registered under.
#[derive(Clone, Default)]
pub struct PinnedCertificatesEvaluator {
    pem: Vec<Vec<u8>>,
}

impl PinnedCertificatesEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.pem.push(pem.into());
        self
    }
}

impl fmt::Debug for PinnedCertificatesEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedCertificatesEvaluator")
            .field("certificates", &self.pem.len())
            .finish()
    }
}

impl TrustEvaluator for PinnedCertificatesEvaluator {
    fn anchors(&self) -> TrustAnchors {
        TrustAnchors::Pinned(self.pem.clone())
    }
}

/// Disables certificate checks for its host.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTrustEvaluator;

impl TrustEvaluator for DisabledTrustEvaluator {
    fn anchors(&self) -> TrustAnchors {
        TrustAnchors::AcceptAny
    }
}

/// Host to evaluator mapping. Host keys are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    evaluators: HashMap<String, Arc<dyn TrustEvaluator>>,
}

impl TrustPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(mut self, host: &str, evaluator: impl TrustEvaluator + 'static) -> Self {
        self.evaluators
            .insert(host.to_ascii_lowercase(), Arc::new(evaluator));
        self
    }

    pub fn evaluator_for(&self, host: &str) -> Option<&dyn TrustEvaluator> {
        self.evaluators
            .get(&host.to_ascii_lowercase())
            .map(|e| e.as_ref())
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &dyn TrustEvaluator)> {
        self.evaluators.iter().map(|(h, e)| (h.as_str(), e.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}
