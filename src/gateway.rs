use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host-side classification of a certificate request. Produced exclusively by
/// `api::status`; no other call site translates vendor status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    Issued,
    Revoked,
    ExternalValidation,
    InProcess,
    Denied,
    Failed,
    Unknown,
}

/// Normalized certificate record emitted to the host for both point lookups
/// and sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// The vendor order id, used by the host as the CA request id.
    pub request_id: String,
    pub product_id: Option<String>,
    pub submission_date: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub disposition: Disposition,
    /// Original CSR echoed back by the vendor.
    pub csr: Option<String>,
    /// Issued certificate, PEM.
    pub certificate: Option<String>,
    pub revocation_reason: i32,
    /// Populated only when the order status is Revoked.
    pub revocation_date: Option<DateTime<Utc>>,
}

/// Outcome of a single enrollment call. Enrollment failures are returned as a
/// Failed disposition with a message, never raised to the host.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentResult {
    pub request_id: Option<String>,
    pub certificate: Option<String>,
    pub disposition: Disposition,
    pub status_message: Option<String>,
}

impl EnrollmentResult {
    pub fn failed(message: impl Into<String>) -> Self {
        EnrollmentResult {
            request_id: None,
            certificate: None,
            disposition: Disposition::Failed,
            status_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentKind {
    New,
    Renew,
    Reissue,
}

/// Product selection plus free-form parameters supplied by the host for an
/// enrollment (validity months, requester name, prior certificate serial).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    pub product_id: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl ProductInfo {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Host sync invocation: full re-inventory or incremental from the last pass.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest {
    pub full_sync: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

/// External directory used to resolve a requesting account to a display name
/// when the product parameters do not carry one.
pub trait RequesterDirectory: Send + Sync {
    fn display_name(&self, account: &str) -> anyhow::Result<Option<String>>;
}

/// Directory stub for hosts without a directory integration.
pub struct NoDirectory;

impl RequesterDirectory for NoDirectory {
    fn display_name(&self, _account: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Host-side record lookup by certificate serial, used to locate the prior
/// order for renewals and reissues.
pub trait PriorRecordSource: Send + Sync {
    fn record_for_serial(&self, hex_serial: &str) -> anyhow::Result<Option<CertificateRecord>>;
}
