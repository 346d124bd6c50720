//! Vendor order lifecycle codes and their single-source-of-truth mapping to
//! the host disposition.

use crate::gateway::Disposition;

/// The GlobalSign order lifecycle vocabulary. "Canceled" (3) and "Cancelled"
/// (5) are historical duplicate spellings that share one host disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Initial = 1,
    Waiting = 2,
    Canceled = 3,
    Issued = 4,
    Cancelled = 5,
    Revoking = 6,
    Revoked = 7,
    PendingApproval = 8,
    Locked = 9,
    Denied = 10,
}

impl OrderStatus {
    /// Parses the numeric status string carried in `CertificateInfo`.
    pub fn from_code(code: &str) -> Option<OrderStatus> {
        match code.trim() {
            "1" => Some(OrderStatus::Initial),
            "2" => Some(OrderStatus::Waiting),
            "3" => Some(OrderStatus::Canceled),
            "4" => Some(OrderStatus::Issued),
            "5" => Some(OrderStatus::Cancelled),
            "6" => Some(OrderStatus::Revoking),
            "7" => Some(OrderStatus::Revoked),
            "8" => Some(OrderStatus::PendingApproval),
            "9" => Some(OrderStatus::Locked),
            "10" => Some(OrderStatus::Denied),
            _ => None,
        }
    }

    pub fn disposition(self) -> Disposition {
        match self {
            OrderStatus::Issued => Disposition::Issued,
            OrderStatus::Revoked | OrderStatus::Revoking => Disposition::Revoked,
            OrderStatus::PendingApproval | OrderStatus::Waiting => Disposition::ExternalValidation,
            OrderStatus::Initial => Disposition::InProcess,
            OrderStatus::Denied => Disposition::Denied,
            OrderStatus::Canceled | OrderStatus::Cancelled => Disposition::Failed,
            OrderStatus::Locked => Disposition::Unknown,
        }
    }
}

/// Maps a raw wire status code straight to a host disposition; anything that
/// does not parse as one of the ten lifecycle values is Unknown.
pub fn disposition_from_code(code: &str) -> Disposition {
    match OrderStatus::from_code(code) {
        Some(status) => status.disposition(),
        None => Disposition::Unknown,
    }
}
