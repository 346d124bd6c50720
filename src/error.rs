use thiserror::Error;

/// Failure taxonomy for the connector. `VendorRejection` and `Transport` are
/// treated identically by enrollment code paths (both become a Failed result);
/// revoke and single-record lookups propagate them to the host.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("GlobalSign rejected the request: {message}")]
    VendorRejection { message: String, native_code: i32 },

    #[error("unable to determine GlobalSign domain: {0}")]
    DomainResolution(String),

    #[error("invalid connector configuration: {0}")]
    Configuration(String),

    #[error("GlobalSign web service unreachable: {0}")]
    Transport(String),

    #[error("{message}")]
    PickupExhausted { message: String, native_code: i32 },

    #[error("operation cancelled by host")]
    Cancelled,
}

impl ConnectorError {
    /// Vendor error code carried by the failure, when one exists.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            ConnectorError::VendorRejection { native_code, .. }
            | ConnectorError::PickupExhausted { native_code, .. } => Some(*native_code),
            _ => None,
        }
    }
}
