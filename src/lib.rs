//! GlobalSign Managed SSL (MSSL) CA connector. Translates host certificate
//! operations (enroll, renew, reissue, revoke, sync) into the vendor's SOAP
//! API and reconciles the responses back into normalized host records.

pub mod api;
pub mod cancel;
pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod gateway;
pub mod products;
pub mod resolver;

pub use cancel::CancelToken;
pub use config::GlobalSignConfig;
pub use connector::GlobalSignConnector;
pub use error::ConnectorError;
pub use gateway::{
    CertificateRecord, Disposition, EnrollmentKind, EnrollmentResult, NoDirectory,
    PriorRecordSource, ProductInfo, RequesterDirectory, SyncRequest,
};
