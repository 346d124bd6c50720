//! The connector facade the host talks to. Holds the parsed configuration and
//! the injected collaborators, builds a fresh API client per operation, and
//! keeps the host-facing failure contract: enrollment never raises, it
//! returns a Failed result; revocation and lookups propagate their errors.

use std::collections::HashMap;
use std::sync::mpsc;

use log::{debug, error, info, warn};

use crate::api::request::{
    EnrollmentIntent, build_new_order, build_reissue, build_renewal_order,
};
use crate::cancel::CancelToken;
use crate::client::{ApiClient, ServiceFactory, record_from_detail};
use crate::client::soap::SoapServiceFactory;
use crate::config::{GlobalSignConfig, ServiceKind};
use crate::error::ConnectorError;
use crate::gateway::{
    CertificateRecord, Disposition, EnrollmentKind, EnrollmentResult, NoDirectory,
    PriorRecordSource, ProductInfo, RequesterDirectory, SyncRequest,
};
use crate::products::ProductCatalog;
use crate::resolver::resolve_domain;

/// Product parameter: requested validity in months.
pub const PARAM_LIFETIME: &str = "lifetime";
/// Product parameter: hex serial of the certificate being renewed or reissued.
pub const PARAM_PRIOR_CERT_SN: &str = "priorcertsn";
/// Product parameter: requesting account, resolved through the directory.
pub const PARAM_REQUESTER: &str = "requester";
/// Product parameter: explicit requester display name, bypassing the
/// directory.
pub const PARAM_REQUESTER_NAME: &str = "requester-name";

const DEFAULT_LIFETIME_MONTHS: &str = "12";

pub struct GlobalSignConnector {
    config: Option<GlobalSignConfig>,
    products: ProductCatalog,
    factory: Box<dyn ServiceFactory>,
    directory: Box<dyn RequesterDirectory>,
}

impl Default for GlobalSignConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalSignConnector {
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(SoapServiceFactory), Box::new(NoDirectory))
    }

    /// Injection constructor for hosts with a directory integration, and for
    /// tests that script the services.
    pub fn with_collaborators(
        factory: Box<dyn ServiceFactory>,
        directory: Box<dyn RequesterDirectory>,
    ) -> Self {
        GlobalSignConnector {
            config: None,
            products: ProductCatalog::builtin(),
            factory,
            directory,
        }
    }

    /// Parses and installs the host-supplied CA connection data. Must run
    /// before any other operation.
    pub fn initialize(&mut self, raw: serde_json::Value) -> Result<(), ConnectorError> {
        let config = GlobalSignConfig::from_json(raw)?;
        info!(
            "[connector] initialized against {}",
            config.service_url(ServiceKind::Order)
        );
        self.config = Some(config);
        Ok(())
    }

    fn client(&self) -> Result<ApiClient, ConnectorError> {
        let config = self.config.clone().ok_or_else(|| {
            ConnectorError::Configuration(
                "the connector has not been initialized with CA connection data".into(),
            )
        })?;
        Ok(ApiClient::connect(config, self.factory.as_ref()))
    }

    /// Runs one enrollment. Every failure, from configuration to vendor
    /// rejection, comes back as a Failed result so the host can persist it
    /// against the request.
    #[allow(clippy::too_many_arguments)]
    pub fn enroll(
        &self,
        priors: &dyn PriorRecordSource,
        csr: &str,
        subject: &str,
        sans: &HashMap<String, Vec<String>>,
        product: &ProductInfo,
        kind: EnrollmentKind,
        cancel: &CancelToken,
    ) -> EnrollmentResult {
        match self.try_enroll(priors, csr, subject, sans, product, kind, cancel) {
            Ok(result) => result,
            Err(e) => {
                error!("[connector] enrollment failed: {e}");
                EnrollmentResult::failed(e.to_string())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_enroll(
        &self,
        priors: &dyn PriorRecordSource,
        csr: &str,
        subject: &str,
        sans: &HashMap<String, Vec<String>>,
        product: &ProductInfo,
        kind: EnrollmentKind,
        cancel: &CancelToken,
    ) -> Result<EnrollmentResult, ConnectorError> {
        let client = self.client()?;
        self.products.require(&product.product_id)?;
        let requester = self.resolve_requester(product)?;
        let mut intent = EnrollmentIntent {
            kind,
            csr: csr.to_string(),
            subject: subject.to_string(),
            sans: sans.clone(),
            product_code: product.product_id.clone(),
            months: product
                .parameter(PARAM_LIFETIME)
                .unwrap_or(DEFAULT_LIFETIME_MONTHS)
                .to_string(),
            prior_order_id: None,
            prior_serial: product.parameter(PARAM_PRIOR_CERT_SN).map(str::to_string),
        };

        let domains = client.get_domains()?;
        let (common_name, binding) = resolve_domain(&intent.subject, &intent.sans, &domains)?;
        let auth = client.config().auth_token();

        match kind {
            EnrollmentKind::New => {
                let request = build_new_order(&intent, &common_name, &binding, &requester, auth);
                client.enroll(&request)
            }
            EnrollmentKind::Renew => {
                intent.prior_order_id =
                    self.prior_order_id(priors, intent.prior_serial.as_deref())?;
                let request =
                    build_renewal_order(&intent, &common_name, &binding, &requester, auth)?;
                client.enroll(&request)
            }
            EnrollmentKind::Reissue => {
                let serial = intent.prior_serial.clone().ok_or_else(|| {
                    ConnectorError::Configuration(format!(
                        "reissue requires the '{PARAM_PRIOR_CERT_SN}' product parameter"
                    ))
                })?;
                let target = self.prior_order_id(priors, Some(&serial))?.ok_or_else(|| {
                    ConnectorError::Configuration(format!(
                        "no prior order is known for certificate serial {serial}"
                    ))
                })?;
                let request = build_reissue(&intent, &target, auth);
                client.reissue(&request, &serial, cancel)
            }
        }
    }

    fn prior_order_id(
        &self,
        priors: &dyn PriorRecordSource,
        serial: Option<&str>,
    ) -> Result<Option<String>, ConnectorError> {
        let Some(serial) = serial else {
            return Ok(None);
        };
        let record = priors.record_for_serial(serial).map_err(|e| {
            ConnectorError::Configuration(format!(
                "prior record lookup for serial {serial} failed: {e:#}"
            ))
        })?;
        Ok(record.map(|r| r.request_id))
    }

    /// Display name placed on the order contact. An explicit name parameter
    /// wins; otherwise the requesting account is resolved through the
    /// directory. No name means no order.
    fn resolve_requester(&self, product: &ProductInfo) -> Result<String, ConnectorError> {
        if let Some(name) = product
            .parameter(PARAM_REQUESTER_NAME)
            .filter(|n| !n.trim().is_empty())
        {
            return Ok(name.trim().to_string());
        }
        let Some(account) = product
            .parameter(PARAM_REQUESTER)
            .filter(|a| !a.trim().is_empty())
        else {
            return Err(ConnectorError::Configuration(
                "no requester name or account was supplied for the order contact".into(),
            ));
        };
        match self.directory.display_name(account.trim()) {
            Ok(Some(name)) => Ok(name),
            Ok(None) => Err(ConnectorError::Configuration(format!(
                "the requester account '{account}' has no display name in the directory"
            ))),
            Err(e) => Err(ConnectorError::Configuration(format!(
                "requester directory lookup for '{account}' failed: {e:#}"
            ))),
        }
    }

    /// Streams the account's order inventory to the host. Records are emitted
    /// as they are mapped; a failure, a cancellation or a dropped receiver
    /// terminates the stream but keeps everything already sent. Nothing is
    /// raised to the host.
    pub fn synchronize(
        &self,
        sender: &mpsc::Sender<CertificateRecord>,
        request: SyncRequest,
        cancel: &CancelToken,
    ) {
        match self.try_synchronize(sender, request, cancel) {
            Ok(emitted) => info!("[connector] synchronization streamed {emitted} records"),
            Err(e) => error!("[connector] synchronization terminated early: {e}"),
        }
    }

    fn try_synchronize(
        &self,
        sender: &mpsc::Sender<CertificateRecord>,
        request: SyncRequest,
        cancel: &CancelToken,
    ) -> Result<usize, ConnectorError> {
        let client = self.client()?;
        let details = client.get_certificates_for_sync(request.full_sync, request.last_sync)?;
        let mut emitted = 0usize;
        for detail in &details {
            if cancel.is_cancelled() {
                warn!("[connector] synchronization cancelled by host after {emitted} records");
                return Err(ConnectorError::Cancelled);
            }
            let record = match record_from_detail(detail, None) {
                Ok(record) => record,
                Err(e) => {
                    warn!("[connector] skipping unusable sync record: {e:#}");
                    continue;
                }
            };
            if sender.send(record).is_err() {
                warn!("[connector] sync receiver dropped after {emitted} records");
                break;
            }
            emitted += 1;
        }
        Ok(emitted)
    }

    pub fn revoke(&self, request_id: &str) -> Result<Disposition, ConnectorError> {
        self.client()?.revoke(request_id)
    }

    pub fn get_single_record(&self, request_id: &str) -> Result<CertificateRecord, ConnectorError> {
        self.client()?.get_certificate_by_id(request_id)
    }

    /// Liveness check used by the host scheduler.
    pub fn ping(&self) -> Result<(), ConnectorError> {
        if self.config.is_none() {
            return Err(ConnectorError::Configuration(
                "the connector has not been initialized with CA connection data".into(),
            ));
        }
        debug!("[connector] ping");
        Ok(())
    }

    /// Validates candidate connection data by parsing it, checking the sync
    /// window, and listing the account's MSSL domains against the live
    /// service.
    pub fn validate_connection_info(&self, raw: serde_json::Value) -> Result<(), ConnectorError> {
        let config = GlobalSignConfig::from_json(raw)?;
        config.validate_sync_window()?;
        let client = ApiClient::connect(config, self.factory.as_ref());
        let domains = client.get_domains()?;
        for domain in &domains {
            info!(
                "[connector] connection established; domain {} (status {}) is visible",
                domain.domain_name, domain.domain_status
            );
        }
        Ok(())
    }

    /// Validates that the host's product selection is a supported MSSL
    /// product.
    pub fn validate_product_info(&self, product: &ProductInfo) -> Result<(), ConnectorError> {
        let entry = self.products.require(&product.product_id)?;
        info!(
            "[connector] product {} validated as {}",
            product.product_id, entry.display_name
        );
        Ok(())
    }
}
