//! API client over the two GlobalSign SOAP services. The service traits are
//! the seam between connector logic and the wire: production code goes through
//! the SOAP transport in `soap`, tests script responses directly.

pub mod retry;
pub mod soap;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, error, info, warn};
use x509_parser::pem::parse_x509_pem;

use crate::api::catalog::{
    ErrorCatalog, NULL_RESPONSE_CODE, ORDER_NOT_FOUND_CODE, UNKNOWN_ERROR_CODE,
};
use crate::api::status::disposition_from_code;
use crate::api::wire::{
    GetDomainsRequest, GetDomainsResponse, GetOrderByDateRangeRequest, GetOrderByDateRangeResponse,
    GetOrderByOrderIdRequest, GetOrderByOrderIdResponse, GetProfilesRequest, GetProfilesResponse,
    ModifyOrderRequest, ModifyOrderResponse, MsslProfileDetail, OrderDetail, OrderQueryOption,
    PvOrderRequest, PvOrderResponse, ReissueRequest, ReissueResponse, RequestHeader,
    ResponseHeader,
};
use crate::cancel::CancelToken;
use crate::config::{DATE_FORMAT, GlobalSignConfig};
use crate::error::ConnectorError;
use crate::gateway::{CertificateRecord, Disposition, EnrollmentResult};
use self::retry::poll_until;

/// Status text returned when a freshly submitted order awaits MSSL approval.
pub const PENDING_MESSAGE: &str =
    "Enrollment is pending review. Check GlobalSign Portal for more detail.";

const REVOKE_OPERATION: &str = "Revoke";

/// ManagedSSLService operations: ordering, revocation, domain and profile
/// inventory.
pub trait OrderService: Send + Sync {
    fn pv_order(&self, request: &PvOrderRequest) -> Result<PvOrderResponse, ConnectorError>;
    fn modify_order(&self, request: &ModifyOrderRequest)
    -> Result<ModifyOrderResponse, ConnectorError>;
    fn get_domains(&self, request: &GetDomainsRequest)
    -> Result<GetDomainsResponse, ConnectorError>;
    fn get_profiles(
        &self,
        request: &GetProfilesRequest,
    ) -> Result<GetProfilesResponse, ConnectorError>;
}

/// GASService operations: order lookups, date-range queries and reissue.
pub trait QueryService: Send + Sync {
    fn get_order_by_id(
        &self,
        request: &GetOrderByOrderIdRequest,
    ) -> Result<GetOrderByOrderIdResponse, ConnectorError>;
    fn get_orders_by_date_range(
        &self,
        request: &GetOrderByDateRangeRequest,
    ) -> Result<GetOrderByDateRangeResponse, ConnectorError>;
    fn reissue(&self, request: &ReissueRequest) -> Result<ReissueResponse, ConnectorError>;
}

/// Builds service instances for a given configuration. Injected so the facade
/// can be exercised without a network.
pub trait ServiceFactory: Send + Sync {
    fn order_service(&self, config: &GlobalSignConfig) -> Box<dyn OrderService>;
    fn query_service(&self, config: &GlobalSignConfig) -> Box<dyn QueryService>;
}

pub struct ApiClient {
    config: GlobalSignConfig,
    catalog: ErrorCatalog,
    order: Box<dyn OrderService>,
    query: Box<dyn QueryService>,
}

impl ApiClient {
    pub fn new(
        config: GlobalSignConfig,
        order: Box<dyn OrderService>,
        query: Box<dyn QueryService>,
        catalog: ErrorCatalog,
    ) -> Self {
        ApiClient {
            config,
            catalog,
            order,
            query,
        }
    }

    pub fn connect(config: GlobalSignConfig, factory: &dyn ServiceFactory) -> Self {
        let order = factory.order_service(&config);
        let query = factory.query_service(&config);
        ApiClient::new(config, order, query, ErrorCatalog::builtin())
    }

    pub fn config(&self) -> &GlobalSignConfig {
        &self.config
    }

    /// Submits a new or renewal order and reports its initial state. MSSL
    /// orders normally park in PendingApproval until a reviewer acts, so a
    /// non-issued outcome here is the expected path, not a failure.
    pub fn enroll(&self, request: &PvOrderRequest) -> Result<EnrollmentResult, ConnectorError> {
        let response = self.order.pv_order(request)?;
        let header = &response.order_response_header;
        if !header.is_success() {
            let failure = self.header_failure("PVOrder", header);
            return Ok(EnrollmentResult::failed(format!(
                "Enrollment failed. {}",
                rejection_text(&failure)
            )));
        }
        let order_id = response
            .order_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| self.null_response_error("PVOrder returned no order id"))?;
        info!("[client] order {order_id} submitted, querying initial state");
        self.initial_enrollment_state(order_id)
    }

    fn initial_enrollment_state(
        &self,
        order_id: &str,
    ) -> Result<EnrollmentResult, ConnectorError> {
        let record = self.get_certificate_by_id(order_id)?;
        Ok(match record.disposition {
            Disposition::Issued => EnrollmentResult {
                request_id: Some(order_id.to_string()),
                certificate: record.certificate,
                disposition: Disposition::Issued,
                status_message: Some("Certificate issued".into()),
            },
            Disposition::ExternalValidation | Disposition::InProcess | Disposition::Unknown => {
                EnrollmentResult {
                    request_id: Some(order_id.to_string()),
                    certificate: None,
                    disposition: Disposition::ExternalValidation,
                    status_message: Some(PENDING_MESSAGE.into()),
                }
            }
            other => EnrollmentResult {
                request_id: Some(order_id.to_string()),
                certificate: None,
                disposition: Disposition::Failed,
                status_message: Some(format!(
                    "Enrollment failed. Order {order_id} reported state {other:?} after submission."
                )),
            },
        })
    }

    /// Submits a reissue and picks up the replacement certificate. The vendor
    /// keeps the prior certificate on the order until the replacement is cut,
    /// so pickup only completes once the serial differs from `prior_serial`.
    pub fn reissue(
        &self,
        request: &ReissueRequest,
        prior_serial: &str,
        cancel: &CancelToken,
    ) -> Result<EnrollmentResult, ConnectorError> {
        let response = self.query.reissue(request)?;
        let header = &response.order_response_header;
        if !header.is_success() {
            let failure = self.header_failure("ReIssue", header);
            return Ok(EnrollmentResult::failed(format!(
                "Reissue failed. {}",
                rejection_text(&failure)
            )));
        }
        let order_id = response
            .order_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&request.target_order_id);
        info!("[client] reissue accepted for order {order_id}, picking up replacement");
        let record = self.pickup_certificate_by_id(order_id, Some(prior_serial), cancel)?;
        Ok(EnrollmentResult {
            request_id: Some(record.request_id.clone()),
            certificate: record.certificate,
            disposition: Disposition::Issued,
            status_message: Some("Certificate reissued".into()),
        })
    }

    /// Polls an order within the configured pickup window until it is Issued
    /// and carries a certificate. With `replaced_serial` set, a certificate
    /// whose serial still equals it does not count as picked up.
    ///
    /// Transient vendor failures during the window (orders are not always
    /// queryable right after submission) count as not-ready; only transport
    /// failures abort the loop early.
    pub fn pickup_certificate_by_id(
        &self,
        order_id: &str,
        replaced_serial: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<CertificateRecord, ConnectorError> {
        let policy = self.config.pickup_policy();
        let picked = poll_until(&policy, cancel, "certificate pickup", |attempt| {
            let response = self.query.get_order_by_id(&self.order_query(order_id))?;
            let header = &response.order_response_header;
            if !header.is_success() {
                debug!(
                    "[client] pickup attempt {} for {order_id}: vendor reported code {}",
                    attempt + 1,
                    header.success_code
                );
                return Ok(None);
            }
            let Some(detail) = response.order_detail else {
                return Ok(None);
            };
            let record = match record_from_detail(&detail, Some(order_id)) {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        "[client] pickup attempt {} for {order_id}: unusable order detail: {e:#}",
                        attempt + 1
                    );
                    return Ok(None);
                }
            };
            if record.disposition != Disposition::Issued {
                return Ok(None);
            }
            match (&record.certificate, replaced_serial) {
                (None, _) => Ok(None),
                (Some(pem), Some(prior)) => {
                    let serial = certificate_serial(pem)?;
                    if serials_match(&serial, prior) {
                        debug!(
                            "[client] order {order_id} still carries the replaced certificate"
                        );
                        Ok(None)
                    } else {
                        Ok(Some(record))
                    }
                }
                (Some(_), None) => Ok(Some(record)),
            }
        })?;
        picked.ok_or_else(|| self.pickup_exhausted(order_id))
    }

    /// Point lookup of a single order, mapped to the host record shape.
    pub fn get_certificate_by_id(
        &self,
        order_id: &str,
    ) -> Result<CertificateRecord, ConnectorError> {
        let response = self.query.get_order_by_id(&self.order_query(order_id))?;
        let header = &response.order_response_header;
        if !header.is_success() {
            return Err(self.header_failure("GetOrderByOrderID", header));
        }
        let detail = response.order_detail.ok_or_else(|| {
            self.null_response_error(&format!("GetOrderByOrderID returned no detail for {order_id}"))
        })?;
        record_from_detail(&detail, Some(order_id))
            .map_err(|e| self.null_response_error(&format!("{e:#}")))
    }

    /// Revokes an order. GlobalSign processes the revocation synchronously, so
    /// a success header means the certificate is revoked.
    pub fn revoke(&self, order_id: &str) -> Result<Disposition, ConnectorError> {
        let request = ModifyOrderRequest {
            order_request_header: self.request_header(),
            order_id: order_id.to_string(),
            modify_order_operation: REVOKE_OPERATION.to_string(),
        };
        let response = self.order.modify_order(&request)?;
        if !response.order_response_header.is_success() {
            return Err(self.header_failure("ModifyOrder", &response.order_response_header));
        }
        info!("[client] revocation accepted for order {order_id}");
        Ok(Disposition::Revoked)
    }

    pub fn get_domains(&self) -> Result<Vec<crate::api::wire::DomainDetail>, ConnectorError> {
        let request = GetDomainsRequest {
            query_request_header: self.request_header(),
        };
        let response = self.order.get_domains(&request)?;
        if !response.query_response_header.is_success() {
            return Err(self.header_failure("GetMSSLDomains", &response.query_response_header));
        }
        debug!("[client] account has {} MSSL domains", response.domain_details.len());
        Ok(response.domain_details)
    }

    pub fn get_profiles(&self) -> Result<Vec<MsslProfileDetail>, ConnectorError> {
        let request = GetProfilesRequest {
            query_request_header: self.request_header(),
        };
        let response = self.order.get_profiles(&request)?;
        if !response.query_response_header.is_success() {
            return Err(self.header_failure("GetMSSLProfiles", &response.query_response_header));
        }
        Ok(response.profile_details)
    }

    /// Date-range inventory for sync. A full sync ranges from the configured
    /// start date (or the builtin epoch); an incremental sync resumes from the
    /// host's last pass, falling back to the full range when the host has
    /// never synced.
    pub fn get_certificates_for_sync(
        &self,
        full_sync: bool,
        last_sync: Option<DateTime<Utc>>,
    ) -> Result<Vec<OrderDetail>, ConnectorError> {
        let from = if full_sync {
            self.config.sync_start()?
        } else {
            match last_sync {
                Some(ts) => ts,
                None => self.config.sync_start()?,
            }
        };
        let to = Utc::now();
        let request = GetOrderByDateRangeRequest {
            query_request_header: self.request_header(),
            from_date: from.format(DATE_FORMAT).to_string(),
            to_date: to.format(DATE_FORMAT).to_string(),
            order_query_option: OrderQueryOption::full_detail_with_options(),
        };
        let response = self.query.get_orders_by_date_range(&request)?;
        if !response.query_response_header.is_success() {
            return Err(self.header_failure("GetOrderByDateRange", &response.query_response_header));
        }
        info!(
            "[client] date range query returned {} orders",
            response.order_details.len()
        );
        Ok(response.order_details)
    }

    fn request_header(&self) -> RequestHeader {
        RequestHeader {
            auth_token: self.config.auth_token(),
        }
    }

    fn order_query(&self, order_id: &str) -> GetOrderByOrderIdRequest {
        GetOrderByOrderIdRequest {
            query_request_header: self.request_header(),
            order_id: order_id.to_string(),
            order_query_option: OrderQueryOption::full_detail(),
        }
    }

    /// Translates a failed response header into a `VendorRejection`. Every
    /// wire error is logged; the first one drives the catalog lookup, with
    /// the offending field substituted into placeholder detail texts.
    fn header_failure(&self, operation: &str, header: &ResponseHeader) -> ConnectorError {
        for wire_error in &header.errors {
            error!(
                "[client] {operation} error {} | {} | {}",
                wire_error.error_code,
                wire_error.error_field.as_deref().unwrap_or("-"),
                wire_error.error_message
            );
        }
        let first = header.errors.first();
        let code = first
            .and_then(|e| e.error_code.trim().parse::<i32>().ok())
            .unwrap_or(UNKNOWN_ERROR_CODE);
        let resolved = self.catalog.lookup(code);
        let mut details = resolved.error_details.to_string();
        // Field substitution is reserved for the invalid-parameter family;
        // other entries (4201) use the placeholder for something else.
        if (101..=104).contains(&code.abs()) {
            if let Some(field) = first
                .and_then(|e| e.error_field.as_deref())
                .filter(|f| !f.is_empty())
            {
                details = details.replace("{0}", field);
            }
        }
        let message = format!("{} {}", resolved.error_message, details)
            .trim()
            .to_string();
        ConnectorError::VendorRejection {
            message,
            native_code: resolved.error_code,
        }
    }

    fn null_response_error(&self, context: &str) -> ConnectorError {
        let entry = self.catalog.lookup(NULL_RESPONSE_CODE);
        ConnectorError::VendorRejection {
            message: format!("{} {context}", entry.message()),
            native_code: entry.error_code,
        }
    }

    fn pickup_exhausted(&self, order_id: &str) -> ConnectorError {
        let entry = self.catalog.lookup(ORDER_NOT_FOUND_CODE);
        ConnectorError::PickupExhausted {
            message: format!(
                "The certificate for order {order_id} was not picked up within the configured \
                 retry window. If the order is pending approval, the certificate will be \
                 collected by a later synchronization once it has been issued. {}",
                entry.message()
            ),
            native_code: entry.error_code,
        }
    }
}

fn rejection_text(error: &ConnectorError) -> String {
    match error {
        ConnectorError::VendorRejection { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Maps a vendor order detail to the host record shape. `fallback_order_id`
/// covers responses that omit `OrderInfo` for a known order.
pub fn record_from_detail(
    detail: &OrderDetail,
    fallback_order_id: Option<&str>,
) -> anyhow::Result<CertificateRecord> {
    let info = detail.order_info.as_ref();
    let request_id = info
        .map(|i| i.order_id.clone())
        .filter(|id| !id.is_empty())
        .or_else(|| fallback_order_id.map(str::to_string))
        .context("order detail carries no order id")?;
    let status = detail
        .certificate_info
        .as_ref()
        .map(|c| c.certificate_status.as_str())
        .unwrap_or("");
    let disposition = disposition_from_code(status);
    let certificate = detail
        .fulfillment
        .as_ref()
        .and_then(|f| f.server_certificate.as_ref())
        .map(|c| c.x509_cert.clone())
        .filter(|pem| !pem.trim().is_empty());
    let revocation_date = if disposition == Disposition::Revoked {
        info.and_then(|i| i.order_deactivated_date.as_deref()).and_then(parse_wire_date)
    } else {
        None
    };
    Ok(CertificateRecord {
        request_id,
        product_id: info.and_then(|i| i.product_code.clone()),
        submission_date: info.and_then(|i| i.order_date.as_deref()).and_then(parse_wire_date),
        resolution_date: info
            .and_then(|i| i.order_complete_date.as_deref())
            .and_then(parse_wire_date),
        disposition,
        csr: detail.fulfillment.as_ref().and_then(|f| f.original_csr.clone()),
        certificate,
        revocation_reason: 0,
        revocation_date,
    })
}

fn parse_wire_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = trimmed.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    NaiveDateTime::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|dt| dt.and_utc())
}

/// Hex serial of a PEM certificate, as reported by the issuer.
fn certificate_serial(pem: &str) -> Result<String, ConnectorError> {
    let (_, parsed) = parse_x509_pem(pem.as_bytes()).map_err(|e| {
        ConnectorError::VendorRejection {
            message: format!("the issued certificate is not valid PEM: {e}"),
            native_code: -UNKNOWN_ERROR_CODE,
        }
    })?;
    let certificate = parsed.parse_x509().map_err(|e| ConnectorError::VendorRejection {
        message: format!("the issued certificate could not be parsed: {e}"),
        native_code: -UNKNOWN_ERROR_CODE,
    })?;
    Ok(hex::encode(certificate.raw_serial()))
}

/// Serial comparison tolerant of the formats hosts store: case, separator
/// characters and leading zeros are ignored.
fn serials_match(left: &str, right: &str) -> bool {
    normalize_serial(left) == normalize_serial(right)
}

fn normalize_serial(serial: &str) -> String {
    let hex: String = serial
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    hex.trim_start_matches('0').to_string()
}
