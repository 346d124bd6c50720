//! Typed request/response structures for the two GlobalSign SOAP services.
//! Field names follow the vendor schema; the transport treats these as an
//! opaque typed boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "Password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestHeader {
    #[serde(rename = "AuthToken")]
    pub auth_token: AuthToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
}

/// One SubjectAltName with its vendor option type ("7" plain FQDN,
/// "13" wildcard). The value and the type are distinct fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanEntry {
    #[serde(rename = "SubjectAltName")]
    pub subject_alt_name: String,
    #[serde(rename = "SANOptionType")]
    pub san_option_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderOption {
    #[serde(rename = "OptionName")]
    pub option_name: String,
    #[serde(rename = "OptionValue")]
    pub option_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidityPeriod {
    #[serde(rename = "Months")]
    pub months: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequestParameter {
    #[serde(rename = "ProductCode")]
    pub product_code: String,
    #[serde(rename = "BaseOption", skip_serializing_if = "Option::is_none")]
    pub base_option: Option<String>,
    #[serde(rename = "OrderKind")]
    pub order_kind: String,
    #[serde(rename = "Licenses")]
    pub licenses: String,
    #[serde(rename = "Options", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OrderOption>,
    #[serde(rename = "ValidityPeriod")]
    pub validity_period: ValidityPeriod,
    #[serde(rename = "CSR")]
    pub csr: String,
    #[serde(rename = "RenewalTargetOrderID", skip_serializing_if = "Option::is_none")]
    pub renewal_target_order_id: Option<String>,
}

/// `BmV2PvOrderRequest`: new and renewal MSSL orders.
#[derive(Debug, Clone, Serialize)]
pub struct PvOrderRequest {
    #[serde(rename = "OrderRequestHeader")]
    pub order_request_header: RequestHeader,
    #[serde(rename = "OrderRequestParameter")]
    pub order_request_parameter: OrderRequestParameter,
    #[serde(rename = "MSSLProfileID")]
    pub mssl_profile_id: String,
    #[serde(rename = "MSSLDomainID")]
    pub mssl_domain_id: String,
    #[serde(rename = "ContactInfo")]
    pub contact_info: ContactInfo,
    #[serde(rename = "SANEntries", skip_serializing_if = "Vec::is_empty")]
    pub san_entries: Vec<SanEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    #[serde(rename = "ErrorCode")]
    pub error_code: String,
    #[serde(rename = "ErrorField", default)]
    pub error_field: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: String,
}

/// Success/failure envelope common to both services. A `success_code` of zero
/// means the call succeeded; anything else comes with structured errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseHeader {
    #[serde(rename = "SuccessCode")]
    pub success_code: i32,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<WireError>,
}

impl ResponseHeader {
    pub fn is_success(&self) -> bool {
        self.success_code == 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PvOrderResponse {
    #[serde(rename = "OrderResponseHeader")]
    pub order_response_header: ResponseHeader,
    #[serde(rename = "OrderID", default)]
    pub order_id: Option<String>,
    #[serde(rename = "PVOrderDetail", default)]
    pub pv_order_detail: Option<OrderDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifyOrderRequest {
    #[serde(rename = "OrderRequestHeader")]
    pub order_request_header: RequestHeader,
    #[serde(rename = "OrderID")]
    pub order_id: String,
    #[serde(rename = "ModifyOrderOperation")]
    pub modify_order_operation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifyOrderResponse {
    #[serde(rename = "OrderResponseHeader")]
    pub order_response_header: ResponseHeader,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetDomainsRequest {
    #[serde(rename = "QueryRequestHeader")]
    pub query_request_header: RequestHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetDomainsResponse {
    #[serde(rename = "QueryResponseHeader")]
    pub query_response_header: ResponseHeader,
    #[serde(rename = "DomainDetails", default)]
    pub domain_details: Vec<DomainDetail>,
}

/// One vendor-managed MSSL domain with its owning profile and approval state.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainDetail {
    #[serde(rename = "DomainID")]
    pub domain_id: String,
    #[serde(rename = "MSSLProfileID")]
    pub mssl_profile_id: String,
    #[serde(rename = "DomainName")]
    pub domain_name: String,
    #[serde(rename = "DomainStatus", default)]
    pub domain_status: String,
    #[serde(rename = "ContactInfo", default)]
    pub contact_info: Option<ContactInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetProfilesRequest {
    #[serde(rename = "QueryRequestHeader")]
    pub query_request_header: RequestHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetProfilesResponse {
    #[serde(rename = "QueryResponseHeader")]
    pub query_response_header: ResponseHeader,
    #[serde(rename = "SearchMSSLProfileDetails", default)]
    pub profile_details: Vec<MsslProfileDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MsslProfileDetail {
    #[serde(rename = "MSSLProfileID")]
    pub mssl_profile_id: String,
    #[serde(rename = "OrganizationName", default)]
    pub organization_name: String,
    #[serde(rename = "ProfileStatus", default)]
    pub profile_status: String,
}

/// Flags requesting the optional sections of an order query response. The
/// vendor expects literal "true" strings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderQueryOption {
    #[serde(rename = "ReturnOrderOption", skip_serializing_if = "Option::is_none")]
    pub return_order_option: Option<String>,
    #[serde(rename = "ReturnCertificateInfo")]
    pub return_certificate_info: String,
    #[serde(rename = "ReturnFulfillment")]
    pub return_fulfillment: String,
    #[serde(rename = "ReturnOriginalCSR")]
    pub return_original_csr: String,
}

impl OrderQueryOption {
    pub fn full_detail() -> Self {
        OrderQueryOption {
            return_order_option: None,
            return_certificate_info: "true".into(),
            return_fulfillment: "true".into(),
            return_original_csr: "true".into(),
        }
    }

    pub fn full_detail_with_options() -> Self {
        OrderQueryOption {
            return_order_option: Some("true".into()),
            ..Self::full_detail()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetOrderByOrderIdRequest {
    #[serde(rename = "QueryRequestHeader")]
    pub query_request_header: RequestHeader,
    #[serde(rename = "OrderID")]
    pub order_id: String,
    #[serde(rename = "OrderQueryOption")]
    pub order_query_option: OrderQueryOption,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetOrderByOrderIdResponse {
    #[serde(rename = "OrderResponseHeader")]
    pub order_response_header: ResponseHeader,
    #[serde(rename = "OrderDetail", default)]
    pub order_detail: Option<OrderDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetOrderByDateRangeRequest {
    #[serde(rename = "QueryRequestHeader")]
    pub query_request_header: RequestHeader,
    #[serde(rename = "FromDate")]
    pub from_date: String,
    #[serde(rename = "ToDate")]
    pub to_date: String,
    #[serde(rename = "OrderQueryOption")]
    pub order_query_option: OrderQueryOption,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetOrderByDateRangeResponse {
    #[serde(rename = "QueryResponseHeader")]
    pub query_response_header: ResponseHeader,
    #[serde(rename = "OrderDetails", default)]
    pub order_details: Vec<OrderDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDetail {
    #[serde(rename = "OrderInfo", default)]
    pub order_info: Option<OrderInfo>,
    #[serde(rename = "CertificateInfo", default)]
    pub certificate_info: Option<CertificateInfo>,
    #[serde(rename = "Fulfillment", default)]
    pub fulfillment: Option<Fulfillment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderInfo {
    #[serde(rename = "OrderID", default)]
    pub order_id: String,
    #[serde(rename = "ProductCode", default)]
    pub product_code: Option<String>,
    #[serde(rename = "OrderDate", default)]
    pub order_date: Option<String>,
    #[serde(rename = "OrderCompleteDate", default)]
    pub order_complete_date: Option<String>,
    #[serde(rename = "OrderDeactivatedDate", default)]
    pub order_deactivated_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificateInfo {
    /// Numeric lifecycle code, "1" through "10".
    #[serde(rename = "CertificateStatus", default)]
    pub certificate_status: String,
    #[serde(rename = "CommonName", default)]
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fulfillment {
    #[serde(rename = "OriginalCSR", default)]
    pub original_csr: Option<String>,
    #[serde(rename = "ServerCertificate", default)]
    pub server_certificate: Option<ServerCertificate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCertificate {
    #[serde(rename = "X509Cert", default)]
    pub x509_cert: String,
}

/// `QbV1ReIssueRequest`: reissue runs against an existing order and carries
/// only the new CSR, the target order id and its own auth token.
#[derive(Debug, Clone, Serialize)]
pub struct ReissueRequest {
    #[serde(rename = "OrderRequestHeader")]
    pub order_request_header: RequestHeader,
    #[serde(rename = "TargetOrderID")]
    pub target_order_id: String,
    #[serde(rename = "OrderParameter")]
    pub order_parameter: ReissueParameter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReissueParameter {
    #[serde(rename = "CSR")]
    pub csr: String,
    #[serde(rename = "DNSNames", skip_serializing_if = "Option::is_none")]
    pub dns_names: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReissueResponse {
    #[serde(rename = "OrderResponseHeader")]
    pub order_response_header: ResponseHeader,
    #[serde(rename = "OrderID", default)]
    pub order_id: Option<String>,
}
