//! SOAP transport for the GlobalSign services. One shared blocking HTTP
//! client, one envelope builder, and a namespace-stripping pass so the typed
//! wire structs deserialize without caring about vendor prefixes.

use std::sync::OnceLock;
use std::time::Duration;

use log::{debug, warn};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::wire::{
    GetDomainsRequest, GetDomainsResponse, GetOrderByDateRangeRequest, GetOrderByDateRangeResponse,
    GetOrderByOrderIdRequest, GetOrderByOrderIdResponse, GetProfilesRequest, GetProfilesResponse,
    ModifyOrderRequest, ModifyOrderResponse, PvOrderRequest, PvOrderResponse, ReissueRequest,
    ReissueResponse,
};
use crate::client::{OrderService, QueryService, ServiceFactory};
use crate::config::{GlobalSignConfig, ServiceKind};
use crate::error::ConnectorError;

const SOAP_NAMESPACE: &str = "https://system.globalsign.com/kb/ws/";

struct HttpClient;

impl HttpClient {
    fn shared() -> &'static Client {
        static CLIENT: OnceLock<Client> = OnceLock::new();
        CLIENT.get_or_init(|| {
            let timeout = resolve_timeout();
            Client::builder().timeout(timeout).build().unwrap_or_else(|err| {
                warn!("[soap] failed to build shared client: {err}");
                Client::new()
            })
        })
    }
}

fn resolve_timeout() -> Duration {
    timeout_from(std::env::var("GLOBALSIGN_HTTP_TIMEOUT_SECS").ok().as_deref())
}

fn timeout_from(raw: Option<&str>) -> Duration {
    const DEFAULT_TIMEOUT_SECS: u64 = 60;
    let timeout = raw
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        warn!("[soap] invalid timeout value; using default");
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    }
    Duration::from_secs(timeout)
}

struct SoapTransport {
    url: String,
}

impl SoapTransport {
    fn new(url: &str) -> Self {
        SoapTransport { url: url.to_string() }
    }

    fn call<Req, Body>(&self, operation: &str, request: &Req) -> Result<Body, ConnectorError>
    where
        Req: Serialize,
        Body: DeserializeOwned,
    {
        let payload = quick_xml::se::to_string_with_root("Request", request).map_err(|e| {
            ConnectorError::Transport(format!("cannot serialize {operation} request: {e}"))
        })?;
        let envelope = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soap:Body>\
             <ws:{operation} xmlns:ws=\"{SOAP_NAMESPACE}\">{payload}</ws:{operation}>\
             </soap:Body></soap:Envelope>"
        );
        debug!("[soap] POST {} {operation}", self.url);
        let response = HttpClient::shared()
            .post(&self.url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{operation}\""))
            .body(envelope)
            .send()
            .map_err(|e| ConnectorError::Transport(format!("{operation} request failed: {e}")))?;
        let status = response.status();
        let text = response.text().map_err(|e| {
            ConnectorError::Transport(format!("{operation} response unreadable: {e}"))
        })?;
        if !status.is_success() {
            return Err(status_error(operation, status, &text));
        }
        parse_response(operation, &text)
    }
}

fn status_error(operation: &str, status: StatusCode, body: &str) -> ConnectorError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ConnectorError::Transport(format!(
            "{operation} rejected by the GlobalSign gateway ({status})"
        ));
    }
    let snippet: String = body.chars().take(200).collect();
    if snippet.trim().is_empty() {
        ConnectorError::Transport(format!("{operation} failed with HTTP {status}"))
    } else {
        ConnectorError::Transport(format!("{operation} failed with HTTP {status}: {snippet}"))
    }
}

#[derive(Deserialize)]
#[serde(rename = "Envelope")]
struct SoapEnvelope<T> {
    #[serde(rename = "Body")]
    body: T,
}

#[derive(Deserialize)]
struct ResponseWrapper<T> {
    #[serde(rename = "Response")]
    response: T,
}

#[derive(Deserialize)]
struct PvOrderBody {
    #[serde(rename = "PVOrderResponse")]
    inner: ResponseWrapper<PvOrderResponse>,
}

#[derive(Deserialize)]
struct ModifyOrderBody {
    #[serde(rename = "ModifyMSSLOrderResponse")]
    inner: ResponseWrapper<ModifyOrderResponse>,
}

#[derive(Deserialize)]
struct GetDomainsBody {
    #[serde(rename = "GetMSSLDomainsResponse")]
    inner: ResponseWrapper<GetDomainsResponse>,
}

#[derive(Deserialize)]
struct GetProfilesBody {
    #[serde(rename = "GetMSSLProfilesResponse")]
    inner: ResponseWrapper<GetProfilesResponse>,
}

#[derive(Deserialize)]
struct GetOrderByIdBody {
    #[serde(rename = "GetOrderByOrderIDResponse")]
    inner: ResponseWrapper<GetOrderByOrderIdResponse>,
}

#[derive(Deserialize)]
struct GetOrdersByRangeBody {
    #[serde(rename = "GetOrderByDateRangeResponse")]
    inner: ResponseWrapper<GetOrderByDateRangeResponse>,
}

#[derive(Deserialize)]
struct ReissueBody {
    #[serde(rename = "ReIssueResponse")]
    inner: ResponseWrapper<ReissueResponse>,
}

fn parse_response<T: DeserializeOwned>(operation: &str, xml: &str) -> Result<T, ConnectorError> {
    let stripped = strip_namespaces(xml)?;
    let envelope: SoapEnvelope<T> = quick_xml::de::from_str(&stripped).map_err(|e| {
        ConnectorError::Transport(format!("cannot parse {operation} response: {e}"))
    })?;
    Ok(envelope.body)
}

/// Rewrites the document with local element names only. The vendor varies its
/// prefix usage between endpoints; the payload itself carries no attribute
/// data, so attributes are dropped along with the namespace declarations.
fn strip_namespaces(xml: &str) -> Result<String, ConnectorError> {
    fn malformed(e: &dyn std::fmt::Display) -> ConnectorError {
        ConnectorError::Transport(format!("malformed SOAP response: {e}"))
    }

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    loop {
        let event = reader.read_event().map_err(|e| malformed(&e))?;
        let written = match event {
            Event::Start(ref e) => {
                writer.write_event(Event::Start(BytesStart::new(local_name(e.name()))))
            }
            Event::Empty(ref e) => {
                writer.write_event(Event::Empty(BytesStart::new(local_name(e.name()))))
            }
            Event::End(ref e) => {
                writer.write_event(Event::End(BytesEnd::new(local_name(e.name()))))
            }
            Event::Eof => break,
            other => writer.write_event(other),
        };
        written.map_err(|e| malformed(&e))?;
    }
    String::from_utf8(writer.into_inner()).map_err(|e| malformed(&e))
}

fn local_name(name: QName) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
}

pub struct SoapOrderService {
    transport: SoapTransport,
}

impl OrderService for SoapOrderService {
    fn pv_order(&self, request: &PvOrderRequest) -> Result<PvOrderResponse, ConnectorError> {
        let body: PvOrderBody = self.transport.call("PVOrder", request)?;
        Ok(body.inner.response)
    }

    fn modify_order(
        &self,
        request: &ModifyOrderRequest,
    ) -> Result<ModifyOrderResponse, ConnectorError> {
        let body: ModifyOrderBody = self.transport.call("ModifyMSSLOrder", request)?;
        Ok(body.inner.response)
    }

    fn get_domains(
        &self,
        request: &GetDomainsRequest,
    ) -> Result<GetDomainsResponse, ConnectorError> {
        let body: GetDomainsBody = self.transport.call("GetMSSLDomains", request)?;
        Ok(body.inner.response)
    }

    fn get_profiles(
        &self,
        request: &GetProfilesRequest,
    ) -> Result<GetProfilesResponse, ConnectorError> {
        let body: GetProfilesBody = self.transport.call("GetMSSLProfiles", request)?;
        Ok(body.inner.response)
    }
}

pub struct SoapQueryService {
    transport: SoapTransport,
}

impl QueryService for SoapQueryService {
    fn get_order_by_id(
        &self,
        request: &GetOrderByOrderIdRequest,
    ) -> Result<GetOrderByOrderIdResponse, ConnectorError> {
        let body: GetOrderByIdBody = self.transport.call("GetOrderByOrderID", request)?;
        Ok(body.inner.response)
    }

    fn get_orders_by_date_range(
        &self,
        request: &GetOrderByDateRangeRequest,
    ) -> Result<GetOrderByDateRangeResponse, ConnectorError> {
        let body: GetOrdersByRangeBody = self.transport.call("GetOrderByDateRange", request)?;
        Ok(body.inner.response)
    }

    fn reissue(&self, request: &ReissueRequest) -> Result<ReissueResponse, ConnectorError> {
        let body: ReissueBody = self.transport.call("ReIssue", request)?;
        Ok(body.inner.response)
    }
}

/// Builds the production SOAP services against the endpoints selected by the
/// configuration.
pub struct SoapServiceFactory;

impl ServiceFactory for SoapServiceFactory {
    fn order_service(&self, config: &GlobalSignConfig) -> Box<dyn OrderService> {
        Box::new(SoapOrderService {
            transport: SoapTransport::new(config.service_url(ServiceKind::Order)),
        })
    }

    fn query_service(&self, config: &GlobalSignConfig) -> Box<dyn QueryService> {
        Box::new(SoapQueryService {
            transport: SoapTransport::new(config.service_url(ServiceKind::Query)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::wire::{AuthToken, RequestHeader};

    #[test]
    fn timeout_defaults_without_env() {
        assert_eq!(timeout_from(None), Duration::from_secs(60));
    }

    #[test]
    fn timeout_parses_valid_values() {
        assert_eq!(timeout_from(Some("20")), Duration::from_secs(20));
    }

    #[test]
    fn timeout_rejects_zero_and_garbage() {
        assert_eq!(timeout_from(Some("0")), Duration::from_secs(60));
        assert_eq!(timeout_from(Some("nope")), Duration::from_secs(60));
    }

    #[test]
    fn strips_prefixes_and_namespace_attributes() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><ws:Thing xmlns:ws="https://example.com/"><Value>7</Value></ws:Thing></soap:Body></soap:Envelope>"#;
        let stripped = strip_namespaces(xml).unwrap();
        assert_eq!(
            stripped,
            "<Envelope><Body><Thing><Value>7</Value></Thing></Body></Envelope>"
        );
    }

    #[test]
    fn parses_order_lookup_response() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ws:GetOrderByOrderIDResponse xmlns:ws="https://system.globalsign.com/kb/ws/">
      <Response>
        <OrderResponseHeader>
          <SuccessCode>0</SuccessCode>
        </OrderResponseHeader>
        <OrderDetail>
          <OrderInfo>
            <OrderID>CEAP21100001</OrderID>
            <ProductCode>PV_SHA2</ProductCode>
            <OrderDate>2024-01-10T08:30:00.000Z</OrderDate>
          </OrderInfo>
          <CertificateInfo>
            <CertificateStatus>4</CertificateStatus>
            <CommonName>www.example.com</CommonName>
          </CertificateInfo>
        </OrderDetail>
      </Response>
    </ws:GetOrderByOrderIDResponse>
  </soap:Body>
</soap:Envelope>"#;
        let body: GetOrderByIdBody = parse_response("GetOrderByOrderID", xml).unwrap();
        let response = body.inner.response;
        assert!(response.order_response_header.is_success());
        let detail = response.order_detail.unwrap();
        assert_eq!(detail.order_info.unwrap().order_id, "CEAP21100001");
        assert_eq!(
            detail.certificate_info.unwrap().certificate_status,
            "4"
        );
    }

    #[test]
    fn parses_failure_header_with_errors() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ws:PVOrderResponse xmlns:ws="https://system.globalsign.com/kb/ws/">
      <Response>
        <OrderResponseHeader>
          <SuccessCode>-1</SuccessCode>
          <Errors>
            <ErrorCode>-102</ErrorCode>
            <ErrorField>ProductCode</ErrorField>
            <ErrorMessage>Mandatory parameter missing</ErrorMessage>
          </Errors>
        </OrderResponseHeader>
      </Response>
    </ws:PVOrderResponse>
  </soap:Body>
</soap:Envelope>"#;
        let body: PvOrderBody = parse_response("PVOrder", xml).unwrap();
        let header = body.inner.response.order_response_header;
        assert!(!header.is_success());
        assert_eq!(header.errors.len(), 1);
        assert_eq!(header.errors[0].error_code, "-102");
        assert_eq!(header.errors[0].error_field.as_deref(), Some("ProductCode"));
    }

    #[test]
    fn serializes_revoke_request_body() {
        let request = ModifyOrderRequest {
            order_request_header: RequestHeader {
                auth_token: AuthToken {
                    user_name: "gs_user".into(),
                    password: "gs_pass".into(),
                },
            },
            order_id: "CEAP21100001".into(),
            modify_order_operation: "Revoke".into(),
        };
        let payload = quick_xml::se::to_string_with_root("Request", &request).unwrap();
        assert!(payload.starts_with("<Request>"));
        assert!(payload.contains("<OrderID>CEAP21100001</OrderID>"));
        assert!(payload.contains("<ModifyOrderOperation>Revoke</ModifyOrderOperation>"));
        assert!(payload.contains("<UserName>gs_user</UserName>"));
    }

    #[test]
    fn http_errors_map_to_transport_failures() {
        let auth = status_error("PVOrder", StatusCode::UNAUTHORIZED, "");
        assert!(auth.to_string().contains("rejected by the GlobalSign gateway"));
        let server = status_error("PVOrder", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(server.to_string().contains("HTTP 500"));
        assert!(server.to_string().contains("boom"));
    }
}
