//! Translates abstract enrollment intents into GlobalSign wire requests. The
//! new-order and renewal builders share one population helper; reissue is
//! structurally different and builds the query-service request instead.

use std::collections::HashMap;

use crate::api::wire::{
    AuthToken, ContactInfo, OrderOption, OrderRequestParameter, PvOrderRequest, ReissueParameter,
    ReissueRequest, RequestHeader, SanEntry, ValidityPeriod,
};
use crate::error::ConnectorError;
use crate::gateway::EnrollmentKind;
use crate::resolver::DomainBinding;

const ORDER_KIND_NEW: &str = "new";
const ORDER_KIND_RENEWAL: &str = "renewal";
const LICENSES: &str = "1";
/// Vendor SANOptionType codes.
const SAN_TYPE_FQDN: &str = "7";
const SAN_TYPE_WILDCARD: &str = "13";

/// A single enrollment request as handed over by the host, before translation
/// to the vendor wire format. Immutable once built, consumed once.
#[derive(Debug, Clone)]
pub struct EnrollmentIntent {
    pub kind: EnrollmentKind,
    /// PEM CSR text.
    pub csr: String,
    /// Comma-separated RDN subject string.
    pub subject: String,
    /// SAN values by category ("dns", "email", ...).
    pub sans: HashMap<String, Vec<String>>,
    pub product_code: String,
    /// Requested validity, in months, as the vendor-required string.
    pub months: String,
    /// Prior order reference; required for Renew and Reissue.
    pub prior_order_id: Option<String>,
    /// Prior certificate serial, used for the reissue completion check.
    pub prior_serial: Option<String>,
}

impl EnrollmentIntent {
    pub fn dns_sans(&self) -> &[String] {
        self.sans
            .iter()
            .find(|(category, _)| category.eq_ignore_ascii_case("dns"))
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }
}

/// Builds a new-order request for the managed SSL service.
pub fn build_new_order(
    intent: &EnrollmentIntent,
    common_name: &str,
    binding: &DomainBinding,
    requester_name: &str,
    auth: AuthToken,
) -> PvOrderRequest {
    populate_order(intent, common_name, binding, requester_name, auth, ORDER_KIND_NEW, None)
}

/// Builds a renewal order. The prior order id is a hard precondition: without
/// it the vendor cannot link the renewal to the original order.
pub fn build_renewal_order(
    intent: &EnrollmentIntent,
    common_name: &str,
    binding: &DomainBinding,
    requester_name: &str,
    auth: AuthToken,
) -> Result<PvOrderRequest, ConnectorError> {
    let target = intent.prior_order_id.clone().ok_or_else(|| {
        ConnectorError::Configuration(
            "renewal requires a prior order id resolved from the prior certificate serial".into(),
        )
    })?;
    Ok(populate_order(
        intent,
        common_name,
        binding,
        requester_name,
        auth,
        ORDER_KIND_RENEWAL,
        Some(target),
    ))
}

/// Builds a reissue request. Reissue operates against an existing order, so it
/// carries only the new CSR and the target order id; no contact, domain or
/// product fields.
pub fn build_reissue(
    intent: &EnrollmentIntent,
    target_order_id: &str,
    auth: AuthToken,
) -> ReissueRequest {
    ReissueRequest {
        order_request_header: RequestHeader { auth_token: auth },
        target_order_id: target_order_id.to_string(),
        order_parameter: ReissueParameter {
            csr: intent.csr.clone(),
            dns_names: None,
        },
    }
}

/// Shared field population for new and renewal orders.
fn populate_order(
    intent: &EnrollmentIntent,
    common_name: &str,
    binding: &DomainBinding,
    requester_name: &str,
    auth: AuthToken,
    order_kind: &str,
    renewal_target_order_id: Option<String>,
) -> PvOrderRequest {
    let san_entries = classify_sans(common_name, intent.dns_sans());
    let options = if san_entries.is_empty() {
        Vec::new()
    } else {
        // The vendor requires this companion flag whenever SAN entries are
        // present in the order.
        vec![OrderOption {
            option_name: "SAN".into(),
            option_value: "True".into(),
        }]
    };
    let contact = binding.contact.clone();

    PvOrderRequest {
        order_request_header: RequestHeader { auth_token: auth },
        order_request_parameter: OrderRequestParameter {
            product_code: intent.product_code.clone(),
            base_option: base_option(common_name),
            order_kind: order_kind.to_string(),
            licenses: LICENSES.to_string(),
            options,
            validity_period: ValidityPeriod {
                months: intent.months.clone(),
            },
            csr: intent.csr.clone(),
            renewal_target_order_id,
        },
        mssl_profile_id: binding.profile_id.clone(),
        mssl_domain_id: binding.domain_id.clone(),
        contact_info: ContactInfo {
            first_name: requester_name.to_string(),
            last_name: requester_name.to_string(),
            phone: contact.as_ref().map(|c| c.phone.clone()).unwrap_or_default(),
            email: contact.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
        },
        san_entries,
    }
}

/// "wildcard" when the common name starts with `*`; otherwise the field is
/// omitted entirely (never an empty string).
fn base_option(common_name: &str) -> Option<String> {
    if !common_name.is_empty() && common_name.starts_with('*') {
        Some("wildcard".to_string())
    } else {
        None
    }
}

/// SAN values equal to the common name are dropped (the vendor rejects
/// duplicate-CN entries); wildcards get option type "13", plain FQDNs "7".
fn classify_sans(common_name: &str, sans: &[String]) -> Vec<SanEntry> {
    sans.iter()
        .filter(|san| !san.eq_ignore_ascii_case(common_name))
        .map(|san| SanEntry {
            subject_alt_name: san.clone(),
            san_option_type: if san.starts_with('*') {
                SAN_TYPE_WILDCARD.to_string()
            } else {
                SAN_TYPE_FQDN.to_string()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthToken {
        AuthToken {
            user_name: "user".into(),
            password: "pass".into(),
        }
    }

    fn binding() -> DomainBinding {
        DomainBinding {
            domain_id: "DSMS100".into(),
            profile_id: "MP100".into(),
            domain_name: "example.com".into(),
            domain_status: "3".into(),
            contact: Some(ContactInfo {
                first_name: "Domain".into(),
                last_name: "Owner".into(),
                phone: "555-0100".into(),
                email: "pki@example.com".into(),
            }),
        }
    }

    fn intent(kind: EnrollmentKind) -> EnrollmentIntent {
        EnrollmentIntent {
            kind,
            csr: "-----BEGIN CERTIFICATE REQUEST-----\nMIIB\n-----END CERTIFICATE REQUEST-----".into(),
            subject: "CN=www.example.com".into(),
            sans: HashMap::from([(
                "dns".to_string(),
                vec![
                    "www.example.com".to_string(),
                    "*.example.com".to_string(),
                    "api.example.com".to_string(),
                ],
            )]),
            product_code: "PV_SHA2".into(),
            months: "12".into(),
            prior_order_id: None,
            prior_serial: None,
        }
    }

    #[test]
    fn san_entries_exclude_cn_and_classify_types() {
        let request = build_new_order(
            &intent(EnrollmentKind::New),
            "www.example.com",
            &binding(),
            "Jane Admin",
            auth(),
        );
        let sans = &request.san_entries;
        assert_eq!(sans.len(), 2);
        assert!(!sans.iter().any(|s| s.subject_alt_name == "www.example.com"));
        assert_eq!(
            sans.iter().find(|s| s.subject_alt_name == "*.example.com").unwrap().san_option_type,
            "13"
        );
        assert_eq!(
            sans.iter().find(|s| s.subject_alt_name == "api.example.com").unwrap().san_option_type,
            "7"
        );
        let options = &request.order_request_parameter.options;
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].option_name, "SAN");
        assert_eq!(options[0].option_value, "True");
    }

    #[test]
    fn cn_dedup_is_case_insensitive() {
        let mut i = intent(EnrollmentKind::New);
        i.sans = HashMap::from([("DNS".to_string(), vec!["WWW.Example.COM".to_string()])]);
        let request = build_new_order(&i, "www.example.com", &binding(), "Jane Admin", auth());
        assert!(request.san_entries.is_empty());
        assert!(request.order_request_parameter.options.is_empty());
    }

    #[test]
    fn wildcard_cn_sets_base_option() {
        let request = build_new_order(
            &intent(EnrollmentKind::New),
            "*.example.com",
            &binding(),
            "Jane Admin",
            auth(),
        );
        assert_eq!(
            request.order_request_parameter.base_option.as_deref(),
            Some("wildcard")
        );
    }

    #[test]
    fn plain_cn_omits_base_option() {
        let request = build_new_order(
            &intent(EnrollmentKind::New),
            "www.example.com",
            &binding(),
            "Jane Admin",
            auth(),
        );
        assert!(request.order_request_parameter.base_option.is_none());
    }

    #[test]
    fn common_fields_are_populated() {
        let request = build_new_order(
            &intent(EnrollmentKind::New),
            "www.example.com",
            &binding(),
            "Jane Admin",
            auth(),
        );
        assert_eq!(request.mssl_profile_id, "MP100");
        assert_eq!(request.mssl_domain_id, "DSMS100");
        assert_eq!(request.order_request_parameter.order_kind, "new");
        assert_eq!(request.order_request_parameter.licenses, "1");
        assert_eq!(request.order_request_parameter.validity_period.months, "12");
        assert_eq!(request.contact_info.first_name, "Jane Admin");
        assert_eq!(request.contact_info.last_name, "Jane Admin");
        assert_eq!(request.contact_info.email, "pki@example.com");
        assert_eq!(request.contact_info.phone, "555-0100");
    }

    #[test]
    fn renewal_links_prior_order() {
        let mut i = intent(EnrollmentKind::Renew);
        i.prior_order_id = Some("CEAP21100001".into());
        let request =
            build_renewal_order(&i, "www.example.com", &binding(), "Jane Admin", auth()).unwrap();
        assert_eq!(request.order_request_parameter.order_kind, "renewal");
        assert_eq!(
            request.order_request_parameter.renewal_target_order_id.as_deref(),
            Some("CEAP21100001")
        );
    }

    #[test]
    fn renewal_without_prior_order_fails_fast() {
        let i = intent(EnrollmentKind::Renew);
        let err = build_renewal_order(&i, "www.example.com", &binding(), "Jane Admin", auth())
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Configuration(_)));
    }

    #[test]
    fn reissue_carries_only_csr_and_target() {
        let i = intent(EnrollmentKind::Reissue);
        let request = build_reissue(&i, "CEAP21100002", auth());
        assert_eq!(request.target_order_id, "CEAP21100002");
        assert_eq!(request.order_parameter.csr, i.csr);
        assert!(request.order_parameter.dns_names.is_none());
    }
}
