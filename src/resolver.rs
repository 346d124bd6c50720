//! Binds an enrollment subject to a vendor-managed MSSL domain and profile.
//! The binding is resolved fresh for every enrollment; profile and contact
//! data can change between calls, so bindings are never cached or reused.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::api::wire::{ContactInfo, DomainDetail};
use crate::error::ConnectorError;

/// Domain approval statuses usable for ordering: approved-active or
/// approved-renewing-still-usable.
const ALLOWED_DOMAIN_STATUSES: [&str; 4] = ["3", "7", "9", "10"];

/// Stand-in for literal `\,` while splitting the subject on commas. NUL cannot
/// appear in a distinguished name.
const ESCAPE_SENTINEL: char = '\u{0}';

/// The resolved vendor domain a single enrollment binds to.
#[derive(Debug, Clone)]
pub struct DomainBinding {
    pub domain_id: String,
    pub profile_id: String,
    pub domain_name: String,
    pub domain_status: String,
    pub contact: Option<ContactInfo>,
}

impl From<&DomainDetail> for DomainBinding {
    fn from(detail: &DomainDetail) -> Self {
        DomainBinding {
            domain_id: detail.domain_id.clone(),
            profile_id: detail.mssl_profile_id.clone(),
            domain_name: detail.domain_name.clone(),
            domain_status: detail.domain_status.clone(),
            contact: detail.contact_info.clone(),
        }
    }
}

/// Recoverable parse failure: the subject has no such RDN. Callers fall back
/// to SAN-based domain resolution.
#[derive(Debug, Error)]
#[error("the request subject is missing a {rdn} value")]
pub struct MissingRdn {
    rdn: &'static str,
}

/// Extracts an RDN value from a comma-separated subject string, preserving
/// backslash-escaped commas inside the value.
pub fn parse_rdn(subject: &str, rdn: &'static str) -> Result<String, MissingRdn> {
    let escaped = subject.replace("\\,", &ESCAPE_SENTINEL.to_string());
    escaped
        .split(',')
        .find(|segment| segment.trim_start().starts_with(rdn))
        .map(|segment| {
            segment
                .trim_start()
                .trim_start_matches(rdn)
                .replace(ESCAPE_SENTINEL, ",")
                .trim()
                .to_string()
        })
        .ok_or(MissingRdn { rdn })
}

/// Resolves the common name and the vendor domain an enrollment binds to.
///
/// The CN from the subject wins when present; otherwise the DNS SANs are
/// scanned in their given order and the first value whose suffix matches an
/// approved domain becomes the common name (the vendor API requires the
/// CommonName field be populated). First match is final, no scoring.
pub fn resolve_domain(
    subject: &str,
    sans: &HashMap<String, Vec<String>>,
    domains: &[DomainDetail],
) -> Result<(String, DomainBinding), ConnectorError> {
    let allowed: Vec<&DomainDetail> = domains
        .iter()
        .filter(|d| ALLOWED_DOMAIN_STATUSES.contains(&d.domain_status.trim()))
        .collect();
    if allowed.is_empty() {
        return Err(ConnectorError::DomainResolution(
            "no approved MSSL domains are available for this account".into(),
        ));
    }

    match parse_rdn(subject, "CN=") {
        Ok(common_name) => {
            let binding = match_suffix(&common_name, &allowed).ok_or_else(|| {
                ConnectorError::DomainResolution(format!(
                    "no approved MSSL domain matches common name '{common_name}'"
                ))
            })?;
            debug!(
                "[resolver] bound CN {} to domain {} (profile {})",
                common_name, binding.domain_name, binding.profile_id
            );
            Ok((common_name, binding))
        }
        Err(missing) => {
            warn!("[resolver] {missing}; using SAN domain lookup instead");
            let dns_sans = sans
                .iter()
                .find(|(category, _)| category.eq_ignore_ascii_case("dns"))
                .map(|(_, values)| values.as_slice())
                .unwrap_or_default();
            for san in dns_sans {
                if let Some(binding) = match_suffix(san, &allowed) {
                    debug!("[resolver] SAN domain match found for {san}");
                    return Ok((san.clone(), binding));
                }
            }
            Err(ConnectorError::DomainResolution(
                "no approved MSSL domain matches the subject or any DNS SAN".into(),
            ))
        }
    }
}

fn match_suffix(candidate: &str, allowed: &[&DomainDetail]) -> Option<DomainBinding> {
    let lowered = candidate.to_lowercase();
    allowed
        .iter()
        .find(|d| lowered.ends_with(&d.domain_name.to_lowercase()))
        .map(|d| DomainBinding::from(*d))
}
