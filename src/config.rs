use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::wire::AuthToken;
use crate::client::retry::RetryPolicy;
use crate::error::ConnectorError;

const ORDER_TEST_URL: &str = "https://test-gcc.globalsign.com/kb/ws/v2/ManagedSSLService";
const ORDER_PROD_URL: &str = "https://system.globalsign.com/kb/ws/v2/ManagedSSLService";
const QUERY_TEST_URL: &str = "https://test-gcc.globalsign.com/kb/ws/v1/GASService";
const QUERY_PROD_URL: &str = "https://system.globalsign.com/kb/ws/v1/GASService";

/// Wire timestamp format required by the GASService date-range queries.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Default range start for a full sync when no start date is configured.
const SYNC_EPOCH: &str = "2000-01-01";

/// The two GlobalSign SOAP endpoints. Enrollment and revocation go through the
/// order service; lookups, date-range queries and reissue through the query
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Order,
    Query,
}

/// Flat connector configuration handed over by the host as a JSON object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GlobalSignConfig {
    pub is_test: bool,
    pub pickup_retries: u32,
    /// Seconds between pickup attempts.
    pub pickup_delay: u64,
    pub username: String,
    pub password: String,
    pub sync_start_date: Option<String>,
    pub sync_interval_days: Option<i64>,
}

impl Default for GlobalSignConfig {
    fn default() -> Self {
        GlobalSignConfig {
            is_test: false,
            pickup_retries: 5,
            pickup_delay: 10,
            username: String::new(),
            password: String::new(),
            sync_start_date: None,
            sync_interval_days: None,
        }
    }
}

impl GlobalSignConfig {
    /// Parses the host-supplied connection data.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, ConnectorError> {
        serde_json::from_value(raw)
            .map_err(|e| ConnectorError::Configuration(format!("cannot parse CA connection data: {e}")))
    }

    pub fn service_url(&self, kind: ServiceKind) -> &'static str {
        match kind {
            ServiceKind::Order if self.is_test => ORDER_TEST_URL,
            ServiceKind::Order => ORDER_PROD_URL,
            ServiceKind::Query if self.is_test => QUERY_TEST_URL,
            ServiceKind::Query => QUERY_PROD_URL,
        }
    }

    /// Credential pair embedded in every outbound request.
    pub fn auth_token(&self) -> AuthToken {
        AuthToken {
            user_name: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn pickup_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.pickup_retries,
            delay: Duration::from_secs(self.pickup_delay),
        }
    }

    /// Range start for a full sync: the configured start date if present,
    /// otherwise a fixed epoch well before any MSSL order.
    pub fn sync_start(&self) -> Result<DateTime<Utc>, ConnectorError> {
        let raw = self.sync_start_date.as_deref().unwrap_or(SYNC_EPOCH);
        parse_sync_date(raw)
    }

    /// Checks the optional sync-window settings: the start date must parse and
    /// the paired interval must be strictly positive.
    pub fn validate_sync_window(&self) -> Result<(), ConnectorError> {
        let Some(raw) = self.sync_start_date.as_deref() else {
            return Ok(());
        };
        parse_sync_date(raw)?;
        match self.sync_interval_days {
            Some(days) if days > 0 => Ok(()),
            Some(days) => Err(ConnectorError::Configuration(format!(
                "SyncIntervalDays must be greater than zero, got {days}"
            ))),
            None => Err(ConnectorError::Configuration(
                "SyncStartDate is set but SyncIntervalDays is missing".into(),
            )),
        }
    }
}

fn parse_sync_date(raw: &str) -> Result<DateTime<Utc>, ConnectorError> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            ConnectorError::Configuration(format!("SyncStartDate '{raw}' is not a valid date"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GlobalSignConfig {
        GlobalSignConfig {
            username: "gs_user".into(),
            password: "gs_pass".into(),
            ..GlobalSignConfig::default()
        }
    }

    #[test]
    fn parses_host_connection_data() {
        let cfg = GlobalSignConfig::from_json(json!({
            "IsTest": true,
            "PickupRetries": 3,
            "PickupDelay": 2,
            "Username": "user",
            "Password": "secret",
        }))
        .unwrap();
        assert!(cfg.is_test);
        assert_eq!(cfg.pickup_retries, 3);
        assert_eq!(cfg.pickup_delay, 2);
        assert_eq!(cfg.username, "user");
        assert!(cfg.sync_start_date.is_none());
    }

    #[test]
    fn selects_urls_by_environment() {
        let mut cfg = config();
        assert!(cfg.service_url(ServiceKind::Order).contains("system.globalsign.com"));
        assert!(cfg.service_url(ServiceKind::Query).contains("GASService"));
        cfg.is_test = true;
        assert!(cfg.service_url(ServiceKind::Order).contains("test-gcc"));
        assert!(cfg.service_url(ServiceKind::Query).contains("test-gcc"));
    }

    #[test]
    fn sync_start_defaults_to_epoch() {
        let cfg = config();
        let start = cfg.sync_start().unwrap();
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2000-01-01");
    }

    #[test]
    fn sync_start_honors_configured_date() {
        let mut cfg = config();
        cfg.sync_start_date = Some("2023-06-15".into());
        let start = cfg.sync_start().unwrap();
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2023-06-15");
    }

    #[test]
    fn sync_window_requires_positive_interval() {
        let mut cfg = config();
        cfg.sync_start_date = Some("2023-06-15".into());
        cfg.sync_interval_days = Some(0);
        assert!(matches!(
            cfg.validate_sync_window(),
            Err(ConnectorError::Configuration(_))
        ));
        cfg.sync_interval_days = Some(30);
        assert!(cfg.validate_sync_window().is_ok());
    }

    #[test]
    fn sync_window_rejects_garbage_date() {
        let mut cfg = config();
        cfg.sync_start_date = Some("not-a-date".into());
        cfg.sync_interval_days = Some(30);
        assert!(matches!(
            cfg.validate_sync_window(),
            Err(ConnectorError::Configuration(_))
        ));
    }
}
