//! Static catalog of GlobalSign error codes. The vendor emits signed codes in
//! different contexts, so lookup normalizes through the absolute value, and an
//! unknown code resolves to the designated fallback entry instead of failing.

use std::collections::HashMap;

/// Catalog key of the "unknown GlobalSign error" fallback entry.
pub const UNKNOWN_ERROR_CODE: i32 = 8001;
/// Catalog key for "order not found", synthesized when the pickup window is
/// exhausted without the order reaching Issued.
pub const ORDER_NOT_FOUND_CODE: i32 = 9916;
/// Catalog key for responses that are structurally empty despite a success
/// header.
pub const NULL_RESPONSE_CODE: i32 = 2220;

/// One resolved vendor error. The invalid-parameter family (101-104) keeps a
/// `{0}` placeholder in its detail text; the API client substitutes the
/// offending field name when the response envelope names one.
#[derive(Debug, Clone, Copy)]
pub struct VendorError {
    pub error_code: i32,
    pub success_code: i32,
    pub error_message: &'static str,
    pub error_details: &'static str,
}

impl VendorError {
    /// Short message: `ErrorMessage` when present, else the detail text.
    pub fn message(&self) -> &'static str {
        if self.error_message.is_empty() {
            self.error_details
        } else {
            self.error_message
        }
    }

    /// Full user-facing failure text: message and details concatenated.
    pub fn detailed_message(&self) -> String {
        format!("{} {}", self.error_message, self.error_details)
            .trim()
            .to_string()
    }
}

/// Immutable error table, built once at startup and injected into the API
/// client.
pub struct ErrorCatalog {
    entries: HashMap<i32, VendorError>,
}

impl ErrorCatalog {
    pub fn builtin() -> Self {
        let entries = TABLE
            .iter()
            .map(|e| (e.error_code.abs(), *e))
            .collect::<HashMap<_, _>>();
        ErrorCatalog { entries }
    }

    /// Resolves a vendor error code. Never fails: sign is ignored and unknown
    /// codes fall back to the entry registered under 8001.
    pub fn lookup(&self, code: i32) -> VendorError {
        let key = code.abs();
        match self.entries.get(&key) {
            Some(entry) => *entry,
            None => self.entries[&UNKNOWN_ERROR_CODE],
        }
    }
}

const fn entry(code: i32, message: &'static str, details: &'static str) -> VendorError {
    VendorError {
        error_code: -code.abs(),
        success_code: -1,
        error_message: message,
        error_details: details,
    }
}

const PARAM_GUIDANCE: &str = "Please check that the parameter {0} matches the API specification. Please review the specific ErrorMessage returned in the XML response for parameter details and consult the XML Field definitions section of the applicable API document.";

static TABLE: &[VendorError] = &[
    entry(101, "Invalid parameter entered.", PARAM_GUIDANCE),
    entry(102, "Mandatory parameter missing", PARAM_GUIDANCE),
    entry(103, "Parameter length check error", PARAM_GUIDANCE),
    entry(104, "Parameter format check error.", PARAM_GUIDANCE),
    entry(105, "Invalid parameter combination", "Invalid parameter combination. Please check that the parameters match the API specification."),
    entry(201, "Internal system error - Failed database operation", "System Error. (Database error - database operation). Please retry and if the issue persists contact support with detailed information concerning the issue."),
    entry(300, "Database Error. Please retry and if the issue persists contact support with detailed information concerning the issue.", "Database Error. Please retry and if the issue persists contact support with detailed information concerning the issue."),
    entry(301, "Internal system error - Failed database operation", "System Error. (Database error - inconsistent data). Please retry and if the issue persists contact support with detailed information concerning the issue."),
    entry(2001, "Internal system error - Email sending warning", "Internal system error - Email sending warning. Unable to send email with the details of your order to your email address. Please contact support with detailed information concerning this issue."),
    entry(4001, "Login failure invalid user ID Login failure.", "UserName or Password is incorrect. Please make sure that you have specified the correct UserName and Password."),
    entry(4008, "The certificate is either expired, does not meet the requirements of transfer, or is inaccessible on the CN by the GlobalSign system. Please ensure that the certificate is correct and try again", "Unable to process this request. It could be that the Common Name in the TargetCERT specified does not match the Common Name specified for this request or the TargetCERT is inaccessible on the Common Name by the GlobalSign system."),
    entry(4083, "", "The CommonName specified is not the same or is not a subdomain of the specified MSSLDomainID. Please make sure that the CommonName or the MSSLDomainID is correctly entered."),
    entry(4201, "", "Your IP Address {0} is not within the range of IP addresses that is allowed for API use. Please contact GlobalSign support to have this address added for API access"),
    entry(6002, "", "There was an error when trying to parse the TargetCERT specified. Please make sure that the TargetCERT specified is correct."),
    entry(6007, "", "The Public Key of the CSR has been used previously. For security reasons we allow the keys to be used if they have the same CN. Please recheck the CSR specified and try again."),
    entry(6017, "", "The number of SANEntry has exceeded the maximum allowed number of SANEntry. Please do not exceed the maximum allowed number of SANEntry."),
    entry(6021, "", "Common Name in CSR and FQDN for check do not match. Please make sure that the CSR has been entered correctly."),
    entry(6101, "The account used does not have enough balance to order a certificate", "Your account does not have enough remaining balance to process this request. Please make sure you have enough remaining balance in your account before proceeding with this request."),
    entry(6102, "The renewal of the certificate failed. There may be lacking or incorrect information that is required for the renewal of the certificate", "The renewal of the certificate failed. Please note that when renewing a certificate, the Common Name of the original certificate and this request must be the same. Please also check that the status of the original order is ISSUED and that the order has not been previously renewed."),
    entry(8001, "", "Unknown GlobalSign error occured"),
    entry(9200, "", "The type of your user is not allowed to use this API. Please check your permission and retry."),
    entry(9401, "No profile was found using the supplied MSSLProfileID. Please make sure that the supplied MSSLProfileID is correct.", "Unable to process this request because you do not have permission to access the MSSLProfileID or we were unable to find the MSSLProfileID specified."),
    entry(9403, "The account used does not have MSSL rights. Please make sure you are using an account with MSSL rights.", "MSSL is not activated for this user. Please make sure that your UserName is correctly entered."),
    entry(9404, "", "You do not have permission to add a domain to this MSSLProfileID. Please make sure that the MSSLProfileID is correctly entered."),
    entry(9405, "", "Unable to process this request. You need to upgrade your account to MSSL Pro before you can add another profile. Please contact GlobalSign Support to request for an upgrade to MSSL Pro."),
    entry(9406, "", "The DomainName already exists for the MSSLProfileID. Please make sure that the DomainName you are adding is unique or make sure that the MSSLProfileID specified is correctly entered."),
    entry(9407, "", "A Profile with that OrganizationName, StateOrProvince, Locality and Country already exists. Please make sure that the details mentioned above are correctly entered."),
    entry(9430, "", "You do not have permission to edit the specified MSSLProfileID. Please make sure that the MSSLProfileID is correctly entered."),
    entry(9440, "No domain was found using the supplied MSSLDomainID. Please make sure that the supplied MSSLDomainID is correct.", "We were unable to find the MSSLDomainID specified. Please make sure that the supplied MSSLDomainID is correct."),
    entry(9442, "", "You do not have permission to delete the specified MSSLDomainID. Please make sure that the MSSLDomainID is correctly entered."),
    entry(9443, "The account used does not have access to the domain associated with the supplied MSSLDomainID", "You do not have permission to use the specified MSSLDomainID. Please make sure that the MSSLDomainID is correctly specified."),
    entry(9444, "", "The specified DomainName or SubjectAltName is not supported. Note that wildcard gTLDs are not supported. Please make sure that the DomainName or SubjectAltName specified is correctly entered."),
    entry(9445, "", "Unable to process this request because the vetting level of the MSSLProfileID and the specified VettingLevel does not match. Note that when adding an EV Domain, the vetting level of the specified MSSLProfile should also be EV."),
    entry(9450, "Cannot request a certificate order. Please try again.", "Unable to process this request. Please note that when requesting for EV orders, an MSSLProfileID with an EV Vetting level must be used. Also make sure that the ProductCode of your request is supported in MSSL."),
    entry(9901, "", "The Product Group of this user does not allow ordering of the specified ProductCode. Please contact GlobalSign Support if you wish to order using this ProductCode."),
    entry(9902, "", "Unable to process this request. You do not have permission to access the OrderID. Please make sure that the OrderID is correctly entered."),
    entry(9913, "No valid coupons were found. Please recheck the supplied coupon.", "We were unable to find the Coupon specified. Please make sure that it is correctly entered."),
    entry(9914, "No valid campaigns were found. Please recheck the supplied campaign.", "We were unable to find the Campaign specified. Please make sure that it is correctly entered."),
    entry(9915, "Certificate was already canceled", "The OrderID you are trying to modify has been cancelled previously. Please make sure that the OrderID is correctly entered."),
    entry(9916, "Cannot find the certificate that is associated with the order id you have supplied", "We were not able to find the OrderID specified. Please make sure that the OrderID is correctly entered."),
    entry(9918, "The coupon or campaign you supplied is invalid", "The coupon or campaign you specified is already expired. Please make sure that the coupon or campaign is correctly entered."),
    entry(9919, "The coupon or campaign you supplied is already used", "The coupon you specified has been used previously. Please make sure that the coupon is correctly entered."),
    entry(9920, "The coupon or campaign you supplied is not allowed to be used", "The coupon or campaign you specified is not yet activated. Please make sure that the coupon or campaign is correctly entered."),
    entry(9922, "The coupon or campaign's currency is not the same with the currency of your user", "The currency of the specified Coupon or Campaign is not the same with the currency of your user. Please make sure that the coupon or campaign is correctly entered."),
    entry(9933, "The expiration date you have entered is not compatible with the product you have selected", "The calculated months of the NotBefore and NotAfter specified is beyond the specified Months. Please make sure that the NotBefore and NotAfter has been entered correctly."),
    entry(9934, "", "The Top Level Domain used belongs to GlobalSign's Banned List. Therefore, a certificate cannot be issued. Please make sure that Common Name is correctly entered."),
    entry(9936, "GlobalSign operates a security and vulnerability scan of the public key component of the CSR you have just submitted.", "The key you used in your CSR is either too short (RSA minimum 2048, ECC minimum 256), or the key failed the Debian weak key check as well as key length. Please generate a new keypair and try again"),
    entry(9938, "The status of the certificate has already been changed", "The certificate you are trying to modify has already been modified. Please make sure that the OrderID is correctly entered."),
    entry(9939, "", "The state of this account is either invalid, stopped or locked. Please make sure that the account is correctly configured. Contact customer support for assistance."),
    entry(9940, "", "The specified NotBefore or NotAfter should not be before the current date. OR The public key used in the CSR specified has been previously revoked. Please confirm your CSR and try again."),
    entry(9942, "A problem was encountered when trying to request the certificate in the RA System", "An internal server problem has been encountered. Please try again and if the issue persists contact GlobalSign support with detailed information concerning the issue."),
    entry(9943, "A problem was encountered when trying to issue the certificate in the RA System", "We were unable to issue this certificate request. It could be that your certificate has been modified previously. Please make sure that Data is correctly entered."),
    entry(9949, "", "The NotAfter specified is after the calculated BaseLine Validity Limit. Please take note that validity should not exceed 39 months."),
    entry(9952, "", "The Top Level Domain you specified belongs to the list of TLDs that is not allowed for ordering. Please make sure that Common Name is correctly entered."),
    entry(9953, "", "Cannot complete this request because the region or country of your Domain is not allowed for this partner. Please make sure that Common Name is correctly entered."),
    entry(9961, "", "The ECC CSR you specified is not allowed. Please enter an ECC CSR using either P-256 or P-384 curves."),
    entry(9962, "", "Key Compression is not allowed. Please make sure that CSR is correctly entered."),
    entry(9964, "", "Unable to process this request. It could be that the HashAlgorithm of this order is ECC but the key Algorithm of the CSR is RSA. Please make sure that the CSR or the ProductCode are correctly entered."),
    entry(9971, "", "Due to industry requirements, you can no longer issue certificates with internal server names in Common Name. Please specify a non-internal Common Name."),
    // Connector-synthesized codes for failures the vendor never reports itself.
    entry(2220, "", "The GlobalSign webservice responded with a null object."),
    entry(2221, "", "The CSR is missing a common name"),
    entry(2222, "", "The domain id for the provided common name could not be found"),
    entry(2223, "", "The profile id for the provided common name and organization could not be found"),
    entry(2224, "", "Not a valid term for a GlobalSign product. Valid term lengths are 6 months, 1 year, or 2 years."),
    entry(2225, "", "Could not connect to GlobalSign web service"),
    entry(2226, "", "This domain is not enabled. To order a certificate for this domain please enable it in the configuration wizard."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_sign_invariant() {
        let catalog = ErrorCatalog::builtin();
        for entry in TABLE {
            let code = entry.error_code.abs();
            let pos = catalog.lookup(code);
            let neg = catalog.lookup(-code);
            assert_eq!(pos.error_code, neg.error_code);
            assert_eq!(pos.error_details, neg.error_details);
        }
    }

    #[test]
    fn unknown_code_falls_back_to_8001() {
        let catalog = ErrorCatalog::builtin();
        let err = catalog.lookup(123456);
        assert_eq!(err.error_code, -UNKNOWN_ERROR_CODE);
        assert!(err.detailed_message().contains("Unknown GlobalSign error"));
    }

    #[test]
    fn message_prefers_error_message_over_details() {
        let catalog = ErrorCatalog::builtin();
        let with_message = catalog.lookup(4001);
        assert_eq!(with_message.message(), with_message.error_message);
        let details_only = catalog.lookup(6021);
        assert_eq!(details_only.message(), details_only.error_details);
    }

    #[test]
    fn detailed_message_concatenates_and_trims() {
        let catalog = ErrorCatalog::builtin();
        let details_only = catalog.lookup(9902);
        assert!(!details_only.detailed_message().starts_with(' '));
        let both = catalog.lookup(6101);
        assert!(both.detailed_message().starts_with(both.error_message));
        assert!(both.detailed_message().ends_with(both.error_details));
    }

    #[test]
    fn invalid_parameter_family_keeps_placeholder() {
        let catalog = ErrorCatalog::builtin();
        for code in [101, 102, 103, 104] {
            assert!(catalog.lookup(code).error_details.contains("{0}"));
        }
    }
}
