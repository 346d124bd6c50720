//! Supported GlobalSign MSSL product table.

use crate::error::ConnectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Intranet,
    Ov,
    Ev,
    Cloud,
}

#[derive(Debug, Clone, Copy)]
pub struct CertProduct {
    pub display_name: &'static str,
    pub product_code: &'static str,
    pub short_name: &'static str,
    pub has_wildcard: bool,
    pub category: ProductCategory,
}

/// Immutable product table built once at startup and injected wherever product
/// codes need validation.
pub struct ProductCatalog {
    products: &'static [CertProduct],
}

impl ProductCatalog {
    pub fn builtin() -> Self {
        ProductCatalog { products: PRODUCTS }
    }

    pub fn find(&self, product_code: &str) -> Option<&'static CertProduct> {
        self.products
            .iter()
            .find(|p| p.product_code.eq_ignore_ascii_case(product_code))
    }

    /// Unknown product codes are a configuration error, surfaced at
    /// validate-product time before any enrollment is attempted.
    pub fn require(&self, product_code: &str) -> Result<&'static CertProduct, ConnectorError> {
        self.find(product_code).ok_or_else(|| {
            ConnectorError::Configuration(format!(
                "product code '{product_code}' is not a supported GlobalSign MSSL product"
            ))
        })
    }

    pub fn all(&self) -> &'static [CertProduct] {
        self.products
    }
}

static PRODUCTS: &[CertProduct] = &[
    CertProduct { display_name: "ExtendedSSL SHA256", product_code: "PEV_SHA2", short_name: "ExtendedSSL", has_wildcard: false, category: ProductCategory::Ev },
    CertProduct { display_name: "ExtendedSSL SHA1", product_code: "PEV", short_name: "ExtendedSSL-Deprecated", has_wildcard: false, category: ProductCategory::Ev },
    CertProduct { display_name: "OrganizationSSL SHA1", product_code: "PV", short_name: "OrganizationSSL-Deprecated", has_wildcard: true, category: ProductCategory::Ov },
    CertProduct { display_name: "OrganizationSSL SHA256", product_code: "PV_SHA2", short_name: "OrganizationSSL", has_wildcard: true, category: ProductCategory::Ov },
    CertProduct { display_name: "IntranetSSL SHA1", product_code: "PV_INTRA", short_name: "IntranetSSL", has_wildcard: true, category: ProductCategory::Intranet },
    CertProduct { display_name: "IntranetSSL SHA2", product_code: "PV_INTRA_SHA2", short_name: "IntranetSSL", has_wildcard: true, category: ProductCategory::Intranet },
    CertProduct { display_name: "IntranetSSL SHA256ECDSA", product_code: "PV_INTRA_ECCP256", short_name: "IntranetSSL", has_wildcard: true, category: ProductCategory::Intranet },
    CertProduct { display_name: "CloudSSL SHA256", product_code: "PV_CLOUD", short_name: "CloudSSL", has_wildcard: true, category: ProductCategory::Cloud },
    CertProduct { display_name: "CloudSSL SHA256ECDSA", product_code: "PV_CLOUD_ECC2", short_name: "CloudSSL", has_wildcard: true, category: ProductCategory::Cloud },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let catalog = ProductCatalog::builtin();
        let product = catalog.find("pv_sha2").unwrap();
        assert_eq!(product.display_name, "OrganizationSSL SHA256");
        assert_eq!(product.category, ProductCategory::Ov);
        assert!(product.has_wildcard);
    }

    #[test]
    fn ev_products_never_allow_wildcards() {
        let catalog = ProductCatalog::builtin();
        for product in catalog.all() {
            if product.category == ProductCategory::Ev {
                assert!(!product.has_wildcard, "{}", product.product_code);
            }
        }
    }

    #[test]
    fn unknown_code_is_a_configuration_error() {
        let catalog = ProductCatalog::builtin();
        assert!(matches!(
            catalog.require("DV_CHEAP"),
            Err(ConnectorError::Configuration(_))
        ));
    }
}
