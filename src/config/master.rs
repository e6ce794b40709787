//! Master data and alert policy loading from config.toml
//!
//! The TOML file seeds products, partners, warehouses and storage locations on first run
//! and sets the expiry alert policy. Every section is optional.

use crate::core::alerts::ExpiryPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Expiry alert policy
    #[serde(default)]
    pub alerts: AlertConfig,
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    /// Customers and suppliers to seed
    #[serde(default)]
    pub partners: Vec<PartnerConfig>,
    /// Warehouses to seed
    #[serde(default)]
    pub warehouses: Vec<WarehouseConfig>,
    /// Storage locations to seed
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

/// `[alerts]` section
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Lots expiring within this many days are reported
    #[serde(default = "default_expiry_window_days")]
    pub expiry_window_days: i64,
    /// Whether lots that are already past their expiry date are reported
    #[serde(default = "default_include_expired")]
    pub include_expired: bool,
}

const fn default_expiry_window_days() -> i64 {
    30
}

const fn default_include_expired() -> bool {
    true
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            expiry_window_days: default_expiry_window_days(),
            include_expired: default_include_expired(),
        }
    }
}

impl AlertConfig {
    /// Converts the configured values into the policy used by expiry alerting.
    #[must_use]
    pub const fn policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            window_days: self.expiry_window_days,
            include_expired: self.include_expired,
        }
    }
}

/// Configuration for a single product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Unique SKU
    pub sku: String,
    /// Display name
    pub name: String,
    /// Category label
    pub category: String,
    /// Reorder threshold (safety stock)
    #[serde(default)]
    pub reorder_threshold: i64,
}

/// Configuration for a customer or supplier
#[derive(Debug, Deserialize, Clone)]
pub struct PartnerConfig {
    /// Partner code
    pub code: String,
    /// Business name
    pub name: String,
    /// `"customer"` or `"supplier"`
    pub kind: String,
}

/// Configuration for a warehouse
#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    /// Warehouse code
    pub code: String,
    /// Human-readable name
    pub name: String,
}

/// Configuration for a storage location
#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    /// Location code
    pub code: String,
    /// Owning warehouse code
    pub warehouse: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read config file {}: {e}",
            path.as_ref().display()
        ),
    })?;

    Ok(toml::from_str(&contents)?)
}

/// Loads configuration from `CONFIG_PATH`, or `./config.toml` when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_master_config() {
        let toml_str = r#"
            [alerts]
            expiry_window_days = 14
            include_expired = false

            [[products]]
            sku = "SKU-D01"
            name = "Premium grain-free dog food"
            category = "dog food"
            reorder_threshold = 50

            [[products]]
            sku = "SKU-C01"
            name = "Wellness cat can"
            category = "cat food"

            [[warehouses]]
            code = "WH01"
            name = "Main warehouse"

            [[locations]]
            code = "WH01-A-01"
            warehouse = "WH01"

            [[partners]]
            code = "C-2001"
            name = "Happy Pet Shop"
            kind = "customer"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.alerts.expiry_window_days, 14);
        assert!(!config.alerts.include_expired);
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].reorder_threshold, 50);
        assert_eq!(config.products[1].reorder_threshold, 0);
        assert_eq!(config.warehouses[0].code, "WH01");
        assert_eq!(config.locations[0].warehouse, "WH01");
        assert!(config.locations[0].description.is_none());
        assert_eq!(config.partners[0].kind, "customer");
    }

    #[test]
    fn test_empty_config_uses_default_alert_policy() {
        let config: Config = toml::from_str("").unwrap();
        let policy = config.alerts.policy();
        assert_eq!(policy.window_days, 30);
        assert!(policy.include_expired);
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let path = std::env::temp_dir().join("mungbob-bad-config.toml");
        std::fs::write(&path, "[[products]]\nsku = 5\n").unwrap();
        let result = load_config(&path);
        assert!(matches!(result, Err(Error::Toml(_))));
        std::fs::remove_file(&path).ok();
    }
}
