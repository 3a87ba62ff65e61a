//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the checkout services, store rules, and product catalog.

use cart_core::{CheckoutServices, InMemoryCartRepository, ProductCatalog, StoreConfig};
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Path to the store rules TOML
    pub store_config: String,
    /// Path to the product catalog TOML
    pub products_config: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            store_config: std::env::var("STORE_CONFIG")
                .unwrap_or_else(|_| "config/store.toml".to_string()),
            products_config: std::env::var("PRODUCTS_CONFIG")
                .unwrap_or_else(|_| "config/products.toml".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout repository, strategies and event handler
    pub services: CheckoutServices,
    /// Product catalog
    pub catalog: ProductCatalog,
    /// Store pricing rules
    pub store: StoreConfig,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let catalog = load_product_catalog(&config.products_config)?;
        let store = load_store_config(&config.store_config)?;
        Ok(Self::from_parts(config, store, catalog))
    }

    /// Wire services over an in-memory repository
    pub fn from_parts(config: AppConfig, store: StoreConfig, catalog: ProductCatalog) -> Self {
        let strategies = store.strategies(catalog.clone());
        let services = CheckoutServices::new(Arc::new(InMemoryCartRepository::new()), strategies);

        Self {
            services,
            catalog,
            store,
            config,
        }
    }
}

/// Candidate locations for a config file, the configured path first
fn candidate_paths(configured: &str) -> Vec<String> {
    let mut paths = vec![configured.to_string()];
    if !configured.starts_with('/') {
        paths.push(format!("../{}", configured));
        paths.push(format!("../../{}", configured));
    }
    paths
}

/// Load product catalog from config file
fn load_product_catalog(configured: &str) -> anyhow::Result<ProductCatalog> {
    for path in candidate_paths(configured) {
        if let Ok(content) = std::fs::read_to_string(&path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found at {}, using empty catalog", configured);
    Ok(ProductCatalog::new())
}

/// Load store rules from config file
fn load_store_config(configured: &str) -> anyhow::Result<StoreConfig> {
    for path in candidate_paths(configured) {
        if let Ok(content) = std::fs::read_to_string(&path) {
            let store = StoreConfig::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path, e))?;
            tracing::info!(
                "Loaded store rules from {} ({} discount codes)",
                path,
                store.discounts.len()
            );
            return Ok(store);
        }
    }

    tracing::warn!("No store config found at {}, using free shipping and no taxes", configured);
    Ok(StoreConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> AppConfig {
        AppConfig {
            host: host.to_string(),
            port,
            environment: "test".to_string(),
            store_config: "config/store.toml".to_string(),
            products_config: "config/products.toml".to_string(),
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("0.0.0.0", 3000).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_socket_addr() {
        assert!(config("not a host", 3000).socket_addr().is_err());
    }

    #[test]
    fn test_candidate_paths() {
        assert_eq!(
            candidate_paths("config/store.toml"),
            vec!["config/store.toml", "../config/store.toml", "../../config/store.toml"]
        );
        assert_eq!(candidate_paths("/etc/store.toml"), vec!["/etc/store.toml"]);
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let catalog = load_product_catalog("does/not/exist.toml").unwrap();
        assert!(catalog.products.is_empty());

        let store = load_store_config("does/not/exist.toml").unwrap();
        assert!(store.discounts.is_empty());
    }
}
