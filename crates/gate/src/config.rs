//! Gate configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATE_DECLARATIONS` | declarations.json | Declarations document path |
//! | `GATE_LOG_LEVEL` | info | Log level |
//! | `GATE_DEFAULT_PER_PAGE` | 10 | Page size when a request gives none |
//! | `GATE_MAX_PER_PAGE` | unset | Upper bound on requested page sizes |
//!
//! # Example
//!
//! ```rust
//! use facility_gate::GateConfig;
//!
//! let config = GateConfig {
//!     default_per_page: 25,
//!     max_per_page: Some(200),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;

use clap::Parser;
use facility_grid::DEFAULT_PER_PAGE;

/// Configuration shared by the gate library and its command-line driver.
#[derive(Debug, Clone, Parser)]
pub struct GateConfig {
    /// Path to the declarations document (entities, endpoints, roles).
    #[arg(long, env = "GATE_DECLARATIONS", default_value = "declarations.json")]
    pub declarations: PathBuf,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "GATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Page size used when a request gives none.
    #[arg(long, env = "GATE_DEFAULT_PER_PAGE", default_value = "10")]
    pub default_per_page: u64,

    /// Upper bound applied to requested page sizes.
    #[arg(long, env = "GATE_MAX_PER_PAGE")]
    pub max_per_page: Option<u64>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            declarations: PathBuf::from("declarations.json"),
            log_level: "info".to_string(),
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: None,
        }
    }
}

impl GateConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.default_per_page <= 1 {
            errors.push("Default page size must be greater than 1".to_string());
        }

        if let Some(max) = self.max_per_page {
            if max < self.default_per_page {
                errors.push("Max page size cannot be below the default page size".to_string());
            }
        }

        if self.declarations.as_os_str().is_empty() {
            errors.push("Declarations path cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            log_level: "debug".to_string(),
            max_per_page: Some(100),
            ..Self::default()
        }
    }
}
