//! Generation configuration: options file, environment overrides and validation

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use abimcp_common::{Error, Result};

use super::networks;

/// Options controlling what the generated server contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory the server is written to
    #[serde(alias = "outputDir")]
    pub output_dir: PathBuf,
    /// Exclude every state-changing tool
    #[serde(alias = "readOnly")]
    pub read_only: bool,
    /// Generate event resources
    #[serde(alias = "includeEvents")]
    pub include_events: bool,
    /// Generate contract info / balance / block number helper tools
    #[serde(alias = "includeUtilities")]
    pub include_utilities: bool,
    /// Default value of the `simulate` parameter on write tools
    #[serde(alias = "simulationDefault")]
    pub simulation_default: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated"),
            read_only: false,
            include_events: true,
            include_utilities: true,
            simulation_default: true,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a `.toml` or `.json` file and apply environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read configuration file {}: {}", path.display(), e))
        })?;

        let mut config: GeneratorConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                Error::config(format!("Failed to parse TOML configuration file {}: {}", path.display(), e))
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("Failed to parse JSON configuration file {}: {}", path.display(), e))
            })?,
            _ => {
                return Err(Error::config(
                    "Unsupported configuration file format. Supported formats: .toml, .json",
                ))
            }
        };

        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Apply `ABIMCP_*` environment variable overrides
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(output_dir) = lookup("ABIMCP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(output_dir);
        }
        if let Some(value) = lookup("ABIMCP_READ_ONLY") {
            self.read_only = parse_flag("ABIMCP_READ_ONLY", &value)?;
        }
        if let Some(value) = lookup("ABIMCP_INCLUDE_EVENTS") {
            self.include_events = parse_flag("ABIMCP_INCLUDE_EVENTS", &value)?;
        }
        if let Some(value) = lookup("ABIMCP_INCLUDE_UTILITIES") {
            self.include_utilities = parse_flag("ABIMCP_INCLUDE_UTILITIES", &value)?;
        }
        if let Some(value) = lookup("ABIMCP_SIMULATION_DEFAULT") {
            self.simulation_default = parse_flag("ABIMCP_SIMULATION_DEFAULT", &value)?;
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("Invalid {} value: {}", key, value))),
    }
}

/// Per-invocation generation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Deployed contract address
    pub contract_address: String,
    /// Network key, e.g. `mainnet`
    pub network: String,
    /// Explicit contract name; overrides artifact and standard names
    #[serde(default)]
    pub contract_name: Option<String>,
}

impl GenerationRequest {
    pub fn new(contract_address: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            network: network.into(),
            contract_name: None,
        }
    }

    pub fn with_contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = Some(name.into());
        self
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error in field '{}': {}", self.field, self.message)
    }
}

/// Configuration validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Configuration validator trait
pub trait ConfigValidator {
    /// Validate the configuration, reporting every problem found
    fn validate(&self) -> ValidationResult;

    /// Validate and fold all problems into a single configuration error
    fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Error::config(messages.join("; "))
        })
    }
}

impl ConfigValidator for GeneratorConfig {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if self.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new("output_dir", "Output directory cannot be empty"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ConfigValidator for GenerationRequest {
    fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        if !is_valid_address(&self.contract_address) {
            errors.push(ValidationError::new(
                "contract_address",
                format!(
                    "'{}' is not a valid address (expected 0x followed by 40 hex characters)",
                    self.contract_address
                ),
            ));
        }

        if self.network.trim().is_empty() {
            errors.push(ValidationError::new("network", "Network cannot be empty"));
        } else if !networks::is_valid_network_key(&self.network) {
            errors.push(ValidationError::new(
                "network",
                format!(
                    "'{}' is not a valid network name (letters, digits, '-' and '_' only)",
                    self.network
                ),
            ));
        }

        if let Some(name) = &self.contract_name {
            if name.trim().is_empty() {
                errors.push(ValidationError::new("contract_name", "Contract name cannot be blank"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Whether `address` is `0x` followed by 40 hex characters
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
