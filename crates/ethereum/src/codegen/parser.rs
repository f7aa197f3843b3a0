//! Ethereum ABI parser
//!
//! Parses Ethereum contract ABI JSON (a bare entry array or a compiler artifact
//! wrapping an `abi` key) into typed entries. Document-level problems abort the
//! parse; problems with individual entries become warnings on the result.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use abimcp_common::{Error, Result};

use super::standards::{detect_standard, InterfaceStandard};
use super::types::TypeParser;

/// State mutability of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// ABI spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    /// `pure` and `view` functions never modify state
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

impl FromStr for StateMutability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pure" => Ok(StateMutability::Pure),
            "view" => Ok(StateMutability::View),
            "nonpayable" => Ok(StateMutability::NonPayable),
            "payable" => Ok(StateMutability::Payable),
            other => Err(format!("unknown state mutability '{}'", other)),
        }
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABI parameter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiParameter {
    /// Parameter name (may be empty)
    #[serde(default)]
    pub name: String,
    /// Parameter type (e.g., uint256, address, tuple[])
    #[serde(rename = "type")]
    pub param_type: String,
    /// Internal type (for structs and custom types)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    /// Components (for tuples and structs)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParameter>,
    /// Whether parameter is indexed (events only)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub indexed: bool,
}

impl AbiParameter {
    /// Canonical type as used in signatures, tuples expanded
    pub fn canonical_type(&self) -> String {
        TypeParser::parse_parameter(self).canonical()
    }

    /// Struct name from `internalType`, e.g. `struct Router.Order` -> `Router.Order`
    pub fn struct_name(&self) -> Option<&str> {
        self.internal_type
            .as_deref()
            .and_then(|t| t.strip_prefix("struct "))
            .map(|t| t.find('[').map_or(t, |bracket| &t[..bracket]))
    }
}

/// ABI function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    /// Function name
    pub name: String,
    /// Function inputs
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    /// Function outputs
    #[serde(default)]
    pub outputs: Vec<AbiParameter>,
    /// State mutability (pure, view, nonpayable, payable)
    pub state_mutability: StateMutability,
}

impl AbiFunction {
    /// Whether the function is `pure` or `view`
    pub fn is_read_only(&self) -> bool {
        self.state_mutability.is_read_only()
    }

    /// Whether the function accepts native currency
    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Whether calling the function costs gas
    pub fn requires_gas(&self) -> bool {
        !self.is_read_only()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    /// 4-byte selector as 0x-prefixed hex
    pub fn selector(&self) -> String {
        let hash = keccak256(self.signature().as_bytes());
        format!("0x{}", hex::encode(&hash[..4]))
    }
}

/// ABI event definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiEvent {
    /// Event name
    pub name: String,
    /// Event inputs
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    /// Whether event is anonymous
    #[serde(default)]
    pub anonymous: bool,
}

impl AbiEvent {
    /// Inputs stored in log topics
    pub fn indexed_inputs(&self) -> Vec<&AbiParameter> {
        self.inputs.iter().filter(|p| p.indexed).collect()
    }

    /// Inputs stored in log data
    pub fn data_inputs(&self) -> Vec<&AbiParameter> {
        self.inputs.iter().filter(|p| !p.indexed).collect()
    }

    /// Canonical signature, e.g. `Transfer(address,address,uint256)`
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    /// Topic hash; anonymous events do not emit one
    pub fn topic(&self) -> Option<String> {
        if self.anonymous {
            return None;
        }
        Some(format!("0x{}", hex::encode(keccak256(self.signature().as_bytes()))))
    }
}

/// ABI error definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiError {
    /// Error name
    pub name: String,
    /// Error inputs
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
}

impl AbiError {
    /// Canonical signature
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }

    /// 4-byte selector as 0x-prefixed hex
    pub fn selector(&self) -> String {
        let hash = keccak256(self.signature().as_bytes());
        format!("0x{}", hex::encode(&hash[..4]))
    }
}

/// ABI constructor definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiConstructor {
    /// Constructor inputs
    #[serde(default)]
    pub inputs: Vec<AbiParameter>,
    /// State mutability (nonpayable or payable)
    pub state_mutability: StateMutability,
}

/// A single ABI entry, resolved once from its `type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiEntry {
    Function(AbiFunction),
    Event(AbiEvent),
    Error(AbiError),
    Constructor(AbiConstructor),
    Fallback {
        #[serde(rename = "stateMutability")]
        state_mutability: StateMutability,
    },
    Receive,
}

/// Non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbiWarning {
    /// Entry skipped because a required field is missing or malformed
    InvalidEntry { index: usize, reason: String },
    /// Entry skipped because its `type` tag is not recognized
    UnknownEntryType { index: usize, entry_type: String },
    /// Parameter type the mapper does not recognize; it will be exposed as a string
    UnknownType { location: String, type_name: String },
}

impl fmt::Display for AbiWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiWarning::InvalidEntry { index, reason } => {
                write!(f, "ABI entry #{} skipped: {}", index, reason)
            }
            AbiWarning::UnknownEntryType { index, entry_type } => {
                write!(f, "ABI entry #{} skipped: unknown entry type '{}'", index, entry_type)
            }
            AbiWarning::UnknownType { location, type_name } => {
                write!(f, "Unknown Solidity type '{}' in {}", type_name, location)
            }
        }
    }
}

/// Parsed Ethereum contract ABI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAbi {
    /// Contract constructor
    pub constructor: Option<AbiConstructor>,
    /// Contract functions in ABI order
    pub functions: Vec<AbiFunction>,
    /// Contract events in ABI order
    pub events: Vec<AbiEvent>,
    /// Contract errors in ABI order
    pub errors: Vec<AbiError>,
    /// Whether a fallback function is declared
    pub has_fallback: bool,
    /// Whether a receive function is declared
    pub has_receive: bool,
    /// Contract name taken from an artifact wrapper
    pub contract_name: Option<String>,
    /// Interface standard matched by function names
    pub detected_standard: Option<InterfaceStandard>,
    /// Entry-level problems that did not abort parsing
    pub warnings: Vec<AbiWarning>,
    /// Raw ABI entry array
    pub raw_abi: Value,
}

impl ParsedAbi {
    /// `pure`/`view` functions
    pub fn read_functions(&self) -> Vec<&AbiFunction> {
        self.functions.iter().filter(|f| f.is_read_only()).collect()
    }

    /// State-changing functions
    pub fn write_functions(&self) -> Vec<&AbiFunction> {
        self.functions.iter().filter(|f| f.requires_gas()).collect()
    }

    /// Payable functions
    pub fn payable_functions(&self) -> Vec<&AbiFunction> {
        self.functions.iter().filter(|f| f.is_payable()).collect()
    }

    /// First function with the given name
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// First event with the given name
    pub fn event(&self, name: &str) -> Option<&AbiEvent> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// Ethereum ABI parser
pub struct AbiParser;

impl AbiParser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self
    }

    /// Parse an ABI from JSON text
    pub fn parse_content(&self, content: &str) -> Result<ParsedAbi> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::parse(format!("ABI is not valid JSON: {}", e)))?;
        self.parse_value(&value)
    }

    /// Parse an ABI from a JSON value (entry array or artifact object)
    pub fn parse_value(&self, value: &Value) -> Result<ParsedAbi> {
        let (entries, contract_name) = unwrap_artifact(value)?;

        if entries.is_empty() {
            return Err(Error::parse("ABI array is empty; there is nothing to generate"));
        }

        let mut parsed = ParsedAbi {
            constructor: None,
            functions: Vec::new(),
            events: Vec::new(),
            errors: Vec::new(),
            has_fallback: false,
            has_receive: false,
            contract_name,
            detected_standard: None,
            warnings: Vec::new(),
            raw_abi: Value::Array(entries.clone()),
        };

        for (index, item) in entries.iter().enumerate() {
            match self.parse_entry(index, item) {
                Ok(entry) => {
                    debug!(index, entry = ?entry_label(&entry), "Parsed ABI entry");
                    record_unknown_types(&entry, &mut parsed.warnings);
                    match entry {
                        AbiEntry::Function(function) => parsed.functions.push(function),
                        AbiEntry::Event(event) => parsed.events.push(event),
                        AbiEntry::Error(error) => parsed.errors.push(error),
                        AbiEntry::Constructor(constructor) => parsed.constructor = Some(constructor),
                        AbiEntry::Fallback { .. } => parsed.has_fallback = true,
                        AbiEntry::Receive => parsed.has_receive = true,
                    }
                }
                Err(warning) => parsed.warnings.push(warning),
            }
        }

        for warning in &parsed.warnings {
            warn!("{}", warning);
        }

        parsed.detected_standard =
            detect_standard(parsed.functions.iter().map(|f| f.name.as_str()));

        Ok(parsed)
    }

    /// Parse one entry, dispatching on its `type` tag
    pub fn parse_entry(&self, index: usize, item: &Value) -> std::result::Result<AbiEntry, AbiWarning> {
        let invalid = |reason: String| AbiWarning::InvalidEntry { index, reason };

        if !item.is_object() {
            return Err(invalid("entry is not a JSON object".to_string()));
        }

        let entry_type = item
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid("missing 'type' field".to_string()))?;

        match entry_type {
            "function" => {
                let name = required_name(item).ok_or_else(|| invalid("function without a name".to_string()))?;
                Ok(AbiEntry::Function(AbiFunction {
                    name,
                    inputs: parameter_list(item, "inputs", false).map_err(invalid)?,
                    outputs: parameter_list(item, "outputs", false).map_err(invalid)?,
                    state_mutability: state_mutability(item).map_err(invalid)?,
                }))
            }
            "event" => {
                let name = required_name(item).ok_or_else(|| invalid("event without a name".to_string()))?;
                Ok(AbiEntry::Event(AbiEvent {
                    name,
                    inputs: parameter_list(item, "inputs", true).map_err(invalid)?,
                    anonymous: item.get("anonymous").and_then(|v| v.as_bool()).unwrap_or(false),
                }))
            }
            "error" => {
                let name = required_name(item).ok_or_else(|| invalid("error without a name".to_string()))?;
                Ok(AbiEntry::Error(AbiError {
                    name,
                    inputs: parameter_list(item, "inputs", false).map_err(invalid)?,
                }))
            }
            "constructor" => Ok(AbiEntry::Constructor(AbiConstructor {
                inputs: parameter_list(item, "inputs", false).map_err(invalid)?,
                state_mutability: state_mutability(item).map_err(invalid)?,
            })),
            "fallback" => Ok(AbiEntry::Fallback {
                state_mutability: state_mutability(item).map_err(invalid)?,
            }),
            "receive" => Ok(AbiEntry::Receive),
            other => Err(AbiWarning::UnknownEntryType {
                index,
                entry_type: other.to_string(),
            }),
        }
    }
}

impl Default for AbiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a document into its entry array and an optional contract name
fn unwrap_artifact(value: &Value) -> Result<(Vec<Value>, Option<String>)> {
    match value {
        Value::Array(entries) => Ok((entries.clone(), None)),
        Value::Object(map) => {
            let abi = map
                .get("abi")
                .ok_or_else(|| Error::parse("ABI must be an array or contain an 'abi' key"))?;

            let entries = match abi {
                Value::Array(entries) => entries.clone(),
                // Explorer APIs return the ABI as an embedded JSON string
                Value::String(text) => match serde_json::from_str::<Value>(text) {
                    Ok(Value::Array(entries)) => entries,
                    _ => return Err(Error::parse("the 'abi' key must contain an array")),
                },
                _ => return Err(Error::parse("the 'abi' key must contain an array")),
            };

            let contract_name = ["contractName", "contract_name"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
                .filter(|name| !name.trim().is_empty())
                .map(String::from);

            Ok((entries, contract_name))
        }
        _ => Err(Error::parse("ABI must be an array or contain an 'abi' key")),
    }
}

fn required_name(item: &Value) -> Option<String> {
    item.get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .map(String::from)
}

fn state_mutability(item: &Value) -> std::result::Result<StateMutability, String> {
    if let Some(explicit) = item.get("stateMutability").and_then(|v| v.as_str()) {
        return explicit.parse();
    }

    // Legacy ABIs only carry `constant` / `payable` flags
    if item.get("constant").and_then(|v| v.as_bool()).unwrap_or(false) {
        Ok(StateMutability::View)
    } else if item.get("payable").and_then(|v| v.as_bool()).unwrap_or(false) {
        Ok(StateMutability::Payable)
    } else {
        Ok(StateMutability::NonPayable)
    }
}

fn parameter_list(
    item: &Value,
    key: &str,
    allow_indexed: bool,
) -> std::result::Result<Vec<AbiParameter>, String> {
    match item.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(array)) => parse_parameters(array, allow_indexed, key),
        Some(_) => Err(format!("'{}' must be an array", key)),
    }
}

fn parse_parameters(
    array: &[Value],
    allow_indexed: bool,
    context: &str,
) -> std::result::Result<Vec<AbiParameter>, String> {
    let mut parameters = Vec::with_capacity(array.len());

    for (position, param) in array.iter().enumerate() {
        let param_type = param
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("{} parameter #{} has no type", context, position))?
            .to_string();

        let components = match param.get("components") {
            Some(Value::Array(components)) if param_type.starts_with("tuple") => {
                parse_parameters(components, false, "component")?
            }
            _ => Vec::new(),
        };

        parameters.push(AbiParameter {
            name: param
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            param_type,
            internal_type: param
                .get("internalType")
                .and_then(|v| v.as_str())
                .map(String::from),
            components,
            indexed: allow_indexed
                && param.get("indexed").and_then(|v| v.as_bool()).unwrap_or(false),
        });
    }

    Ok(parameters)
}

fn record_unknown_types(entry: &AbiEntry, warnings: &mut Vec<AbiWarning>) {
    let (label, groups): (String, Vec<(&str, &[AbiParameter])>) = match entry {
        AbiEntry::Function(f) => (
            format!("function {}", f.name),
            vec![("input", f.inputs.as_slice()), ("output", f.outputs.as_slice())],
        ),
        AbiEntry::Event(e) => (format!("event {}", e.name), vec![("field", e.inputs.as_slice())]),
        AbiEntry::Error(e) => (format!("error {}", e.name), vec![("field", e.inputs.as_slice())]),
        AbiEntry::Constructor(c) => ("constructor".to_string(), vec![("input", c.inputs.as_slice())]),
        AbiEntry::Fallback { .. } | AbiEntry::Receive => return,
    };

    for (role, params) in groups {
        for (position, param) in params.iter().enumerate() {
            for type_name in TypeParser::parse_parameter(param).unknown_base_types() {
                let param_label = if param.name.is_empty() {
                    format!("#{}", position)
                } else {
                    format!("'{}'", param.name)
                };
                warnings.push(AbiWarning::UnknownType {
                    location: format!("{} {} {}", label, role, param_label),
                    type_name,
                });
            }
        }
    }
}

fn entry_label(entry: &AbiEntry) -> String {
    match entry {
        AbiEntry::Function(f) => format!("function {}", f.signature()),
        AbiEntry::Event(e) => format!("event {}", e.signature()),
        AbiEntry::Error(e) => format!("error {}", e.signature()),
        AbiEntry::Constructor(_) => "constructor".to_string(),
        AbiEntry::Fallback { .. } => "fallback".to_string(),
        AbiEntry::Receive => "receive".to_string(),
    }
}

fn canonical_signature(name: &str, inputs: &[AbiParameter]) -> String {
    let types: Vec<String> = inputs.iter().map(AbiParameter::canonical_type).collect();
    format!("{}({})", name, types.join(","))
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
