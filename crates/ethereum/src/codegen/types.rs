//! Solidity type descriptors
//!
//! Parses ABI type strings (`uint256[3][]`, `tuple`, ...) into a small typed IR and
//! maps that IR onto JSON Schema (for tool input validation) and Python type hints
//! (for the generated server).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::parser::AbiParameter;

/// Pattern accepted for `address` values
pub const ADDRESS_PATTERN: &str = "^0x[0-9a-fA-F]{40}$";

/// Pattern for unsigned integers wider than 64 bits, carried as decimal strings
pub const UNSIGNED_DIGITS_PATTERN: &str = "^[0-9]+$";

/// Pattern for signed integers wider than 64 bits, carried as decimal strings
pub const SIGNED_DIGITS_PATTERN: &str = "^-?[0-9]+$";

/// Widest integer that is still exposed as a JSON integer
pub const MAX_NATIVE_INT_BITS: u32 = 64;

/// Normalized Solidity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Base type with array suffixes removed (`uint256`, `address`, `tuple`, ...)
    pub base_type: String,
    /// Array dimensions in declaration order; `None` marks a dynamic `[]`
    pub array_dimensions: Vec<Option<usize>>,
    /// Tuple members, only populated when component metadata was supplied
    pub tuple_components: Vec<TupleComponent>,
}

/// Named member of a tuple type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleComponent {
    /// Component name as declared in the ABI (may be empty)
    pub name: String,
    /// Component type
    pub descriptor: TypeDescriptor,
}

/// Classification of a base type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(usize),
    Uint(u32),
    Int(u32),
    Tuple,
    Unknown,
}

impl TypeDescriptor {
    /// Whether at least one array dimension was declared
    pub fn is_array(&self) -> bool {
        !self.array_dimensions.is_empty()
    }

    /// Whether the base type is a tuple
    pub fn is_tuple(&self) -> bool {
        self.base_type.starts_with("tuple")
    }

    /// Classify the base type
    pub fn kind(&self) -> BaseKind {
        classify_base(&self.base_type)
    }

    /// Collect every unrecognized base type, descending into tuple components
    pub fn unknown_base_types(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        self.collect_unknown(&mut unknown);
        unknown
    }

    fn collect_unknown(&self, out: &mut Vec<String>) {
        if self.kind() == BaseKind::Unknown {
            out.push(self.base_type.clone());
        }
        for component in &self.tuple_components {
            component.descriptor.collect_unknown(out);
        }
    }

    /// Canonical ABI form, expanding tuples into `(t1,t2,...)`
    pub fn canonical(&self) -> String {
        let base = if self.is_tuple() && !self.tuple_components.is_empty() {
            let members: Vec<String> = self
                .tuple_components
                .iter()
                .map(|c| c.descriptor.canonical())
                .collect();
            format!("({})", members.join(","))
        } else {
            self.base_type.clone()
        };
        format!("{}{}", base, self.dimension_suffix())
    }

    /// Conversion spec consumed by the generated `_to_abi` / `_to_json` helpers:
    /// a base type string, `{"array": inner}` per dimension, or
    /// `{"tuple": [[field, spec], ...]}`
    pub fn abi_spec(&self) -> Value {
        let base = if self.is_tuple() {
            let members: Vec<Value> = self
                .tuple_components
                .iter()
                .enumerate()
                .map(|(index, c)| json!([tuple_field_name(&c.name, index), c.descriptor.abi_spec()]))
                .collect();
            json!({ "tuple": members })
        } else {
            json!(self.base_type)
        };
        self.array_dimensions
            .iter()
            .fold(base, |inner, _| json!({ "array": inner }))
    }

    fn dimension_suffix(&self) -> String {
        self.array_dimensions
            .iter()
            .map(|dim| match dim {
                Some(n) => format!("[{}]", n),
                None => "[]".to_string(),
            })
            .collect()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base_type, self.dimension_suffix())
    }
}

fn classify_base(base: &str) -> BaseKind {
    match base {
        "address" => BaseKind::Address,
        "bool" => BaseKind::Bool,
        "string" => BaseKind::String,
        "bytes" => BaseKind::Bytes,
        _ if base.starts_with("tuple") => BaseKind::Tuple,
        _ => {
            if let Some(width) = base.strip_prefix("bytes") {
                return match width.parse::<usize>() {
                    Ok(n) if (1..=32).contains(&n) => BaseKind::FixedBytes(n),
                    _ => BaseKind::Unknown,
                };
            }
            if let Some(bits) = base.strip_prefix("uint") {
                return match parse_int_width(bits) {
                    Some(n) => BaseKind::Uint(n),
                    None => BaseKind::Unknown,
                };
            }
            if let Some(bits) = base.strip_prefix("int") {
                return match parse_int_width(bits) {
                    Some(n) => BaseKind::Int(n),
                    None => BaseKind::Unknown,
                };
            }
            BaseKind::Unknown
        }
    }
}

fn parse_int_width(bits: &str) -> Option<u32> {
    let n = bits.parse::<u32>().ok()?;
    if (8..=256).contains(&n) && n % 8 == 0 {
        Some(n)
    } else {
        None
    }
}

/// Parser for ABI type strings
pub struct TypeParser;

impl TypeParser {
    /// Parse a type string. Never fails: unrecognized input is kept verbatim as the base type.
    pub fn parse(type_string: &str) -> TypeDescriptor {
        let (core, array_dimensions) = split_dimensions(type_string.trim());
        TypeDescriptor {
            base_type: normalize_base(core),
            array_dimensions,
            tuple_components: Vec::new(),
        }
    }

    /// Parse a type string together with tuple component metadata
    pub fn parse_with_components(type_string: &str, components: &[AbiParameter]) -> TypeDescriptor {
        let mut descriptor = Self::parse(type_string);
        if descriptor.is_tuple() {
            descriptor.tuple_components = components
                .iter()
                .map(|component| TupleComponent {
                    name: component.name.clone(),
                    descriptor: Self::parse_parameter(component),
                })
                .collect();
        }
        descriptor
    }

    /// Parse an ABI parameter, recursing into its components
    pub fn parse_parameter(param: &AbiParameter) -> TypeDescriptor {
        Self::parse_with_components(&param.param_type, &param.components)
    }
}

/// Strip trailing `[..]` groups right to left, returning dimensions in source order
fn split_dimensions(type_string: &str) -> (&str, Vec<Option<usize>>) {
    let mut core = type_string;
    let mut dimensions = Vec::new();

    while core.ends_with(']') {
        let Some(open) = core.rfind('[') else {
            break;
        };
        let inner = core[open + 1..core.len() - 1].trim();
        let dimension = if inner.is_empty() {
            None
        } else {
            match inner.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => break,
            }
        };
        dimensions.push(dimension);
        core = core[..open].trim_end();
    }

    dimensions.reverse();
    (core, dimensions)
}

fn normalize_base(core: &str) -> String {
    match core {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        other => other.to_string(),
    }
}

/// Override for a single base type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomType {
    /// JSON Schema emitted for the base type
    pub schema: Value,
    /// Python type hint emitted for the base type
    pub target_type: String,
}

/// Immutable type mapping configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMapperConfig {
    /// Overrides keyed by normalized base type name
    #[serde(default)]
    pub custom_types: BTreeMap<String, CustomType>,
}

impl TypeMapperConfig {
    /// Return a copy with one more override registered
    pub fn with_custom_type(mut self, base_type: impl Into<String>, custom: CustomType) -> Self {
        self.custom_types.insert(base_type.into(), custom);
        self
    }
}

/// Maps type descriptors to JSON Schema and Python type hints
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    config: TypeMapperConfig,
}

impl TypeMapper {
    /// Create a mapper with the given overrides
    pub fn new(config: TypeMapperConfig) -> Self {
        Self { config }
    }

    /// Build the validation schema for a descriptor
    pub fn to_json_schema(
        &self,
        descriptor: &TypeDescriptor,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Value {
        let mut schema = self.array_schema(descriptor, &descriptor.array_dimensions);
        if let Value::Object(map) = &mut schema {
            if let Some(name) = name {
                map.insert("title".to_string(), json!(name));
            }
            if let Some(description) = description {
                map.entry("description")
                    .or_insert_with(|| json!(description));
            }
        }
        schema
    }

    /// Python type hint for a descriptor
    pub fn to_target_type(&self, descriptor: &TypeDescriptor) -> String {
        descriptor
            .array_dimensions
            .iter()
            .fold(self.base_target_type(descriptor), |inner, _| {
                format!("list[{}]", inner)
            })
    }

    fn array_schema(&self, descriptor: &TypeDescriptor, dimensions: &[Option<usize>]) -> Value {
        let Some((dimension, rest)) = dimensions.split_first() else {
            return self.base_schema(descriptor);
        };

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("array"));
        schema.insert("items".to_string(), self.array_schema(descriptor, rest));
        if let Some(length) = dimension {
            schema.insert("minItems".to_string(), json!(length));
            schema.insert("maxItems".to_string(), json!(length));
        }
        Value::Object(schema)
    }

    fn base_schema(&self, descriptor: &TypeDescriptor) -> Value {
        if let Some(custom) = self.config.custom_types.get(&descriptor.base_type) {
            return custom.schema.clone();
        }

        match descriptor.kind() {
            BaseKind::Address => json!({"type": "string", "pattern": ADDRESS_PATTERN}),
            BaseKind::Bool => json!({"type": "boolean"}),
            BaseKind::String | BaseKind::Bytes => json!({"type": "string"}),
            BaseKind::FixedBytes(n) => json!({
                "type": "string",
                "pattern": format!("^0x[0-9a-fA-F]{{{}}}$", n * 2),
            }),
            BaseKind::Uint(bits) if bits <= MAX_NATIVE_INT_BITS => {
                json!({"type": "integer", "minimum": 0})
            }
            BaseKind::Uint(_) => json!({"type": "string", "pattern": UNSIGNED_DIGITS_PATTERN}),
            BaseKind::Int(bits) if bits <= MAX_NATIVE_INT_BITS => {
                let minimum = -(1i128 << (bits - 1));
                json!({"type": "integer", "minimum": minimum as i64})
            }
            BaseKind::Int(_) => json!({"type": "string", "pattern": SIGNED_DIGITS_PATTERN}),
            BaseKind::Tuple => self.tuple_schema(&descriptor.tuple_components),
            BaseKind::Unknown => json!({
                "type": "string",
                "description": format!("Unknown Solidity type: {}", descriptor.base_type),
            }),
        }
    }

    fn tuple_schema(&self, components: &[TupleComponent]) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (index, component) in components.iter().enumerate() {
            let field = tuple_field_name(&component.name, index);
            properties.insert(
                field.clone(),
                self.to_json_schema(&component.descriptor, None, None),
            );
            required.push(json!(field));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    fn base_target_type(&self, descriptor: &TypeDescriptor) -> String {
        if let Some(custom) = self.config.custom_types.get(&descriptor.base_type) {
            return custom.target_type.clone();
        }

        match descriptor.kind() {
            BaseKind::Bool => "bool".to_string(),
            BaseKind::Uint(bits) | BaseKind::Int(bits) if bits <= MAX_NATIVE_INT_BITS => {
                "int".to_string()
            }
            BaseKind::Tuple => "dict[str, Any]".to_string(),
            _ => "str".to_string(),
        }
    }
}

/// Property name for a tuple member; unnamed members become `field_<index>`
pub fn tuple_field_name(name: &str, index: usize) -> String {
    if name.trim().is_empty() {
        format!("field_{}", index)
    } else {
        name.to_string()
    }
}
