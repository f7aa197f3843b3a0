//! Maps ABI functions to MCP tool descriptions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use super::naming::{canonical_identifier, unique_name};
use super::parser::{AbiFunction, AbiParameter};
use super::types::{TypeMapper, TypeParser, UNSIGNED_DIGITS_PATTERN};

/// Tool names used by the generated utility tools
pub const UTILITY_TOOL_NAMES: &[&str] = &["get_contract_info", "get_native_balance", "get_block_number"];

/// Names `server.py` binds at module scope; a tool named after one would rebind it
pub const MODULE_SCOPE_NAMES: &[&str] = &[
    "config",
    "json",
    "mcp",
    "_abi_file",
    "_int_bits",
    "_to_abi",
    "_to_json",
    "_simulate_transaction",
    "_send_transaction",
    "_block_id",
];

/// Names the generated tool bodies use as locals or helpers
const GENERATED_LOCALS: &[&str] = &[
    "_fn",
    "_result",
    "_tx",
    "_to_abi",
    "_to_json",
    "_simulate_transaction",
    "_send_transaction",
];

pub const SIMULATE_PARAM: &str = "simulate";
pub const GAS_LIMIT_PARAM: &str = "gas_limit";
pub const VALUE_PARAM: &str = "value_wei";

/// How a tool interacts with the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    Read,
    Write,
    WritePayable,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Read => "read",
            ToolType::Write => "write",
            ToolType::WritePayable => "write_payable",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, ToolType::Read)
    }
}

/// Origin of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Passed through to the contract call
    Contract,
    /// Native currency attached to a payable call
    Value,
    /// Optional gas limit for transactions
    GasLimit,
    /// Toggle between dry-run and broadcast
    Simulate,
}

/// One parameter of a generated tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Python identifier
    pub name: String,
    /// Name in the ABI (may be empty)
    pub original_name: String,
    /// Canonical Solidity type, empty for non-contract parameters
    pub solidity_type: String,
    /// JSON Schema used for validation
    pub schema: Value,
    /// Python type hint
    pub target_type: String,
    pub description: String,
    pub required: bool,
    /// Default value for optional parameters
    pub default: Option<Value>,
    pub kind: ParameterKind,
    /// Argument conversion spec, null for non-contract parameters
    pub abi_spec: Value,
}

impl ToolParameter {
    /// `name: type` or `name: type = default`
    pub fn python_declaration(&self) -> String {
        match &self.default {
            Some(default) => format!("{}: {} = {}", self.name, self.target_type, python_literal(default)),
            None => format!("{}: {}", self.name, self.target_type),
        }
    }
}

/// A contract function mapped to a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedTool {
    /// Tool name (Python function name)
    pub name: String,
    /// Function name in the ABI
    pub original_name: String,
    pub description: String,
    pub tool_type: ToolType,
    /// Contract parameters followed by value, gas and simulate parameters
    pub parameters: Vec<ToolParameter>,
    pub return_schema: Value,
    /// Output types in Solidity notation
    pub return_description: String,
    /// Keys of the result object when the function has several outputs
    pub output_names: Vec<String>,
    /// Result conversion spec, null when the function returns nothing
    pub return_spec: Value,
    /// Canonical Solidity signature, e.g. `transfer(address,uint256)`
    pub solidity_signature: String,
    /// 4-byte selector
    pub selector: String,
}

impl MappedTool {
    /// Python signature, e.g. `balance_of(account: str) -> dict`
    pub fn signature(&self) -> String {
        let declarations: Vec<String> = self
            .parameters
            .iter()
            .map(ToolParameter::python_declaration)
            .collect();
        format!("{}({}) -> dict", self.name, declarations.join(", "))
    }

    /// Parameters forwarded to the contract call
    pub fn contract_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Contract)
    }

    /// Whether the tool carries a parameter named `name`
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    /// JSON Schema for the whole argument object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(param.name.clone(), param.schema.clone());
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Maps ABI functions to tools
#[derive(Debug, Clone)]
pub struct FunctionMapper {
    type_mapper: TypeMapper,
    simulation_default: bool,
}

impl FunctionMapper {
    pub fn new(type_mapper: TypeMapper, simulation_default: bool) -> Self {
        Self {
            type_mapper,
            simulation_default,
        }
    }

    /// Map one function; the tool name is derived from the function name alone
    pub fn map_function(&self, function: &AbiFunction) -> MappedTool {
        let tool_type = classify(function);
        let name = canonical_identifier(&function.name);

        // `simulate` stays reserved on read tools so only write tools ever carry it
        let mut taken: BTreeSet<String> = GENERATED_LOCALS.iter().map(|s| s.to_string()).collect();
        taken.insert(SIMULATE_PARAM.to_string());
        if tool_type.is_write() {
            taken.insert(GAS_LIMIT_PARAM.to_string());
        }
        if tool_type == ToolType::WritePayable {
            taken.insert(VALUE_PARAM.to_string());
        }

        let mut parameters: Vec<ToolParameter> = function
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| self.map_input(index, input, &mut taken))
            .collect();

        if tool_type == ToolType::WritePayable {
            parameters.push(value_parameter());
        }
        if tool_type.is_write() {
            parameters.push(gas_limit_parameter());
            parameters.push(self.simulate_parameter());
        }

        let (return_schema, output_names) = self.return_schema(&function.outputs);
        let return_spec = return_spec(&function.outputs, &output_names);

        let tool = MappedTool {
            name,
            original_name: function.name.clone(),
            description: describe(function, tool_type),
            tool_type,
            parameters,
            return_schema,
            return_description: describe_outputs(&function.outputs),
            output_names,
            return_spec,
            solidity_signature: function.signature(),
            selector: function.selector(),
        };

        debug!(
            tool = %tool.name,
            tool_type = tool.tool_type.as_str(),
            signature = %tool.solidity_signature,
            "Mapped function to tool"
        );

        tool
    }

    /// Map every function, giving overloads and clashes with generated names `_2`, `_3`, ... suffixes
    pub fn map_functions(&self, functions: &[AbiFunction]) -> Vec<MappedTool> {
        let mut taken: BTreeSet<String> = UTILITY_TOOL_NAMES
            .iter()
            .chain(MODULE_SCOPE_NAMES)
            .map(|s| s.to_string())
            .collect();

        functions
            .iter()
            .map(|function| {
                let mut tool = self.map_function(function);
                tool.name = next_free_name(&tool.name, &mut taken);
                tool
            })
            .collect()
    }

    fn map_input(&self, index: usize, input: &AbiParameter, taken: &mut BTreeSet<String>) -> ToolParameter {
        let base = if input.name.trim().is_empty() {
            format!("arg_{}", index)
        } else {
            canonical_identifier(&input.name)
        };
        let name = unique_name(&base, taken);

        let descriptor = TypeParser::parse_parameter(input);
        let solidity_type = descriptor.canonical();
        let description = if input.name.trim().is_empty() {
            format!("Positional argument {} ({})", index, solidity_type)
        } else {
            format!("{} ({})", input.name, solidity_type)
        };

        ToolParameter {
            schema: self
                .type_mapper
                .to_json_schema(&descriptor, Some(&name), Some(&description)),
            target_type: self.type_mapper.to_target_type(&descriptor),
            name,
            original_name: input.name.clone(),
            solidity_type,
            description,
            required: true,
            default: None,
            kind: ParameterKind::Contract,
            abi_spec: descriptor.abi_spec(),
        }
    }

    fn simulate_parameter(&self) -> ToolParameter {
        let description = "Simulate the transaction without broadcasting it".to_string();
        ToolParameter {
            name: SIMULATE_PARAM.to_string(),
            original_name: String::new(),
            solidity_type: String::new(),
            schema: json!({
                "type": "boolean",
                "default": self.simulation_default,
                "description": description,
            }),
            target_type: "bool".to_string(),
            description,
            required: false,
            default: Some(json!(self.simulation_default)),
            kind: ParameterKind::Simulate,
            abi_spec: Value::Null,
        }
    }

    fn return_schema(&self, outputs: &[AbiParameter]) -> (Value, Vec<String>) {
        match outputs {
            [] => (json!({"type": "null"}), Vec::new()),
            [single] => {
                let descriptor = TypeParser::parse_parameter(single);
                (self.type_mapper.to_json_schema(&descriptor, None, None), Vec::new())
            }
            many => {
                let mut taken = BTreeSet::new();
                let mut properties = Map::new();
                let mut names = Vec::with_capacity(many.len());

                for (index, output) in many.iter().enumerate() {
                    let base = if output.name.trim().is_empty() {
                        format!("output_{}", index)
                    } else {
                        canonical_identifier(&output.name)
                    };
                    let name = unique_name(&base, &mut taken);
                    let descriptor = TypeParser::parse_parameter(output);
                    properties.insert(
                        name.clone(),
                        self.type_mapper.to_json_schema(&descriptor, None, None),
                    );
                    names.push(name);
                }

                let schema = json!({
                    "type": "object",
                    "properties": properties,
                    "required": names,
                });
                (schema, names)
            }
        }
    }
}

impl Default for FunctionMapper {
    fn default() -> Self {
        Self::new(TypeMapper::default(), true)
    }
}

/// `pure`/`view` -> read, `payable` -> write_payable, otherwise write
pub fn classify(function: &AbiFunction) -> ToolType {
    if function.is_read_only() {
        ToolType::Read
    } else if function.is_payable() {
        ToolType::WritePayable
    } else {
        ToolType::Write
    }
}

fn value_parameter() -> ToolParameter {
    let description = "Amount of native currency to send, in wei".to_string();
    ToolParameter {
        name: VALUE_PARAM.to_string(),
        original_name: String::new(),
        solidity_type: String::new(),
        schema: json!({
            "type": "string",
            "pattern": UNSIGNED_DIGITS_PATTERN,
            "default": "0",
            "description": description,
        }),
        target_type: "str".to_string(),
        description,
        required: false,
        default: Some(json!("0")),
        kind: ParameterKind::Value,
        abi_spec: Value::Null,
    }
}

fn gas_limit_parameter() -> ToolParameter {
    let description = "Gas limit for the transaction; estimated when omitted".to_string();
    ToolParameter {
        name: GAS_LIMIT_PARAM.to_string(),
        original_name: String::new(),
        solidity_type: String::new(),
        schema: json!({
            "type": ["integer", "null"],
            "minimum": 0,
            "default": null,
            "description": description,
        }),
        target_type: "Optional[int]".to_string(),
        description,
        required: false,
        default: Some(Value::Null),
        kind: ParameterKind::GasLimit,
        abi_spec: Value::Null,
    }
}

fn return_spec(outputs: &[AbiParameter], output_names: &[String]) -> Value {
    match outputs {
        [] => Value::Null,
        [single] => TypeParser::parse_parameter(single).abi_spec(),
        many => {
            let members: Vec<Value> = many
                .iter()
                .zip(output_names)
                .map(|(output, name)| json!([name, TypeParser::parse_parameter(output).abi_spec()]))
                .collect();
            json!({ "tuple": members })
        }
    }
}

fn describe(function: &AbiFunction, tool_type: ToolType) -> String {
    let signature = function.signature();
    match tool_type {
        ToolType::Read => format!(
            "Call {} on the contract. Read-only: does not modify state and costs no gas.",
            signature
        ),
        ToolType::Write => format!(
            "Execute {} on the contract. Modifies contract state and costs gas.",
            signature
        ),
        ToolType::WritePayable => format!(
            "Execute {} on the contract. Modifies contract state and costs gas. \
             WARNING: this function can transfer native currency (value_wei) to the contract.",
            signature
        ),
    }
}

fn describe_outputs(outputs: &[AbiParameter]) -> String {
    if outputs.is_empty() {
        return "nothing".to_string();
    }
    let parts: Vec<String> = outputs
        .iter()
        .map(|output| {
            let canonical = output.canonical_type();
            if output.name.is_empty() {
                canonical
            } else {
                format!("{} {}", canonical, output.name)
            }
        })
        .collect();
    if parts.len() == 1 {
        parts.into_iter().collect()
    } else {
        format!("({})", parts.join(", "))
    }
}

/// `base`, then `base_2`, `base_3`, ...
fn next_free_name(base: &str, taken: &mut BTreeSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}_{}", base, counter);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Render a JSON value as a Python literal
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
