//! Maps ABI events to MCP resource descriptions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

use super::naming::{canonical_identifier, unique_name};
use super::parser::AbiEvent;
use super::types::{TypeMapper, TypeParser};

/// URI scheme for event resources
pub const EVENT_URI_SCHEME: &str = "events://";

/// One event input exposed by a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceField {
    pub name: String,
    pub original_name: String,
    pub solidity_type: String,
    pub schema: Value,
    pub target_type: String,
    pub indexed: bool,
    /// Result conversion spec for the generated code
    pub abi_spec: Value,
}

/// A contract event mapped to a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedResource {
    /// snake_case event name
    pub name: String,
    /// Event name in the ABI
    pub original_name: String,
    pub description: String,
    /// e.g. `events://transfer/{from_block}/{to_block}`
    pub uri_template: String,
    pub fields: Vec<ResourceField>,
    /// Python function serving the resource
    pub function_name: String,
    pub anonymous: bool,
    /// Canonical event signature
    pub signature: String,
    /// Topic hash, absent for anonymous events
    pub topic: Option<String>,
}

impl MappedResource {
    pub fn indexed_fields(&self) -> impl Iterator<Item = &ResourceField> {
        self.fields.iter().filter(|f| f.indexed)
    }

    pub fn data_fields(&self) -> impl Iterator<Item = &ResourceField> {
        self.fields.iter().filter(|f| !f.indexed)
    }

    /// Schema of one decoded log entry
    pub fn fields_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.schema.clone());
        }
        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

/// Maps ABI events to resources
#[derive(Debug, Clone, Default)]
pub struct EventMapper {
    type_mapper: TypeMapper,
}

impl EventMapper {
    pub fn new(type_mapper: TypeMapper) -> Self {
        Self { type_mapper }
    }

    /// Map one event; names derive from the event name alone
    pub fn map_event(&self, event: &AbiEvent) -> MappedResource {
        let name = canonical_identifier(&event.name);
        self.build(event, name)
    }

    /// Map every event, suffixing overloaded names with `_2`, `_3`, ...
    pub fn map_events(&self, events: &[AbiEvent]) -> Vec<MappedResource> {
        let mut taken: BTreeSet<String> = BTreeSet::new();
        events
            .iter()
            .map(|event| {
                let base = canonical_identifier(&event.name);
                let mut name = base.clone();
                let mut counter = 2;
                while !taken.insert(name.clone()) {
                    name = format!("{}_{}", base, counter);
                    counter += 1;
                }
                self.build(event, name)
            })
            .collect()
    }

    fn build(&self, event: &AbiEvent, name: String) -> MappedResource {
        let mut taken = BTreeSet::new();
        let fields: Vec<ResourceField> = event
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let base = if input.name.trim().is_empty() {
                    format!("arg_{}", index)
                } else {
                    canonical_identifier(&input.name)
                };
                let field_name = unique_name(&base, &mut taken);
                let descriptor = TypeParser::parse_parameter(input);
                ResourceField {
                    schema: self.type_mapper.to_json_schema(&descriptor, None, None),
                    target_type: self.type_mapper.to_target_type(&descriptor),
                    solidity_type: descriptor.canonical(),
                    abi_spec: descriptor.abi_spec(),
                    name: field_name,
                    original_name: input.name.clone(),
                    indexed: input.indexed,
                }
            })
            .collect();

        let resource = MappedResource {
            description: describe(event, &fields),
            uri_template: format!("{}{}/{{from_block}}/{{to_block}}", EVENT_URI_SCHEME, name),
            function_name: format!("get_{}_events", name),
            original_name: event.name.clone(),
            anonymous: event.anonymous,
            signature: event.signature(),
            topic: event.topic(),
            fields,
            name,
        };

        debug!(
            resource = %resource.name,
            uri = %resource.uri_template,
            anonymous = resource.anonymous,
            "Mapped event to resource"
        );

        resource
    }
}

fn describe(event: &AbiEvent, fields: &[ResourceField]) -> String {
    let list = |indexed: bool| -> String {
        let names: Vec<&str> = fields
            .iter()
            .filter(|f| f.indexed == indexed)
            .map(|f| f.name.as_str())
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    };

    let mut description = format!(
        "{} events emitted by the contract between two blocks. Indexed fields: {}. Data fields: {}.",
        event.name,
        list(true),
        list(false)
    );
    if event.anonymous {
        description.push_str(" Anonymous event: logs carry no signature topic.");
    }
    description
}
