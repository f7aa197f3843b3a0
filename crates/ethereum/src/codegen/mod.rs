//! Code generation of MCP servers for Ethereum contracts
//!
//! This module turns a contract ABI JSON document into a Python MCP server
//! exposing each contract function as a tool and each event as a resource.

pub mod config;
pub mod event_mapper;
pub mod function_mapper;
pub mod generator;
pub mod naming;
pub mod networks;
pub mod parser;
pub mod standards;
pub mod templates;
pub mod tools;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{ConfigValidator, GenerationRequest, GeneratorConfig, ValidationError};
pub use event_mapper::{EventMapper, MappedResource};
pub use function_mapper::{FunctionMapper, MappedTool, ToolType};
pub use generator::{GeneratedFile, GeneratedServer, ServerGenerator};
pub use parser::{AbiParser, AbiWarning, ParsedAbi};
pub use standards::InterfaceStandard;
pub use types::{TypeDescriptor, TypeMapper, TypeMapperConfig, TypeParser};

use std::path::Path;

use abimcp_common::Result;

use crate::source::{AbiSource, FileAbiSource};

/// Map an already parsed ABI and render the server
pub fn generate_server(
    abi: &ParsedAbi,
    config: &GeneratorConfig,
    request: &GenerationRequest,
    type_config: TypeMapperConfig,
) -> Result<GeneratedServer> {
    let generator = ServerGenerator::new(config.clone())?;
    render_server(&generator, abi, request, type_config)
}

/// Run the mappers and render the server with an existing generator
pub fn render_server(
    generator: &ServerGenerator,
    abi: &ParsedAbi,
    request: &GenerationRequest,
    type_config: TypeMapperConfig,
) -> Result<GeneratedServer> {
    let type_mapper = TypeMapper::new(type_config);
    let tools = FunctionMapper::new(type_mapper.clone(), generator.config().simulation_default)
        .map_functions(&abi.functions);
    let resources = EventMapper::new(type_mapper).map_events(&abi.events);

    generator.generate(abi, &tools, &resources, request)
}

/// Parse a raw ABI value (entry array or artifact) and render the server
pub fn generate_server_from_value(
    abi: &serde_json::Value,
    config: &GeneratorConfig,
    request: &GenerationRequest,
) -> Result<GeneratedServer> {
    let parsed = AbiParser::new().parse_value(abi)?;
    generate_server(&parsed, config, request, TypeMapperConfig::default())
}

/// Main entry point: read an ABI file, generate the server and write it out
pub async fn generate_server_from_file(
    abi_file_path: &str,
    config: &GeneratorConfig,
    request: &GenerationRequest,
    output_dir: &Path,
) -> Result<GeneratedServer> {
    let fetched = FileAbiSource::new().fetch(abi_file_path).await?;
    let parsed = AbiParser::new().parse_value(&fetched.abi)?;

    let generator = ServerGenerator::new(config.clone())?;
    let server = render_server(&generator, &parsed, request, TypeMapperConfig::default())?;
    generator.write_to_disk(&server, output_dir).await?;

    Ok(server)
}
