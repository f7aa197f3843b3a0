//! Ethereum ABI to MCP server generation

pub mod codegen;
pub mod source;

pub use codegen::{
    generate_server, generate_server_from_file, generate_server_from_value, AbiParser,
    GeneratedServer, GenerationRequest, GeneratorConfig, ParsedAbi, ServerGenerator,
};
pub use source::{AbiSource, FetchedAbi, FileAbiSource};
