//! MCP server generator
//!
//! Assembles the Python server file set from a parsed ABI and its mapped tools
//! and resources, and writes it to disk.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use abimcp_common::{Error, Result};

use super::config::{ConfigValidator, GenerationRequest, GeneratorConfig};
use super::event_mapper::MappedResource;
use super::function_mapper::{python_literal, MappedTool, ToolType};
use super::naming::sanitize_package_name;
use super::networks;
use super::parser::{AbiEntry, ParsedAbi};
use super::standards::InterfaceStandard;
use super::templates::{CONFIG_PY, ENV_EXAMPLE, README_MD, REQUIREMENTS_TXT, SERVER_PY};
use super::tools::{escape_docstring, render_sections, ToolGenerator};

pub const SERVER_FILE: &str = "server.py";
pub const CONFIG_FILE: &str = "config.py";
pub const ABI_FILE: &str = "abi.json";
pub const README_FILE: &str = "README.md";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Display name used when neither a contract name nor a standard is known
pub const FALLBACK_SERVER_NAME: &str = "Contract";

/// One generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Path relative to the output directory
    pub path: String,
    pub content: String,
    pub executable: bool,
}

/// A generated server: its files plus a summary of what they contain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedServer {
    pub server_name: String,
    pub package_name: String,
    pub contract_address: String,
    pub network: String,
    pub detected_standard: Option<InterfaceStandard>,
    pub files: Vec<GeneratedFile>,
    pub tool_count: usize,
    pub resource_count: usize,
    pub read_tools: Vec<String>,
    pub write_tools: Vec<String>,
    pub events: Vec<String>,
}

impl GeneratedServer {
    /// Look up a file by relative path
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Generates MCP server code from mapped tools and resources
pub struct ServerGenerator {
    config: GeneratorConfig,
    tool_generator: ToolGenerator,
}

impl ServerGenerator {
    /// Create a new generator with the given configuration
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            config,
            tool_generator: ToolGenerator::new()?,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render the full file set
    pub fn generate(
        &self,
        abi: &ParsedAbi,
        tools: &[MappedTool],
        resources: &[MappedResource],
        request: &GenerationRequest,
    ) -> Result<GeneratedServer> {
        request.ensure_valid()?;

        let tools: Vec<&MappedTool> = tools
            .iter()
            .filter(|tool| !(self.config.read_only && tool.tool_type.is_write()))
            .collect();
        let resources: Vec<&MappedResource> = if self.config.include_events {
            resources.iter().collect()
        } else {
            Vec::new()
        };

        let read_tools: Vec<String> = tools
            .iter()
            .filter(|t| t.tool_type == ToolType::Read)
            .map(|t| t.name.clone())
            .collect();
        let write_tools: Vec<String> = tools
            .iter()
            .filter(|t| t.tool_type.is_write())
            .map(|t| t.name.clone())
            .collect();
        let has_write_tools = !write_tools.is_empty();

        let server_name = server_name(abi, request);
        let package_name = sanitize_package_name(&server_name);
        let network = networks::lookup(&request.network);

        debug!(
            server = %server_name,
            network = %request.network,
            known_network = network.is_some(),
            read_only = self.config.read_only,
            "Rendering server files"
        );

        let mut sections = self.tool_generator.tool_sections(tools.iter().copied())?;
        sections.push(self.tool_generator.resource_section(resources.iter().copied())?);
        if self.config.include_utilities {
            let utility_data = json!({
                "server_name_literal": python_literal(&json!(server_name)),
                "standard_literal": python_literal(&json!(abi.detected_standard.map(|s| s.as_str()))),
                "read_tools_literal": python_literal(&json!(read_tools)),
                "write_tools_literal": python_literal(&json!(write_tools)),
            });
            sections.push(self.tool_generator.utility_section(&utility_data)?);
        }

        let templates = self.tool_generator.templates();

        let server_py = templates.render(
            SERVER_PY,
            &json!({
                "server_name_doc": escape_docstring(&server_name),
                "server_name_literal": python_literal(&json!(server_name)),
                "contract_address": request.contract_address,
                "network": request.network,
                "has_write_tools": has_write_tools,
                "has_resources": !resources.is_empty(),
                "sections": render_sections(&sections),
            }),
        )?;

        let config_py = templates.render(
            CONFIG_PY,
            &json!({
                "server_name_doc": escape_docstring(&server_name),
                "network": request.network,
                "contract_address": request.contract_address,
                "known_network": network.is_some(),
                "rpc_url": network.map(|n| n.rpc_url).unwrap_or(""),
                "chain_id": network.map(|n| n.chain_id),
                "explorer_url": network.map(|n| n.explorer_url).unwrap_or(""),
                "has_write_tools": has_write_tools,
            }),
        )?;

        let simulate_default = if self.config.simulation_default { "True" } else { "False" };
        let resource_summaries: Vec<Value> = resources
            .iter()
            .map(|r| json!({"uri_template": r.uri_template, "description": r.description}))
            .collect();

        let readme = templates.render(
            README_MD,
            &json!({
                "server_name": server_name,
                "contract_address": request.contract_address,
                "network_name": network.map(|n| n.name).unwrap_or(request.network.as_str()),
                "standard": abi.detected_standard.map(|s| s.as_str()),
                "has_write_tools": has_write_tools,
                "read_only": self.config.read_only,
                "tool_count": tools.len(),
                "read_tools": tool_summaries(&tools, false),
                "write_tools": tool_summaries(&tools, true),
                "simulate_default": simulate_default,
                "include_utilities": self.config.include_utilities,
                "resources": resource_summaries,
            }),
        )?;

        let requirements = templates.render(REQUIREMENTS_TXT, &json!({}))?;

        let env_example = templates.render(
            ENV_EXAMPLE,
            &json!({
                "server_name": server_name,
                "network": request.network,
                "contract_address": request.contract_address,
                "known_network": network.is_some(),
                "rpc_url": network.map(|n| n.rpc_url).unwrap_or(""),
                "has_write_tools": has_write_tools,
            }),
        )?;

        let abi_json = serde_json::to_string_pretty(&backing_entries(abi, &tools, &resources)?)?;

        let files = vec![
            GeneratedFile {
                path: SERVER_FILE.to_string(),
                content: server_py,
                executable: true,
            },
            GeneratedFile {
                path: CONFIG_FILE.to_string(),
                content: config_py,
                executable: false,
            },
            GeneratedFile {
                path: ABI_FILE.to_string(),
                content: format!("{}\n", abi_json),
                executable: false,
            },
            GeneratedFile {
                path: README_FILE.to_string(),
                content: readme,
                executable: false,
            },
            GeneratedFile {
                path: REQUIREMENTS_FILE.to_string(),
                content: requirements,
                executable: false,
            },
            GeneratedFile {
                path: ENV_EXAMPLE_FILE.to_string(),
                content: env_example,
                executable: false,
            },
        ];

        let server = GeneratedServer {
            server_name,
            package_name,
            contract_address: request.contract_address.clone(),
            network: request.network.clone(),
            detected_standard: abi.detected_standard,
            files,
            tool_count: tools.len(),
            resource_count: resources.len(),
            read_tools,
            write_tools,
            events: resources.iter().map(|r| r.name.clone()).collect(),
        };

        info!(
            server = %server.server_name,
            tools = server.tool_count,
            read_tools = server.read_tools.len(),
            write_tools = server.write_tools.len(),
            resources = server.resource_count,
            standard = ?server.detected_standard,
            "Generated MCP server"
        );

        Ok(server)
    }

    /// Write every file under `output_dir`, creating it if needed
    pub async fn write_to_disk(&self, server: &GeneratedServer, output_dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            Error::io(format!("Failed to create output directory {}: {}", output_dir.display(), e))
        })?;

        let mut written = Vec::with_capacity(server.files.len());
        for file in &server.files {
            let path = output_dir.join(&file.path);
            write_file(&path, &file.content, file.executable).await?;
            debug!(path = %path.display(), bytes = file.content.len(), "Wrote file");
            written.push(path);
        }

        info!(
            dir = %output_dir.display(),
            files = written.len(),
            "Wrote MCP server to disk"
        );

        Ok(written)
    }
}

/// Explicit name, artifact name, detected standard, then the generic fallback
pub fn server_name(abi: &ParsedAbi, request: &GenerationRequest) -> String {
    request
        .contract_name
        .as_deref()
        .or(abi.contract_name.as_deref())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| abi.detected_standard.map(|s| s.display_name().to_string()))
        .unwrap_or_else(|| FALLBACK_SERVER_NAME.to_string())
}

fn tool_summaries(tools: &[&MappedTool], write: bool) -> Vec<Value> {
    tools
        .iter()
        .filter(|t| t.tool_type.is_write() == write)
        .map(|t| json!({"signature": t.signature(), "description": t.description}))
        .collect()
}

/// ABI entries behind the emitted tools and resources, plus custom errors
fn backing_entries(
    abi: &ParsedAbi,
    tools: &[&MappedTool],
    resources: &[&MappedResource],
) -> Result<Vec<Value>> {
    let tool_signatures: BTreeSet<&str> = tools.iter().map(|t| t.solidity_signature.as_str()).collect();
    let event_signatures: BTreeSet<&str> = resources.iter().map(|r| r.signature.as_str()).collect();

    let mut emitted = BTreeSet::new();
    let mut entries = Vec::new();

    for function in &abi.functions {
        let signature = function.signature();
        if tool_signatures.contains(signature.as_str()) && emitted.insert(format!("function {}", signature)) {
            entries.push(serde_json::to_value(AbiEntry::Function(function.clone()))?);
        }
    }
    for event in &abi.events {
        let signature = event.signature();
        if event_signatures.contains(signature.as_str()) && emitted.insert(format!("event {}", signature)) {
            entries.push(serde_json::to_value(AbiEntry::Event(event.clone()))?);
        }
    }
    for error in &abi.errors {
        entries.push(serde_json::to_value(AbiEntry::Error(error.clone()))?);
    }

    Ok(entries)
}

async fn write_file(path: &Path, content: &str, executable: bool) -> Result<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| Error::io(format!("Failed to write file {}: {}", path.display(), e)))?;

    #[cfg(unix)]
    if executable {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| Error::io(format!("Failed to set permissions on {}: {}", path.display(), e)))?;
    }
    #[cfg(not(unix))]
    let _ = executable;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::event_mapper::EventMapper;
    use crate::codegen::function_mapper::FunctionMapper;
    use crate::codegen::parser::AbiParser;

    const ADDRESS: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

    fn token_abi() -> ParsedAbi {
        AbiParser::new()
            .parse_value(&json!([
                {"type": "function", "name": "balanceOf", "stateMutability": "view",
                 "inputs": [{"name": "account", "type": "address"}], "outputs": [{"name": "", "type": "uint256"}]},
                {"type": "function", "name": "transfer", "stateMutability": "nonpayable",
                 "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}],
                 "outputs": [{"name": "", "type": "bool"}]},
                {"type": "event", "name": "Transfer", "inputs": [
                    {"name": "from", "type": "address", "indexed": true},
                    {"name": "to", "type": "address", "indexed": true},
                    {"name": "value", "type": "uint256", "indexed": false}
                ]},
                {"type": "error", "name": "InsufficientBalance", "inputs": [{"name": "needed", "type": "uint256"}]}
            ]))
            .unwrap()
    }

    fn generate(config: GeneratorConfig, request: &GenerationRequest) -> Result<GeneratedServer> {
        let abi = token_abi();
        let tools = FunctionMapper::default().map_functions(&abi.functions);
        let resources = EventMapper::default().map_events(&abi.events);
        ServerGenerator::new(config)?.generate(&abi, &tools, &resources, request)
    }

    #[test]
    fn test_fixed_file_set() {
        let server = generate(GeneratorConfig::default(), &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();
        let paths: Vec<&str> = server.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["server.py", "config.py", "abi.json", "README.md", "requirements.txt", ".env.example"]
        );
        assert!(server.file(SERVER_FILE).unwrap().executable);
        assert_eq!(server.tool_count, 2);
        assert_eq!(server.resource_count, 1);
        assert_eq!(server.read_tools, vec!["balance_of"]);
        assert_eq!(server.write_tools, vec!["transfer"]);
        assert_eq!(server.events, vec!["transfer"]);
    }

    #[test]
    fn test_server_py_contents() {
        let server = generate(GeneratorConfig::default(), &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();
        let code = &server.file(SERVER_FILE).unwrap().content;

        assert!(code.starts_with("#!/usr/bin/env python3"));
        assert!(code.contains("mcp = FastMCP(\"Contract\")"));
        assert!(code.contains("# READ FUNCTIONS"));
        assert!(code.contains("# WRITE FUNCTIONS"));
        assert!(code.contains("# EVENT RESOURCES"));
        assert!(code.contains("# UTILITY TOOLS"));
        assert!(code.contains("def _send_transaction("));
        assert!(code.contains("SIGNER = Account.from_key"));
        assert!(code.contains("def get_block_number() -> dict:"));
        assert!(code.contains("mcp.run()"));
    }

    #[test]
    fn test_config_and_env_for_known_network() {
        let server = generate(GeneratorConfig::default(), &GenerationRequest::new(ADDRESS, "sepolia")).unwrap();
        let config_py = &server.file(CONFIG_FILE).unwrap().content;
        assert!(config_py.contains("NETWORK = os.getenv(\"NETWORK\", \"sepolia\")"));
        assert!(config_py.contains("11155111"));
        assert!(config_py.contains("PRIVATE_KEY"));

        let env = &server.file(ENV_EXAMPLE_FILE).unwrap().content;
        assert!(env.contains(&format!("CONTRACT_ADDRESS={}", ADDRESS)));
        assert!(env.contains("PRIVATE_KEY="));
    }

    #[test]
    fn test_unknown_network_requires_rpc_url() {
        let server = generate(GeneratorConfig::default(), &GenerationRequest::new(ADDRESS, "my-devnet")).unwrap();
        let config_py = &server.file(CONFIG_FILE).unwrap().content;
        assert!(config_py.contains("RPC_URL must be set for network 'my-devnet'"));
    }

    #[test]
    fn test_read_only_excludes_write_paths() {
        let config = GeneratorConfig {
            read_only: true,
            ..Default::default()
        };
        let server = generate(config, &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();

        assert!(server.write_tools.is_empty());
        assert_eq!(server.tool_count, 1);
        for file in &server.files {
            assert!(!file.content.contains("def transfer("), "{} has write tool", file.path);
            assert!(!file.content.contains("transfer(address,uint256)"), "{} has write tool", file.path);
            assert!(!file.content.contains("_send_transaction"), "{} has write helper", file.path);
            assert!(!file.content.contains("PRIVATE_KEY"), "{} asks for a key", file.path);
        }
    }

    #[test]
    fn test_events_and_utilities_can_be_disabled() {
        let config = GeneratorConfig {
            include_events: false,
            include_utilities: false,
            ..Default::default()
        };
        let server = generate(config, &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();

        assert_eq!(server.resource_count, 0);
        assert!(server.events.is_empty());
        let code = &server.file(SERVER_FILE).unwrap().content;
        assert!(!code.contains("EVENT RESOURCES"));
        assert!(!code.contains("def _block_id("));
        assert!(!code.contains("get_contract_info"));
        assert!(!server.file(README_FILE).unwrap().content.contains("Utility Tools"));
    }

    #[test]
    fn test_abi_json_holds_backing_entries() {
        let config = GeneratorConfig {
            read_only: true,
            ..Default::default()
        };
        let server = generate(config, &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();
        let entries: Vec<Value> = serde_json::from_str(&server.file(ABI_FILE).unwrap().content).unwrap();

        let names: Vec<&str> = entries.iter().filter_map(|e| e["name"].as_str()).collect();
        assert_eq!(names, vec!["balanceOf", "Transfer", "InsufficientBalance"]);
    }

    #[test]
    fn test_readme_groups_tools() {
        let server = generate(GeneratorConfig::default(), &GenerationRequest::new(ADDRESS, "mainnet")).unwrap();
        let readme = &server.file(README_FILE).unwrap().content;

        let read = readme.find("### Read Tools").unwrap();
        let write = readme.find("### Write Tools").unwrap();
        assert!(read < write);
        assert!(readme.contains("`balance_of(account: str) -> dict`"));
        assert!(readme.contains("Ethereum Mainnet"));
        assert!(readme.contains("events://transfer/{from_block}/{to_block}"));
    }

    #[test]
    fn test_server_name_priority() {
        let mut abi = token_abi();
        let request = GenerationRequest::new(ADDRESS, "mainnet");
        assert_eq!(server_name(&abi, &request), FALLBACK_SERVER_NAME);

        abi.detected_standard = Some(InterfaceStandard::Erc20);
        assert_eq!(server_name(&abi, &request), "ERC20 Token");

        abi.contract_name = Some("MyToken".to_string());
        assert_eq!(server_name(&abi, &request), "MyToken");

        let request = request.with_contract_name("Dai Stablecoin");
        assert_eq!(server_name(&abi, &request), "Dai Stablecoin");
    }

    #[test]
    fn test_invalid_request_is_a_config_error() {
        let err = generate(GeneratorConfig::default(), &GenerationRequest::new("0x12", "mainnet")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let request = GenerationRequest::new(ADDRESS, "mainnet").with_contract_name("Token");
        let first = generate(GeneratorConfig::default(), &request).unwrap();
        let second = generate(GeneratorConfig::default(), &request).unwrap();
        assert_eq!(first, second);
    }
}
