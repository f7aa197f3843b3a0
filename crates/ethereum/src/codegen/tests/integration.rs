//! Integration tests for Ethereum ABI to MCP server generation

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use abimcp_common::{Error, Result};

use crate::codegen::{
    generate_server, generate_server_from_file, generate_server_from_value, render_server, AbiParser,
    GenerationRequest, GeneratorConfig, InterfaceStandard, ServerGenerator, ToolType,
    TypeMapperConfig,
};
use crate::source::{AbiSource, FileAbiSource};

const TOKEN_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// ERC20 ABI in the shape emitted by solc
const ERC20_ABI: &str = r#"[
  {
    "type": "constructor",
    "inputs": [
      {"name": "_name", "type": "string", "internalType": "string"},
      {"name": "_symbol", "type": "string", "internalType": "string"}
    ],
    "stateMutability": "nonpayable"
  },
  {"type": "function", "name": "name", "inputs": [], "outputs": [{"name": "", "type": "string"}], "stateMutability": "view"},
  {"type": "function", "name": "symbol", "inputs": [], "outputs": [{"name": "", "type": "string"}], "stateMutability": "view"},
  {"type": "function", "name": "decimals", "inputs": [], "outputs": [{"name": "", "type": "uint8"}], "stateMutability": "view"},
  {"type": "function", "name": "totalSupply", "inputs": [], "outputs": [{"name": "", "type": "uint256"}], "stateMutability": "view"},
  {
    "type": "function",
    "name": "balanceOf",
    "inputs": [{"name": "account", "type": "address", "internalType": "address"}],
    "outputs": [{"name": "", "type": "uint256", "internalType": "uint256"}],
    "stateMutability": "view"
  },
  {
    "type": "function",
    "name": "transfer",
    "inputs": [
      {"name": "to", "type": "address"},
      {"name": "amount", "type": "uint256"}
    ],
    "outputs": [{"name": "", "type": "bool"}],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "allowance",
    "inputs": [
      {"name": "owner", "type": "address"},
      {"name": "spender", "type": "address"}
    ],
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view"
  },
  {
    "type": "function",
    "name": "approve",
    "inputs": [
      {"name": "spender", "type": "address"},
      {"name": "amount", "type": "uint256"}
    ],
    "outputs": [{"name": "", "type": "bool"}],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "transferFrom",
    "inputs": [
      {"name": "from", "type": "address"},
      {"name": "to", "type": "address"},
      {"name": "amount", "type": "uint256"}
    ],
    "outputs": [{"name": "", "type": "bool"}],
    "stateMutability": "nonpayable"
  },
  {
    "type": "event",
    "name": "Transfer",
    "inputs": [
      {"name": "from", "type": "address", "indexed": true},
      {"name": "to", "type": "address", "indexed": true},
      {"name": "value", "type": "uint256", "indexed": false}
    ],
    "anonymous": false
  },
  {
    "type": "event",
    "name": "Approval",
    "inputs": [
      {"name": "owner", "type": "address", "indexed": true},
      {"name": "spender", "type": "address", "indexed": true},
      {"name": "value", "type": "uint256", "indexed": false}
    ],
    "anonymous": false
  }
]"#;

fn erc20() -> Value {
    serde_json::from_str(ERC20_ABI).unwrap()
}

fn mainnet_request() -> GenerationRequest {
    GenerationRequest::new(TOKEN_ADDRESS, "mainnet")
}

#[tokio::test]
async fn test_end_to_end_erc20_generation() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let abi_path = temp_dir.path().join("erc20.json");
    fs::write(&abi_path, ERC20_ABI).unwrap();
    let output_dir = temp_dir.path().join("server");

    let server = generate_server_from_file(
        abi_path.to_str().unwrap(),
        &GeneratorConfig::default(),
        &mainnet_request(),
        &output_dir,
    )
    .await?;

    assert_eq!(server.server_name, "ERC20 Token");
    assert_eq!(server.detected_standard, Some(InterfaceStandard::Erc20));
    assert_eq!(server.tool_count, 9, "Every function should become a tool");
    assert_eq!(server.resource_count, 2, "Every event should become a resource");
    assert_eq!(server.write_tools, vec!["transfer", "approve", "transfer_from"]);

    for file in ["server.py", "config.py", "abi.json", "README.md", "requirements.txt", ".env.example"] {
        assert!(output_dir.join(file).exists(), "{} should be written", file);
    }

    let server_py = fs::read_to_string(output_dir.join("server.py")).unwrap();
    assert!(server_py.contains("def balance_of(account: str) -> dict:"));
    assert!(server_py.contains("def transfer_from(from_: str, to: str, amount: str"));
    assert!(server_py.contains("_to_abi(from_, \"address\")"));
    assert!(server_py.contains("get_function_by_signature(\"transferFrom(address,address,uint256)\")"));
    assert!(server_py.contains("def get_approval_events(from_block: str, to_block: str) -> str:"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(output_dir.join("server.py")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755, "server.py should be executable");
    }

    println!("✅ End-to-end ERC20 generation test passed");
    Ok(())
}

#[tokio::test]
async fn test_balance_of_tool_shape() -> Result<()> {
    let abi = AbiParser::new().parse_value(&erc20())?;
    let server = generate_server(&abi, &GeneratorConfig::default(), &mainnet_request(), TypeMapperConfig::default())?;

    let readme = &server.file("README.md").unwrap().content;
    assert!(readme.contains("`balance_of(account: str) -> dict`"));
    assert!(readme.contains("`total_supply() -> dict`"));

    let function = abi.function("balanceOf").unwrap();
    assert!(function.is_read_only());
    assert_eq!(function.selector(), "0x70a08231");

    println!("✅ balanceOf tool shape test passed");
    Ok(())
}

#[tokio::test]
async fn test_artifact_contract_name() -> Result<()> {
    let artifact = json!({
        "contractName": "MyToken",
        "abi": erc20(),
        "bytecode": "0x6080"
    });

    let server = generate_server_from_value(&artifact, &GeneratorConfig::default(), &mainnet_request())?;
    assert_eq!(server.server_name, "MyToken");
    assert_eq!(server.package_name, "my_token");
    assert!(server.file("server.py").unwrap().content.contains("FastMCP(\"MyToken\")"));

    let renamed = generate_server_from_value(
        &artifact,
        &GeneratorConfig::default(),
        &mainnet_request().with_contract_name("USD Coin"),
    )?;
    assert_eq!(renamed.server_name, "USD Coin");

    println!("✅ Artifact contract name test passed");
    Ok(())
}

#[tokio::test]
async fn test_document_level_errors_are_fatal() -> Result<()> {
    let config = GeneratorConfig::default();

    let err = generate_server_from_value(&json!({"bytecode": "0x"}), &config, &mainnet_request()).unwrap_err();
    assert!(err.is_parse());
    assert!(err.to_string().contains("ABI must be an array or contain an 'abi' key"));

    let err = generate_server_from_value(&json!([]), &config, &mainnet_request()).unwrap_err();
    assert!(err.is_parse());

    let err = AbiParser::new().parse_content("[{\"type\": \"function\"").unwrap_err();
    assert!(err.is_parse());

    println!("✅ Document-level error test passed");
    Ok(())
}

#[tokio::test]
async fn test_entry_level_problems_are_warnings() -> Result<()> {
    let abi = json!([
        {"type": "function", "inputs": [], "outputs": [], "stateMutability": "view"},
        {"type": "function", "name": "weird", "inputs": [{"name": "x", "type": "uint7x"}],
         "outputs": [], "stateMutability": "view"},
        {"type": "function", "name": "owner", "inputs": [], "outputs": [{"name": "", "type": "address"}],
         "stateMutability": "view"}
    ]);

    let parsed = AbiParser::new().parse_value(&abi)?;
    assert_eq!(parsed.functions.len(), 2, "The nameless entry should be skipped");
    assert_eq!(parsed.warnings.len(), 2);

    let server = generate_server(&parsed, &GeneratorConfig::default(), &mainnet_request(), TypeMapperConfig::default())?;
    assert_eq!(server.read_tools, vec!["weird", "owner"]);

    println!("✅ Entry-level warning test passed");
    Ok(())
}

#[tokio::test]
async fn test_transfer_event_resource() -> Result<()> {
    let server = generate_server_from_value(&erc20(), &GeneratorConfig::default(), &mainnet_request())?;
    let server_py = &server.file("server.py").unwrap().content;

    assert_eq!(server.events, vec!["transfer", "approval"]);
    assert!(server_py.contains("@mcp.resource(\"events://transfer/{from_block}/{to_block}\")"));
    assert!(server_py.contains("def get_transfer_events(from_block: str, to_block: str) -> str:"));
    assert!(server_py.contains("\"from_\": _to_json(_args[\"from\"], \"address\")"));

    let parsed = AbiParser::new().parse_value(&erc20())?;
    let transfer = parsed.event("Transfer").unwrap();
    assert_eq!(transfer.indexed_inputs().len(), 2);
    assert_eq!(
        transfer.topic().as_deref(),
        Some("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
    );

    println!("✅ Transfer event resource test passed");
    Ok(())
}

#[tokio::test]
async fn test_read_only_server() -> Result<()> {
    let config = GeneratorConfig {
        read_only: true,
        ..Default::default()
    };
    let server = generate_server_from_value(&erc20(), &config, &mainnet_request())?;

    assert_eq!(server.tool_count, 6);
    assert!(server.write_tools.is_empty());

    let server_py = &server.file("server.py").unwrap().content;
    assert!(!server_py.contains("WRITE FUNCTIONS"));
    assert!(!server_py.contains("def approve("));

    let abi_json: Vec<Value> = serde_json::from_str(&server.file("abi.json").unwrap().content)?;
    assert!(abi_json.iter().all(|entry| entry["stateMutability"] != "nonpayable"));

    println!("✅ Read-only server test passed");
    Ok(())
}

#[tokio::test]
async fn test_payable_and_overloaded_functions() -> Result<()> {
    let abi = json!([
        {"type": "function", "name": "deposit", "inputs": [], "outputs": [], "stateMutability": "payable"},
        {"type": "function", "name": "deposit", "inputs": [{"name": "receiver", "type": "address"}],
         "outputs": [], "stateMutability": "payable"},
        {"type": "function", "name": "setConfig", "stateMutability": "nonpayable", "outputs": [],
         "inputs": [{"name": "config", "type": "tuple", "internalType": "struct Vault.Config", "components": [
             {"name": "fee", "type": "uint16"},
             {"name": "recipients", "type": "address[]"}
         ]}]},
        {"type": "receive", "stateMutability": "payable"}
    ]);

    let parsed = AbiParser::new().parse_value(&abi)?;
    assert!(parsed.has_receive);
    assert_eq!(parsed.payable_functions().len(), 2);

    let server = generate_server(&parsed, &GeneratorConfig::default(), &mainnet_request(), TypeMapperConfig::default())?;
    assert_eq!(server.write_tools, vec!["deposit", "deposit_2", "set_config"]);

    let server_py = &server.file("server.py").unwrap().content;
    assert!(server_py.contains("get_function_by_signature(\"deposit(address)\")"));
    assert!(server_py.contains("value_wei: str = \"0\""));
    assert!(server_py.contains("setConfig((uint16,address[]))"));

    println!("✅ Payable and overloaded function test passed");
    Ok(())
}

#[tokio::test]
async fn test_tool_types_follow_mutability() -> Result<()> {
    let parsed = AbiParser::new().parse_value(&erc20())?;
    let tools = crate::codegen::FunctionMapper::default().map_functions(&parsed.functions);

    let transfer = tools.iter().find(|t| t.name == "transfer").unwrap();
    assert_eq!(transfer.tool_type, ToolType::Write);
    assert!(transfer.has_parameter("simulate"));
    assert!(transfer.has_parameter("gas_limit"));
    assert!(!transfer.has_parameter("value_wei"));

    let schema = transfer.input_schema();
    assert_eq!(schema["required"], json!(["to", "amount"]));

    println!("✅ Tool type classification test passed");
    Ok(())
}

#[tokio::test]
async fn test_generation_is_deterministic() -> Result<()> {
    let first = generate_server_from_value(&erc20(), &GeneratorConfig::default(), &mainnet_request())?;
    let second = generate_server_from_value(&erc20(), &GeneratorConfig::default(), &mainnet_request())?;
    assert_eq!(first, second);

    println!("✅ Deterministic generation test passed");
    Ok(())
}

#[tokio::test]
async fn test_write_to_disk_overwrites_existing_files() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("nested").join("server");

    let server = generate_server_from_value(&erc20(), &GeneratorConfig::default(), &mainnet_request())?;
    let generator = ServerGenerator::new(GeneratorConfig::default())?;

    let written = generator.write_to_disk(&server, &output_dir).await?;
    assert_eq!(written.len(), 6);

    fs::write(output_dir.join("README.md"), "stale").unwrap();
    generator.write_to_disk(&server, &output_dir).await?;
    let readme = fs::read_to_string(output_dir.join("README.md")).unwrap();
    assert_eq!(readme, server.file("README.md").unwrap().content);

    println!("✅ Write to disk test passed");
    Ok(())
}

#[tokio::test]
async fn test_file_source_feeds_pipeline() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let abi_path = temp_dir.path().join("Token.json");
    fs::write(&abi_path, json!({"contract_name": "Token", "abi": erc20()}).to_string()).unwrap();

    let fetched = FileAbiSource::new().fetch(abi_path.to_str().unwrap()).await?;
    assert_eq!(fetched.contract_name.as_deref(), Some("Token"));

    let server = generate_server_from_value(&fetched.abi, &GeneratorConfig::default(), &mainnet_request())?;
    assert_eq!(server.server_name, "Token");

    let missing = FileAbiSource::new()
        .fetch(temp_dir.path().join("missing.json").to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(missing, Error::Io(_)));

    println!("✅ File source test passed");
    Ok(())
}

#[tokio::test]
async fn test_contract_names_do_not_shadow_server_globals() -> Result<()> {
    let abi = AbiParser::new().parse_value(&json!([
        {"type": "function", "name": "config", "stateMutability": "view", "inputs": [],
         "outputs": [{"name": "", "type": "address"}]},
        {"type": "function", "name": "pause", "stateMutability": "nonpayable", "inputs": [], "outputs": []}
    ]))?;

    let generator = ServerGenerator::new(GeneratorConfig::default())?;
    let server = render_server(&generator, &abi, &mainnet_request(), TypeMapperConfig::default())?;
    let server_py = &server.file("server.py").unwrap().content;

    assert_eq!(server.read_tools, vec!["config_2"]);
    assert!(server_py.contains("import config\n"));
    assert!(server_py.contains("def config_2() -> dict:"));
    assert!(!server_py.contains("def config("));
    assert!(server_py.contains("get_function_by_signature(\"config()\")"));

    println!("✅ Server globals shadowing test passed");
    Ok(())
}
