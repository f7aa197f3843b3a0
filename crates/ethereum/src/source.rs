/// ABI sources: where raw ABI documents come from
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use abimcp_common::{Error, Result};

/// A raw ABI document plus whatever metadata its source knows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedAbi {
    /// Entry array or artifact object, as fetched
    pub abi: Value,
    pub contract_name: Option<String>,
    pub compiler_version: Option<String>,
    pub source_code: Option<String>,
}

/// Trait for ABI providers (local files, verification services, build artifacts)
#[async_trait]
pub trait AbiSource: Send + Sync {
    /// Fetch the ABI identified by `locator`
    async fn fetch(&self, locator: &str) -> Result<FetchedAbi>;
}

/// Reads ABI JSON from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileAbiSource;

impl FileAbiSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AbiSource for FileAbiSource {
    async fn fetch(&self, locator: &str) -> Result<FetchedAbi> {
        let path = Path::new(locator);
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read ABI file {}: {}", path.display(), e)))?;

        let abi: Value = serde_json::from_str(&content)
            .map_err(|e| Error::parse(format!("{} is not valid JSON: {}", path.display(), e)))?;

        let artifact_field = |key: &str| -> Option<String> {
            abi.as_object()
                .and_then(|map| map.get(key))
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(String::from)
        };

        let contract_name = artifact_field("contractName")
            .or_else(|| artifact_field("contract_name"))
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(|stem| stem.trim_end_matches(".abi").to_string())
            });

        let compiler_version = artifact_field("compilerVersion").or_else(|| {
            abi.pointer("/metadata/compiler/version")
                .and_then(|v| v.as_str())
                .map(String::from)
        });
        let source_code = artifact_field("source").or_else(|| artifact_field("sourceCode"));

        debug!(
            path = %path.display(),
            contract_name = ?contract_name,
            "Fetched ABI from file"
        );

        Ok(FetchedAbi {
            abi,
            contract_name,
            compiler_version,
            source_code,
        })
    }
}
