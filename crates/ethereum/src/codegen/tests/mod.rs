//! Integration tests for MCP server generation

mod integration;
