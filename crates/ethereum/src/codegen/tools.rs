//! Per-tool and per-resource code rendering
//!
//! Every tool renders into its own [`CodeBlock`]; blocks are grouped into
//! [`CodeSection`]s that carry a banner and disappear when empty.

use serde_json::{json, Value};

use abimcp_common::Result;

use super::event_mapper::{MappedResource, ResourceField};
use super::function_mapper::{python_literal, MappedTool, ParameterKind, ToolType};
use super::templates::{TemplateManager, RESOURCE, TOOL_READ, TOOL_WRITE, UTILITY_TOOLS};

pub const READ_SECTION: &str = "READ FUNCTIONS";
pub const WRITE_SECTION: &str = "WRITE FUNCTIONS";
pub const RESOURCE_SECTION: &str = "EVENT RESOURCES";
pub const UTILITY_SECTION: &str = "UTILITY TOOLS";

const BANNER_RULE: &str =
    "# =============================================================================";

/// A self-contained unit of generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Python name the block defines
    pub name: String,
    pub body: String,
}

/// Blocks under one banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSection {
    pub title: String,
    pub blocks: Vec<CodeBlock>,
}

impl CodeSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: CodeBlock) {
        self.blocks.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Banner followed by the blocks; `None` when the section has no blocks
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut out = format!("{}\n# {}\n{}\n", BANNER_RULE, self.title, BANNER_RULE);
        for block in &self.blocks {
            out.push_str("\n\n");
            out.push_str(block.body.trim_end());
            out.push('\n');
        }
        Some(out)
    }
}

/// Render sections in order, skipping empty ones
pub fn render_sections(sections: &[CodeSection]) -> String {
    sections
        .iter()
        .filter_map(CodeSection::render)
        .map(|section| format!("\n\n{}", section))
        .collect()
}

/// Renders tools and resources into code blocks
pub struct ToolGenerator {
    templates: TemplateManager,
}

impl ToolGenerator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            templates: TemplateManager::new()?,
        })
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    /// Render one tool: a direct call for reads, simulate/execute branches for writes
    pub fn render_tool(&self, tool: &MappedTool) -> Result<CodeBlock> {
        let call_args: Vec<String> = tool
            .contract_parameters()
            .map(|p| format!("_to_abi({}, {})", p.name, python_literal(&p.abi_spec)))
            .collect();

        let value_expr = if tool.tool_type == ToolType::WritePayable {
            "int(value_wei)"
        } else {
            "0"
        };

        let data = json!({
            "signature": tool.signature(),
            "docstring": tool_docstring(tool),
            "solidity_signature": tool.solidity_signature,
            "call_args": call_args.join(", "),
            "original_name": tool.original_name,
            "return_spec": python_literal(&tool.return_spec),
            "value_expr": value_expr,
        });

        let template = if tool.tool_type.is_write() { TOOL_WRITE } else { TOOL_READ };
        Ok(CodeBlock {
            name: tool.name.clone(),
            body: self.templates.render(template, &data)?,
        })
    }

    /// Render one event resource
    pub fn render_resource(&self, resource: &MappedResource) -> Result<CodeBlock> {
        let data = json!({
            "uri_template": resource.uri_template,
            "function_name": resource.function_name,
            "docstring": escape_docstring(&resource.description),
            "original_name": resource.original_name,
            "args_expr": args_expression(&resource.fields),
        });

        Ok(CodeBlock {
            name: resource.function_name.clone(),
            body: self.templates.render(RESOURCE, &data)?,
        })
    }

    /// Read and write sections, in ABI order within each
    pub fn tool_sections<'a, I>(&self, tools: I) -> Result<Vec<CodeSection>>
    where
        I: IntoIterator<Item = &'a MappedTool>,
    {
        let mut read = CodeSection::new(READ_SECTION);
        let mut write = CodeSection::new(WRITE_SECTION);

        for tool in tools {
            let block = self.render_tool(tool)?;
            if tool.tool_type.is_write() {
                write.push(block);
            } else {
                read.push(block);
            }
        }

        Ok(vec![read, write])
    }

    pub fn resource_section<'a, I>(&self, resources: I) -> Result<CodeSection>
    where
        I: IntoIterator<Item = &'a MappedResource>,
    {
        let mut section = CodeSection::new(RESOURCE_SECTION);
        for resource in resources {
            section.push(self.render_resource(resource)?);
        }
        Ok(section)
    }

    /// Helper tools that do not come from the ABI
    pub fn utility_section(&self, data: &Value) -> Result<CodeSection> {
        let mut section = CodeSection::new(UTILITY_SECTION);
        section.push(CodeBlock {
            name: "utility_tools".to_string(),
            body: self.templates.render(UTILITY_TOOLS, data)?,
        });
        Ok(section)
    }
}

/// Escape text for a triple-quoted Python docstring
pub fn escape_docstring(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    if escaped.ends_with('"') {
        format!("{} ", escaped)
    } else {
        escaped
    }
}

fn tool_docstring(tool: &MappedTool) -> String {
    let mut doc = escape_docstring(&tool.description);

    if !tool.parameters.is_empty() {
        doc.push_str("\n\n    Args:");
        for param in &tool.parameters {
            let description = match param.kind {
                ParameterKind::Contract => param.description.clone(),
                _ => format!("{} (optional)", param.description),
            };
            doc.push_str(&format!("\n        {}: {}", param.name, escape_docstring(&description)));
        }
    }

    doc.push_str("\n\n    Returns:\n        ");
    doc.push_str(&escape_docstring(&tool.return_description));
    doc.push_str("\n    ");
    doc
}

/// Python dict literal mapping decoded log args to field names
fn args_expression(fields: &[ResourceField]) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let entries: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let source = if field.original_name.is_empty() {
                format!("list(_args.values())[{}]", index)
            } else {
                format!("_args[{}]", python_literal(&json!(field.original_name)))
            };
            format!(
                "{}: _to_json({}, {})",
                python_literal(&json!(field.name)),
                source,
                python_literal(&field.abi_spec)
            )
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}
