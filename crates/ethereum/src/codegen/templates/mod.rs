//! Template system for MCP server code generation
//!
//! Contains Handlebars templates for the generated Python server files and the
//! per-tool / per-resource code blocks.

use handlebars::Handlebars;

use abimcp_common::{Error, Result};

pub const SERVER_PY: &str = "server_py";
pub const CONFIG_PY: &str = "config_py";
pub const README_MD: &str = "readme_md";
pub const REQUIREMENTS_TXT: &str = "requirements_txt";
pub const ENV_EXAMPLE: &str = "env_example";
pub const TOOL_READ: &str = "tool_read";
pub const TOOL_WRITE: &str = "tool_write";
pub const RESOURCE: &str = "resource";
pub const UTILITY_TOOLS: &str = "utility_tools";

const TEMPLATES: &[(&str, &str)] = &[
    (SERVER_PY, include_str!("server_py.hbs")),
    (CONFIG_PY, include_str!("config_py.hbs")),
    (README_MD, include_str!("readme_md.hbs")),
    (REQUIREMENTS_TXT, include_str!("requirements_txt.hbs")),
    (ENV_EXAMPLE, include_str!("env_example.hbs")),
    (TOOL_READ, include_str!("tool_read.hbs")),
    (TOOL_WRITE, include_str!("tool_write.hbs")),
    (RESOURCE, include_str!("resource.hbs")),
    (UTILITY_TOOLS, include_str!("utility_tools.hbs")),
];

/// Template manager for MCP server code generation
pub struct TemplateManager {
    handlebars: Handlebars<'static>,
}

impl TemplateManager {
    /// Create a new template manager and register all templates
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        // Output is Python and Markdown, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        Self::register_templates(&mut handlebars)?;

        Ok(Self { handlebars })
    }

    /// Register all built-in templates
    fn register_templates(handlebars: &mut Handlebars) -> Result<()> {
        for (name, source) in TEMPLATES {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| Error::template(format!("Failed to register {} template: {}", name, e)))?;
        }
        Ok(())
    }

    /// Render a template with the given data
    pub fn render(&self, template_name: &str, data: &serde_json::Value) -> Result<String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| Error::template(format!("Failed to render template {}: {}", template_name, e)))
    }

    /// Get list of available templates
    pub fn available_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlebars.get_templates().keys().cloned().collect();
        names.sort();
        names
    }
}
