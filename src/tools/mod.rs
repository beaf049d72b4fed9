//! Tool catalog and dispatch
//!
//! Each tool declares its input schema and turns a validated parameter set
//! into one or more gateway calls. The catalog validates arguments against
//! the schema before any handler runs, and converts gateway failures into
//! error results the agent can read.

mod evidence;
mod management;
mod ml;
pub mod params;
mod pipeline;
mod reporting;
pub mod schema;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::client::GatewayApi;
use crate::protocol::{Tool, ToolAnnotations};
use crate::{Error, Result};

/// Text produced by one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Bounded text for the agent
    pub text: String,
    /// Whether the invocation failed
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Failed result
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Opaque invocation context; only used to correlate logs
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// JSON-RPC request id, rendered
    pub invocation_id: Option<String>,
    /// MCP session id, when the client sent one
    pub session_id: Option<String>,
}

/// One callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and input schema
    fn definition(&self) -> Tool;

    /// What failed, phrased for the agent (`"Evidence search failed"`)
    fn failure_context(&self) -> &'static str;

    /// Run the tool with arguments that already passed schema validation
    async fn call(&self, gateway: &dyn GatewayApi, args: Value) -> Result<ToolOutput>;
}

struct Registered {
    tool: Tool,
    handler: Box<dyn ToolHandler>,
}

/// Registered tools, in registration order
pub struct ToolCatalog {
    entries: Vec<Registered>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Every OrcheSight tool
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for handler in evidence::tools()
            .into_iter()
            .chain(management::tools())
            .chain(ml::tools())
            .chain(pipeline::tools())
            .chain(reporting::tools())
        {
            catalog.register(handler);
        }
        catalog
    }

    /// Add a tool; a later registration under the same name replaces the earlier one
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) {
        let tool = handler.definition();
        if let Some(&pos) = self.index.get(&tool.name) {
            warn!(tool = %tool.name, "Replacing previously registered tool");
            self.entries[pos] = Registered { tool, handler };
        } else {
            self.index.insert(tool.name.clone(), self.entries.len());
            self.entries.push(Registered { tool, handler });
        }
    }

    /// Tool definitions for `tools/list`
    #[must_use]
    pub fn definitions(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.tool.clone()).collect()
    }

    /// Definition of one tool
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.entries[i].tool)
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and run one tool.
    ///
    /// Unknown tools and invalid arguments are errors (no gateway call is
    /// made). Gateway failures become an error [`ToolOutput`].
    #[instrument(skip_all, fields(tool = %name, invocation = ?ctx.invocation_id, session = ?ctx.session_id))]
    pub async fn invoke(
        &self,
        gateway: &dyn GatewayApi,
        name: &str,
        arguments: Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let validated = schema::validate(&arguments, &entry.tool.input_schema);
        if !validated.is_valid() {
            debug!(violations = validated.violations.len(), "Rejected tool arguments");
            return Err(Error::Validation(
                validated.format_error(&entry.tool.input_schema),
            ));
        }

        debug!("Dispatching tool call");
        match entry.handler.call(gateway, validated.value).await {
            Err(Error::Gateway(e)) => Ok(ToolOutput::error(format!(
                "Error: {}: {e}",
                entry.handler.failure_context()
            ))),
            other => other,
        }
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize validated arguments into a tool's parameter struct
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| Error::Validation(format!("Invalid arguments: {e}")))
}

/// Tool definition with the common shape
pub(crate) fn definition(
    name: &str,
    title: &str,
    description: &str,
    input_schema: Value,
    annotations: ToolAnnotations,
) -> Tool {
    Tool {
        name: name.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        input_schema,
        annotations: Some(annotations),
    }
}

/// JSON schema fragment for the priority scale
pub(crate) fn priority_schema(description: &str, default: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "enum": ["LOW", "MEDIUM", "HIGH", "CRITICAL"],
        "default": default,
        "description": description
    })
}
