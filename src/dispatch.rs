//! In-process dispatch surface that plugins register their tools and resources onto.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::ErrorData as McpError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

//--------------------------------------------------------------------------------------------------
// Types: Error
//--------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Resource already registered: {0}")]
    DuplicateResource(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl DispatchError {
    /// Get the error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::DuplicateTool(_) => "DUPLICATE_TOOL",
            DispatchError::DuplicateResource(_) => "DUPLICATE_RESOURCE",
            DispatchError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            DispatchError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            DispatchError::InvalidArguments { .. } => "INVALID_ARGUMENTS",
        }
    }

    /// Convert to MCP error with structured data.
    pub fn to_mcp_error(&self) -> McpError {
        let data = Some(json!({ "code": self.code() }));
        match self {
            DispatchError::ResourceNotFound(_) => {
                McpError::resource_not_found(self.to_string(), data)
            }
            _ => McpError::invalid_params(self.to_string(), data),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Types: Handlers
//--------------------------------------------------------------------------------------------------

/// JSON object carried as tool arguments and fetch results.
pub type JsonObject = serde_json::Map<String, Value>;

/// Boxed future produced by a tool handler. Always resolves to display text.
pub type ToolFuture = Pin<Box<dyn Future<Output = String> + Send>>;

type ToolHandler = Arc<dyn Fn(JsonObject) -> Result<ToolFuture, DispatchError> + Send + Sync>;

type ResourceHandler = Arc<dyn Fn() -> String + Send + Sync>;

/// Parameter type for tools that take no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Public description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
}

/// Public description of a registered resource.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
}

struct ToolEntry {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

struct ResourceEntry {
    descriptor: ResourceDescriptor,
    handler: ResourceHandler,
}

/// Ordered collection of named operations and addressable resources.
///
/// Populated once during bootstrap, then only read while serving.
#[derive(Default)]
pub struct Dispatcher {
    tools: Vec<ToolEntry>,
    resources: Vec<ResourceEntry>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation whose arguments decode into `P`.
    ///
    /// The advertised input schema is generated from `P`.
    pub fn add_tool<P, F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        if self.has_tool(name) {
            return Err(DispatchError::DuplicateTool(name.to_string()));
        }

        let tool_name = name.to_string();
        let handler: ToolHandler = Arc::new(move |arguments: JsonObject| {
            let params: P = serde_json::from_value(Value::Object(arguments)).map_err(|e| {
                DispatchError::InvalidArguments {
                    tool: tool_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Box::pin(handler(params)) as ToolFuture)
        });

        self.tools.push(ToolEntry {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: Arc::new(input_schema_for::<P>()),
            },
            handler,
        });

        tracing::debug!(tool = name, "Registered tool");
        Ok(())
    }

    /// Register a parameterless, read-only text resource under `uri`.
    pub fn add_resource<F>(
        &mut self,
        uri: &str,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        if self.resources.iter().any(|r| r.descriptor.uri == uri) {
            return Err(DispatchError::DuplicateResource(uri.to_string()));
        }

        self.resources.push(ResourceEntry {
            descriptor: ResourceDescriptor {
                uri: uri.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            },
            handler: Arc::new(handler),
        });

        tracing::debug!(resource = uri, "Registered resource");
        Ok(())
    }

    /// Whether an operation named `name` is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.descriptor.name == name)
    }

    /// Registered tools in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    /// Registered resources in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter().map(|r| &r.descriptor)
    }

    /// Invoke the operation `name` with JSON `arguments`.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<String, DispatchError> {
        let entry = self
            .tools
            .iter()
            .find(|t| t.descriptor.name == name)
            .ok_or_else(|| DispatchError::ToolNotFound(name.to_string()))?;

        let future = (entry.handler)(arguments.unwrap_or_default())?;
        Ok(future.await)
    }

    /// Read the resource addressed by `uri`.
    pub fn read(&self, uri: &str) -> Result<String, DispatchError> {
        self.resources
            .iter()
            .find(|r| r.descriptor.uri == uri)
            .map(|r| (r.handler)())
            .ok_or_else(|| DispatchError::ResourceNotFound(uri.to_string()))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Generate the JSON schema object advertised for a parameter type.
fn input_schema_for<P: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(P);
    match serde_json::to_value(&schema) {
        Ok(Value::Object(mut map)) => {
            map.entry("type").or_insert_with(|| json!("object"));
            map
        }
        _ => {
            let mut map = JsonObject::new();
            map.insert("type".to_string(), json!("object"));
            map
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
