//! Plugin-based MCP server.
//!
//! Each external API is wrapped by a [`ServicePlugin`] that pairs an
//! [`ApiClient`] with a [`Formatter`] and registers its tools and resources on a
//! [`Dispatcher`]. The [`ServiceRegistry`] applies every plugin at startup and
//! [`Server`] serves the result over MCP.

pub mod config;
pub mod dispatch;
pub mod server;
pub mod service;

pub use dispatch::{DispatchError, Dispatcher, JsonObject};
pub use server::Server;
pub use service::apod::ApodService;
pub use service::code_guardian::CodeGuardianService;
pub use service::{
    ApiClient, ClientConfig, FormatOptions, Formatter, ServicePlugin, ServiceRegistry,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The registry of every built-in service, in registration order.
pub fn build_registry() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.add(ApodService::from_env());
    registry.add(CodeGuardianService::new());
    registry
}

/// Apply `registry` to a fresh dispatcher.
pub fn build_dispatcher(registry: &ServiceRegistry) -> Result<Dispatcher, DispatchError> {
    let mut dispatcher = Dispatcher::new();
    registry.apply_all(&mut dispatcher)?;
    Ok(dispatcher)
}

/// Build the MCP server with every built-in service registered.
pub fn build_server() -> Result<Server, DispatchError> {
    let dispatcher = build_dispatcher(&build_registry())?;
    tracing::info!(
        tools = dispatcher.tools().count(),
        resources = dispatcher.resources().count(),
        "{} ready",
        config::SERVER_NAME
    );
    Ok(Server::new(dispatcher))
}
