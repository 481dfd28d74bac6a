//! Server-wide configuration.
//!
//! Service-specific settings (API keys, base URLs, timeouts) live in each
//! service's own `config` module.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Name the server reports in logs.
pub const SERVER_NAME: &str = "mcp-factory";

/// Instructions sent to clients during initialization.
pub const SERVER_INSTRUCTIONS: &str = "Tools backed by external APIs. \
APOD tools return NASA's Astronomy Picture of the Day; Code Guardian tools scan a local \
directory for secrets, security antipatterns, quality issues and vulnerable dependencies. \
Every tool replies with display-ready markdown text.";
