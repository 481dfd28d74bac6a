//! Contracts every API service plugin is built from.
//!
//! A service composes one [`ApiClient`], one [`Formatter`] and its own input
//! validation, then exposes itself through [`ServicePlugin`] so the
//! [`ServiceRegistry`] can wire it onto the dispatch surface.

pub mod apod;
mod client;
pub mod code_guardian;
mod registry;

use crate::dispatch::{DispatchError, Dispatcher};

pub use client::{ApiClient, ClientConfig, ClientError, DEFAULT_TIMEOUT};
pub use registry::ServiceRegistry;

pub(crate) use client::{http_client, json_object};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Rendering hints accepted by every [`Formatter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Text placed above the body, followed by a blank line.
    pub header: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Pure conversion of fetched data into display text.
///
/// Implementations perform no I/O and return identical output for identical input.
pub trait Formatter<T: ?Sized>: Send + Sync {
    fn format(&self, data: &T, options: &FormatOptions) -> String;
}

/// A self-contained service that registers its tools and resources onto a dispatcher.
pub trait ServicePlugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Register this service's tools and resources. Called once per process.
    fn register(&self, dispatcher: &mut Dispatcher) -> Result<(), DispatchError>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FormatOptions {
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
        }
    }

    /// The header, if one was given and it is not empty.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref().filter(|h| !h.is_empty())
    }

    /// Push the header and its trailing blank line onto `parts`.
    pub(crate) fn write_header(&self, parts: &mut Vec<String>) {
        if let Some(header) = self.header() {
            parts.push(header.to_string());
            parts.push(String::new());
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
