use serde_json::Value;

use crate::dispatch::JsonObject;
use crate::service::{FormatOptions, Formatter};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const UNTITLED: &str = "Untitled";
const UNKNOWN_DATE: &str = "Unknown date";
const NO_EXPLANATION: &str = "No explanation available.";
const UNKNOWN_MEDIA: &str = "Unknown";
const NO_URL: &str = "No URL provided";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Renders an APOD entry as Markdown.
///
/// Missing fields render as placeholders, so formatting never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApodFormatter;

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Formatter<JsonObject> for ApodFormatter {
    fn format(&self, data: &JsonObject, options: &FormatOptions) -> String {
        let mut parts = Vec::new();
        options.write_header(&mut parts);

        parts.push(format!("🌌 **{}**", field(data, "title").unwrap_or_else(|| UNTITLED.into())));
        parts.push(format!(
            "📅 Date: {}",
            field(data, "date").unwrap_or_else(|| UNKNOWN_DATE.into())
        ));
        parts.push(String::new());
        parts.push("**What you're seeing:**".to_string());
        parts.push(field(data, "explanation").unwrap_or_else(|| NO_EXPLANATION.into()));
        parts.push(String::new());
        parts.push(format!(
            "**Media:** {}",
            field(data, "media_type")
                .map(|m| title_case(&m))
                .unwrap_or_else(|| UNKNOWN_MEDIA.into())
        ));
        parts.push(format!("🔗 {}", field(data, "url").unwrap_or_else(|| NO_URL.into())));

        if let Some(copyright) = field(data, "copyright") {
            parts.push(format!("\n📸 Copyright: {}", copyright.trim()));
        }

        parts.join("\n")
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Text of `key`, or `None` when absent or null. Non-string values use their JSON form.
fn field(data: &JsonObject, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Uppercase the first letter of each word and lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
