//! APOD-specific configuration.

use std::time::Duration;

use chrono::NaiveDate;
use url::Url;

use crate::service::ClientConfig;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Base URL for the NASA APOD REST API.
pub const NASA_APOD_BASE_URL: &str = "https://api.nasa.gov/planetary/apod";

/// Environment variable holding the NASA API key.
pub const NASA_API_KEY_ENV: &str = "NASA_API_KEY";

/// Environment variable overriding the APOD endpoint.
pub const NASA_APOD_BASE_URL_ENV: &str = "NASA_APOD_BASE_URL";

/// Key used when none is configured. Limited to 30 requests/hour and 50/day per IP.
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";

/// Date of the very first Astronomy Picture of the Day.
pub const FIRST_APOD_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("invalid first APOD date"),
};

/// [`FIRST_APOD_DATE`] as shown in messages.
pub const FIRST_APOD_DATE_STR: &str = "1995-06-16";

/// Expected date format for APOD queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Request timeout for APOD calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Load the APOD client configuration from environment variables.
pub fn client_config_from_env() -> ClientConfig {
    client_config(
        std::env::var(NASA_API_KEY_ENV).ok(),
        std::env::var(NASA_APOD_BASE_URL_ENV).ok(),
    )
}

/// Build the APOD client configuration, falling back to defaults for absent values.
pub fn client_config(api_key: Option<String>, base_url: Option<String>) -> ClientConfig {
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

    let base_url = base_url
        .and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Ignoring invalid {}={:?}: {}", NASA_APOD_BASE_URL_ENV, raw, e);
                None
            }
        })
        .unwrap_or_else(default_base_url);

    ClientConfig::new(base_url, api_key).with_timeout(REQUEST_TIMEOUT)
}

fn default_base_url() -> Url {
    Url::parse(NASA_APOD_BASE_URL).expect("valid APOD base URL")
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
