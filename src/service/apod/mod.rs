//! NASA Astronomy Picture of the Day service.
//!
//! Registers three tools and one resource:
//!
//! - `get_todays_space_photo`: today's entry
//! - `get_space_photo_by_date`: the entry for a `YYYY-MM-DD` date
//! - `get_random_space_photo`: an entry for a random archive date
//! - `space://events/famous-dates`: curated dates worth looking up

mod client;
pub mod config;
mod formatter;
mod validation;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::dispatch::{DispatchError, Dispatcher, JsonObject, NoParams};
use crate::service::{ApiClient, ClientConfig, FormatOptions, Formatter, ServicePlugin};

pub use client::ApodClient;
pub use formatter::ApodFormatter;
pub use validation::{ApodError, validate_apod_date, validate_apod_date_on};

use self::config::{DATE_FORMAT, FIRST_APOD_DATE};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// URI of the famous-dates resource.
pub const FAMOUS_DATES_URI: &str = "space://events/famous-dates";

/// Header placed above a random entry.
pub const RANDOM_PHOTO_HEADER: &str = "🎲 **Random Space Photo Discovery!**";

const FAMOUS_DATES: &str = "
Famous Space Dates to Explore:

🚀 First APOD: 1995-06-16
🌙 Moon Landing: 1969-07-20
🛸 Hubble Launch: 1990-04-24
🔴 Mars Rover Landing: 2021-02-18
🌟 First Image of Black Hole: 2019-04-10
🪐 Cassini Saturn Arrival: 2004-07-01
☄️ Rosetta Comet Landing: 2014-11-12
🛰️ Voyager 1 Jupiter Flyby: 1979-03-05
🌍 Earth Day: 1970-04-22
🔭 James Webb First Image: 2022-07-12
";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Input for `get_space_photo_by_date`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PhotoByDateInput {
    /// Date in YYYY-MM-DD format, between 1995-06-16 and today.
    pub date: String,
}

/// APOD service plugin.
///
/// Owns one client and one formatter. Clones share them.
pub struct ApodService<C = ApodClient, F = ApodFormatter> {
    inner: Arc<ApodTools<C, F>>,
}

struct ApodTools<C, F> {
    client: C,
    formatter: F,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ApodService {
    /// Build the service from `NASA_API_KEY` and `NASA_APOD_BASE_URL`.
    pub fn from_env() -> Self {
        Self::with_config(config::client_config_from_env())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_parts(ApodClient::new(config), ApodFormatter)
    }
}

impl<C, F> ApodService<C, F>
where
    C: ApiClient + 'static,
    F: Formatter<JsonObject> + 'static,
{
    pub fn with_parts(client: C, formatter: F) -> Self {
        Self {
            inner: Arc::new(ApodTools { client, formatter }),
        }
    }

    /// Today's entry.
    pub async fn todays_photo(&self) -> String {
        self.inner
            .todays_photo()
            .await
            .unwrap_or_else(|e| e.to_string())
    }

    /// The entry for `date` (`YYYY-MM-DD`).
    pub async fn photo_by_date(&self, date: &str) -> String {
        self.inner
            .photo_by_date(date)
            .await
            .unwrap_or_else(|e| e.to_string())
    }

    /// An entry for a random date between the first entry and today.
    pub async fn random_photo(&self) -> String {
        self.inner
            .random_photo()
            .await
            .unwrap_or_else(|e| e.to_string())
    }
}

impl<C, F> ApodTools<C, F>
where
    C: ApiClient,
    F: Formatter<JsonObject>,
{
    async fn todays_photo(&self) -> Result<String, ApodError> {
        let data = self
            .client
            .fetch(&[])
            .await
            .ok_or(ApodError::TodayUnavailable)?;
        Ok(self.formatter.format(&data, &FormatOptions::default()))
    }

    async fn photo_by_date(&self, date: &str) -> Result<String, ApodError> {
        let parsed = validate_apod_date(date)?;
        let query = parsed.format(DATE_FORMAT).to_string();

        let data = self
            .client
            .fetch(&[("date", query.as_str())])
            .await
            .ok_or_else(|| ApodError::DateUnavailable(date.to_string()))?;
        Ok(self.formatter.format(&data, &FormatOptions::default()))
    }

    async fn random_photo(&self) -> Result<String, ApodError> {
        let date = random_apod_date(Local::now().date_naive())
            .format(DATE_FORMAT)
            .to_string();
        tracing::debug!(%date, "Picked random APOD date");

        let data = self
            .client
            .fetch(&[("date", date.as_str())])
            .await
            .ok_or(ApodError::RandomUnavailable)?;
        Ok(self
            .formatter
            .format(&data, &FormatOptions::with_header(RANDOM_PHOTO_HEADER)))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<C, F> Clone for ApodService<C, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, F> ServicePlugin for ApodService<C, F>
where
    C: ApiClient + 'static,
    F: Formatter<JsonObject> + 'static,
{
    fn name(&self) -> &'static str {
        "apod"
    }

    fn register(&self, dispatcher: &mut Dispatcher) -> Result<(), DispatchError> {
        let service = self.clone();
        dispatcher.add_tool(
            "get_todays_space_photo",
            "Get today's Astronomy Picture of the Day from NASA.",
            move |_: NoParams| {
                let service = service.clone();
                async move { service.todays_photo().await }
            },
        )?;

        let service = self.clone();
        dispatcher.add_tool(
            "get_space_photo_by_date",
            "Get the Astronomy Picture of the Day for a specific date (YYYY-MM-DD).",
            move |input: PhotoByDateInput| {
                let service = service.clone();
                async move { service.photo_by_date(&input.date).await }
            },
        )?;

        let service = self.clone();
        dispatcher.add_tool(
            "get_random_space_photo",
            "Get a random Astronomy Picture of the Day from NASA's archives.",
            move |_: NoParams| {
                let service = service.clone();
                async move { service.random_photo().await }
            },
        )?;

        dispatcher.add_resource(
            FAMOUS_DATES_URI,
            "famous_space_dates",
            "List of famous space exploration dates to explore in APOD archives.",
            || FAMOUS_DATES.to_string(),
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Uniformly random date in `[FIRST_APOD_DATE, today]`.
///
/// Returns the first entry date when `today` precedes it.
pub fn random_apod_date(today: NaiveDate) -> NaiveDate {
    let span = (today - FIRST_APOD_DATE).num_days();
    if span <= 0 {
        return FIRST_APOD_DATE;
    }

    let offset = rand::rng().random_range(0..=span);
    FIRST_APOD_DATE + chrono::Duration::days(offset)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
