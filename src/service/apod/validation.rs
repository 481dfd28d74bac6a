use chrono::{Local, NaiveDate};

use super::config::{DATE_FORMAT, FIRST_APOD_DATE};

//--------------------------------------------------------------------------------------------------
// Types: Error
//--------------------------------------------------------------------------------------------------

/// Failures of an APOD operation. `Display` is the text returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApodError {
    #[error("❌ Invalid date format. Use YYYY-MM-DD")]
    InvalidFormat,

    #[error("❌ Date must be between 1995-06-16 and today")]
    BeforeFirstEntry,

    #[error("❌ Date must be between 1995-06-16 and today")]
    InFuture,

    #[error("❌ Unable to fetch today's space photo.")]
    TodayUnavailable,

    #[error("❌ Unable to fetch space photo for {0}")]
    DateUnavailable(String),

    #[error("❌ Unable to fetch random space photo. Please try again.")]
    RandomUnavailable,
}

impl ApodError {
    /// Get the error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ApodError::InvalidFormat => "INVALID_DATE_FORMAT",
            ApodError::BeforeFirstEntry | ApodError::InFuture => "DATE_OUT_OF_RANGE",
            ApodError::TodayUnavailable
            | ApodError::DateUnavailable(_)
            | ApodError::RandomUnavailable => "FETCH_FAILED",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parse `raw` as `YYYY-MM-DD` and check it lies between the first APOD entry and today.
///
/// "Today" is the local calendar date at the moment of the call.
pub fn validate_apod_date(raw: &str) -> Result<NaiveDate, ApodError> {
    validate_apod_date_on(raw, Local::now().date_naive())
}

/// Same as [`validate_apod_date`] with an explicit upper bound.
pub fn validate_apod_date_on(raw: &str, today: NaiveDate) -> Result<NaiveDate, ApodError> {
    if raw.trim() != raw {
        return Err(ApodError::InvalidFormat);
    }

    let date =
        NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ApodError::InvalidFormat)?;

    if date < FIRST_APOD_DATE {
        return Err(ApodError::BeforeFirstEntry);
    }

    if date > today {
        return Err(ApodError::InFuture);
    }

    Ok(date)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ==================== Accepted Dates Tests ====================

    #[test]
    fn test_valid_date_returns_parsed_value() {
        assert_eq!(validate_apod_date("2024-01-15"), Ok(date(2024, 1, 15)));
    }

    #[test]
    fn test_first_apod_date_is_accepted() {
        assert_eq!(validate_apod_date("1995-06-16"), Ok(FIRST_APOD_DATE));
    }

    #[test]
    fn test_today_is_accepted() {
        let today = date(2024, 6, 1);
        assert_eq!(validate_apod_date_on("2024-06-01", today), Ok(today));
    }

    // ==================== Rejected Dates Tests ====================

    #[test]
    fn test_impossible_date_names_format() {
        let err = validate_apod_date("2024-13-40").unwrap_err();
        assert_eq!(err, ApodError::InvalidFormat);
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_wrong_layout_names_format() {
        let err = validate_apod_date("07/04/2020").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        for raw in [" 2024-01-15", "2024-01-15 ", "2024-01-15\n", "\t2024-01-15"] {
            assert_eq!(validate_apod_date(raw), Err(ApodError::InvalidFormat), "{raw:?}");
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(validate_apod_date(""), Err(ApodError::InvalidFormat));
    }

    #[test]
    fn test_before_first_entry_names_lower_bound() {
        let err = validate_apod_date("1990-01-01").unwrap_err();
        assert_eq!(err, ApodError::BeforeFirstEntry);
        assert!(err.to_string().contains("1995-06-16"));
    }

    #[test]
    fn test_day_before_first_entry_rejected() {
        assert_eq!(
            validate_apod_date("1995-06-15"),
            Err(ApodError::BeforeFirstEntry)
        );
    }

    #[test]
    fn test_tomorrow_names_upper_bound() {
        let tomorrow = Local::now().date_naive() + Duration::days(1);
        let err = validate_apod_date(&tomorrow.format(DATE_FORMAT).to_string()).unwrap_err();

        assert_eq!(err, ApodError::InFuture);
        assert!(err.to_string().contains("today"));
    }

    #[test]
    fn test_upper_bound_follows_given_today() {
        let today = date(2024, 6, 1);
        assert_eq!(
            validate_apod_date_on("2024-06-02", today),
            Err(ApodError::InFuture)
        );
    }

    // ==================== Error Code Tests ====================

    #[test]
    fn test_error_codes() {
        assert_eq!(ApodError::InvalidFormat.code(), "INVALID_DATE_FORMAT");
        assert_eq!(ApodError::InFuture.code(), "DATE_OUT_OF_RANGE");
        assert_eq!(ApodError::RandomUnavailable.code(), "FETCH_FAILED");
    }

    #[test]
    fn test_fetch_messages() {
        assert_eq!(
            ApodError::DateUnavailable("2024-01-15".into()).to_string(),
            "❌ Unable to fetch space photo for 2024-01-15"
        );
        assert_eq!(
            ApodError::TodayUnavailable.to_string(),
            "❌ Unable to fetch today's space photo."
        );
    }
}
