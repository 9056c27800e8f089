use std::fmt;

use time::format_description;
use time::macros::format_description as calendar_format;
use time::{Date, OffsetDateTime};

use crate::error::ConfigError;

/// `YYYYMMDD`, sortable by name.
pub const DEFAULT_DATE_FORMAT: &str = "[year][month][day]";

/// `DDMMYY`, the layout of trees produced by earlier tooling.
pub const LEGACY_DATE_FORMAT: &str = "[day][month][year repr:last_two]";

/// Directory name that namespaces one day's run below each server folder.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DateStamp(String);

impl DateStamp {
    /// Uses `value` verbatim. It must be a single path component.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.is_empty()
            || value == "."
            || value == ".."
            || value.contains(['/', '\\'])
        {
            return Err(ConfigError::invalid(
                "date stamp",
                format!("'{value}' is not a single path component"),
            ));
        }
        Ok(Self(value))
    }

    /// Formats the current local date. Falls back to UTC when the local
    /// offset cannot be determined.
    pub fn today(format: &str) -> Result<Self, ConfigError> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|error| {
            tracing::warn!(
                target: logging::targets::ROOT,
                "local time zone unavailable ({error}); dating the run in UTC"
            );
            OffsetDateTime::now_utc()
        });
        Self::for_date(format, now)
    }

    /// Formats `date` with a `time` format description.
    pub fn for_date(format: &str, date: OffsetDateTime) -> Result<Self, ConfigError> {
        let date_format_error = |reason: String| ConfigError::DateFormat {
            format: format.to_owned(),
            reason,
        };
        let items = format_description::parse_owned::<2>(format)
            .map_err(|error| date_format_error(error.to_string()))?;
        let rendered = date
            .format(&items)
            .map_err(|error| date_format_error(error.to_string()))?;
        Self::new(rendered)
    }

    /// Formats a `YYYY-MM-DD` calendar date, e.g. to re-run a past day.
    pub fn for_calendar_date(format: &str, date: &str) -> Result<Self, ConfigError> {
        let parsed = Date::parse(date, calendar_format!("[year]-[month]-[day]"))
            .map_err(|error| ConfigError::invalid("date", format!("'{date}': {error}")))?;
        Self::for_date(format, parsed.midnight().assume_utc())
    }

    /// The stamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that `format` parses and renders a usable directory name.
pub fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    DateStamp::for_date(format, OffsetDateTime::UNIX_EPOCH).map(drop)
}
