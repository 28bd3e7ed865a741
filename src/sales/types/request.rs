//! Request types for the sales endpoints.

use bon::Builder;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde::ser::SerializeStruct as _;

use super::Endpoint;
use crate::error::Error;
use crate::{EpochMillis, Result};

/// Default `chrono` format for [`SalesRequest::date_range`].
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// What a sales request selects: a window of sale dates or one transaction.
///
/// A transaction filter is exclusive; when one is given the date range is not sent at all.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesFilter {
    /// Sales between `start_date` and `end_date`, both in epoch milliseconds.
    DateRange {
        start_date: EpochMillis,
        end_date: EpochMillis,
    },
    /// A single transaction code, e.g. `HP17715690036014`.
    Transaction(String),
}

impl SalesFilter {
    #[must_use]
    pub fn transaction<S: Into<String>>(transaction: S) -> Self {
        Self::Transaction(transaction.into())
    }

    /// Parses both dates with `format` and converts them to epoch milliseconds.
    ///
    /// `format` may be a date-only format (`%Y-%m-%d`), in which case the date is taken at
    /// midnight UTC, or a full date-time format.
    pub fn date_range(start_date: &str, end_date: &str, format: &str) -> Result<Self> {
        Ok(Self::DateRange {
            start_date: to_epoch_millis(start_date, format)?,
            end_date: to_epoch_millis(end_date, format)?,
        })
    }
}

impl Serialize for SalesFilter {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::DateRange {
                start_date,
                end_date,
            } => {
                let mut state = serializer.serialize_struct("SalesFilter", 2)?;
                state.serialize_field("start_date", start_date)?;
                state.serialize_field("end_date", end_date)?;
                state.end()
            }
            Self::Transaction(transaction) => {
                let mut state = serializer.serialize_struct("SalesFilter", 1)?;
                state.serialize_field("transaction", transaction)?;
                state.end()
            }
        }
    }
}

/// Request for one of the `/payments/api/v1/sales/*` endpoints.
///
/// The continuation token is not part of the request; the fetch loop supplies it per page.
///
/// # Example
///
/// ```
/// use sales_fetcher::sales::types::{Endpoint, SalesFilter, SalesRequest};
///
/// # fn main() -> sales_fetcher::Result<()> {
/// let history = SalesRequest::date_range("2024-01-01", "2024-01-31", "%Y-%m-%d")?;
///
/// let commissions = SalesRequest::builder()
///     .filter(SalesFilter::transaction("HP17715690036014"))
///     .endpoint(Endpoint::Commissions)
///     .build();
/// # Ok(())
/// # }
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct SalesRequest {
    pub filter: SalesFilter,
    #[builder(default)]
    pub endpoint: Endpoint,
}

impl SalesRequest {
    /// Sales history between two dates parsed with `format`.
    pub fn date_range(start_date: &str, end_date: &str, format: &str) -> Result<Self> {
        Ok(Self::builder()
            .filter(SalesFilter::date_range(start_date, end_date, format)?)
            .build())
    }

    /// Sales history of a single transaction.
    #[must_use]
    pub fn transaction<S: Into<String>>(transaction: S) -> Self {
        Self::builder()
            .filter(SalesFilter::transaction(transaction))
            .build()
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Whether the request selects a single transaction rather than a date window.
    #[must_use]
    pub fn is_transaction(&self) -> bool {
        matches!(self.filter, SalesFilter::Transaction(_))
    }
}

/// Converts `value`, parsed with `format`, into milliseconds since the epoch.
///
/// An offset in `format` (`%z`, `%:z`) is honoured; values without one are read as UTC.
pub fn to_epoch_millis(value: &str, format: &str) -> Result<EpochMillis> {
    if let Ok(date_time) = DateTime::parse_from_str(value, format) {
        return Ok(date_time.timestamp_millis());
    }

    let parsed = match NaiveDateTime::parse_from_str(value, format) {
        Ok(date_time) => date_time,
        Err(_) => NaiveDate::parse_from_str(value, format)
            .map_err(|e| Error::validation(format!("{value:?} does not match {format:?}: {e}")))?
            .and_time(chrono::NaiveTime::MIN),
    };

    Ok(parsed.and_utc().timestamp_millis())
}
