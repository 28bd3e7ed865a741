//! Types for the sales endpoints: requests, pages, and the outcome of a multi-page fetch.

use std::fmt;

use crate::error::Error;
use crate::table::Table;

pub mod request;
pub mod response;

pub use request::{DEFAULT_DATE_FORMAT, SalesFilter, SalesRequest, to_epoch_millis};
pub use response::{PageInfo, RateLimit, SaleRecord, SalesPage};

/// Path segment under `/payments/api/v1/sales/`.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Endpoint {
    /// `history`: one item per sale.
    #[default]
    History,
    /// `summary`: totals per currency.
    Summary,
    /// `users`: buyers, producers and affiliates involved in each sale.
    Users,
    /// `commissions`: commission split per sale.
    Commissions,
    /// `price/details`: price composition per sale.
    PriceDetails,
    /// Any other path segment.
    Custom(String),
}

impl Endpoint {
    #[must_use]
    pub fn as_path(&self) -> &str {
        match self {
            Self::History => "history",
            Self::Summary => "summary",
            Self::Users => "users",
            Self::Commissions => "commissions",
            Self::PriceDetails => "price/details",
            Self::Custom(path) => path.trim_matches('/'),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Result of a fetch that may span several pages.
///
/// A failed page stops the fetch. What was accumulated before the failure is kept, so a caller
/// can tell "no data" ([`FetchOutcome::Empty`]) apart from "the call failed"
/// ([`FetchOutcome::Failed`]) and from "some pages arrived" ([`FetchOutcome::Partial`]).
#[non_exhaustive]
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Every page was fetched and at least one item was returned.
    Complete(T),
    /// Every page was fetched but no items were returned.
    Empty,
    /// Some pages were fetched before a later page failed.
    Partial { data: T, error: Error },
    /// The first page failed.
    Failed(Error),
}

impl<T> FetchOutcome<T> {
    /// Builds the outcome of a fetch that ran to completion.
    pub(crate) fn finished(data: T, is_empty: bool) -> Self {
        if is_empty {
            Self::Empty
        } else {
            Self::Complete(data)
        }
    }

    /// Builds the outcome of a fetch interrupted by `error`.
    pub(crate) fn interrupted(data: T, is_empty: bool, error: Error) -> Self {
        if is_empty {
            Self::Failed(error)
        } else {
            Self::Partial { data, error }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Empty)
    }

    /// The fetched data, if any item was returned.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Complete(data) | Self::Partial { data, .. } => Some(data),
            Self::Empty | Self::Failed(_) => None,
        }
    }

    /// The error that stopped the fetch, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Partial { error, .. } | Self::Failed(error) => Some(error),
            Self::Complete(_) | Self::Empty => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            Self::Complete(data) => FetchOutcome::Complete(f(data)),
            Self::Empty => FetchOutcome::Empty,
            Self::Partial { data, error } => FetchOutcome::Partial {
                data: f(data),
                error,
            },
            Self::Failed(error) => FetchOutcome::Failed(error),
        }
    }

    /// Converts into a plain [`Result`](crate::Result): any failure becomes an `Err`, even when
    /// earlier pages succeeded. [`FetchOutcome::Empty`] becomes `Ok(None)`.
    pub fn into_result(self) -> crate::Result<Option<T>> {
        match self {
            Self::Complete(data) => Ok(Some(data)),
            Self::Empty => Ok(None),
            Self::Partial { error, .. } | Self::Failed(error) => Err(error),
        }
    }
}

impl FetchOutcome<Table> {
    /// The fetched table; empty when nothing arrived or the first page failed.
    #[must_use]
    pub fn into_table(self) -> Table {
        match self {
            Self::Complete(table) | Self::Partial { data: table, .. } => table,
            Self::Empty | Self::Failed(_) => Table::default(),
        }
    }
}

/// Result of [`crate::sales::Client::transactions`].
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLookup {
    /// Rows of every transaction that was found, in lookup order.
    pub table: Table,
    /// Transactions for which the API returned an error or no rows.
    pub not_found: Vec<String>,
}

impl TransactionLookup {
    #[must_use]
    pub fn into_table(self) -> Table {
        self.table
    }
}
