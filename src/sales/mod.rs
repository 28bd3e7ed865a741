//! Sales API client and types.
//!
//! This module provides a client for the platform's `/payments/api/v1/sales/*` endpoints:
//! authenticating, walking every page of a result set while respecting the rate limit, and
//! turning the collected records into a flat [`crate::table::Table`].
//!
//! ## Available Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `/security/oauth/token` | Exchange client credentials for a bearer token |
//! | `/payments/api/v1/sales/history` | Sales, one item per sale (default) |
//! | `/payments/api/v1/sales/summary` | Totals per currency |
//! | `/payments/api/v1/sales/users` | Participants of each sale |
//! | `/payments/api/v1/sales/commissions` | Commission split per sale |
//! | `/payments/api/v1/sales/price/details` | Price composition per sale |
//!
//! ## Pagination and rate limiting
//!
//! Every sales endpoint is paginated with an opaque `page_token`. Each response reports the
//! remaining quota in `RateLimit-Remaining` and the seconds until the window resets in
//! `RateLimit-Reset`. When the quota drops to the configured threshold (25 by default) the
//! client pauses for `RateLimit-Reset` plus a padding (5 seconds by default) before asking for
//! the next page. There is no other retry.
//!
//! # Example
//!
//! ```no_run
//! use sales_fetcher::auth::Credentials;
//! use sales_fetcher::sales::progress::NoProgress;
//! use sales_fetcher::sales::{Client, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("client-id", "secret".to_owned(), "Basic abc".to_owned());
//! let client = Client::login(&credentials, Config::default()).await?;
//!
//! let lookup = client
//!     .transactions(["HP17715690036014", "HP00000000000000"], &NoProgress)
//!     .await;
//! println!("found {} rows, missing {:?}", lookup.table.len(), lookup.not_found);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod pause;
pub mod progress;
pub mod types;

pub use client::{Client, Config};
