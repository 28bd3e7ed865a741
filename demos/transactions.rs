//! Looks up transaction codes one by one and reports the ones the API does not know.
//!
//! ```sh
//! RUST_LOG=info cargo run --example transactions --features tracing -- HP17715690036014 HP00000000000000
//! ```

use std::env;

use sales_fetcher::auth::Credentials;
use sales_fetcher::sales::progress::TracingProgress;
use sales_fetcher::sales::{Client, Config};
use sales_fetcher::table::Cell;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let transactions: Vec<String> = env::args().skip(1).collect();

    let credentials = Credentials::new(
        env::var("SALES_CLIENT_ID")?,
        env::var("SALES_CLIENT_SECRET")?,
        env::var("SALES_AUTHORIZATION")?,
    );
    let client = Client::login(&credentials, Config::default()).await?;

    let lookup = client
        .transactions(&transactions, &TracingProgress::new("transactions"))
        .await;

    for row in lookup.table.rows() {
        let transaction = row.get("purchase.transaction").and_then(Cell::as_value);
        let approved = row
            .get("purchase.approved_date")
            .and_then(Cell::as_datetime);
        info!(transaction = ?transaction, approved = ?approved, "found");
    }

    if !lookup.not_found.is_empty() {
        warn!(not_found = ?lookup.not_found, "unknown transactions");
    }

    Ok(())
}
