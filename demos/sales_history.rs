//! Fetches every sale in a date range and logs a summary of the flattened table.
//!
//! Reads the credentials from `SALES_CLIENT_ID`, `SALES_CLIENT_SECRET` and
//! `SALES_AUTHORIZATION`, and the range from the first two arguments (`%Y-%m-%d`):
//! ```sh
//! RUST_LOG=info,hyper_util=off,hyper=off,reqwest=off,h2=off,rustls=off cargo run --example sales_history --features tracing -- 2024-01-01 2024-01-31
//! ```
//!
//! Optionally log to a file:
//! ```sh
//! LOG_FILE=sales.log RUST_LOG=info cargo run --example sales_history --features tracing -- 2024-01-01 2024-01-31
//! ```

use std::env;
use std::fs::File;

use sales_fetcher::auth::Credentials;
use sales_fetcher::sales::progress::TracingProgress;
use sales_fetcher::sales::types::{DEFAULT_DATE_FORMAT, Endpoint, FetchOutcome, SalesRequest};
use sales_fetcher::sales::{Client, Config};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(path) = env::var("LOG_FILE") {
        let file = File::create(path)?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let mut args = env::args().skip(1);
    let start = args.next().unwrap_or_else(|| "2024-01-01".to_owned());
    let end = args.next().unwrap_or_else(|| "2024-01-31".to_owned());

    let credentials = Credentials::new(
        env::var("SALES_CLIENT_ID")?,
        env::var("SALES_CLIENT_SECRET")?,
        env::var("SALES_AUTHORIZATION")?,
    );
    let client = Client::login(&credentials, Config::default()).await?;

    let request = SalesRequest::date_range(&start, &end, DEFAULT_DATE_FORMAT)?;
    let progress = TracingProgress::new("history");

    match client.sales(&request, &progress).await {
        FetchOutcome::Complete(table) => {
            info!(rows = table.len(), columns = ?table.columns(), "fetched sales");
        }
        FetchOutcome::Partial { data, error } => {
            warn!(rows = data.len(), error = %error, "fetch stopped early");
        }
        FetchOutcome::Empty => info!(start = %start, end = %end, "no sales in range"),
        FetchOutcome::Failed(error) => error!(error = %error, "fetch failed"),
        _ => {}
    }

    let summary = client
        .sales(&request.with_endpoint(Endpoint::Summary), &progress)
        .await
        .into_table();
    for row in summary.rows() {
        info!(endpoint = "summary", row = ?row.iter().collect::<Vec<_>>());
    }

    Ok(())
}
