use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use bon::Builder;
use chrono::{FixedOffset, Offset as _, Utc};
use futures::{Stream, StreamExt as _};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};
use url::Url;

use super::pause::{Pause, TokioPause};
use super::progress::{NoProgress, Progress};
use super::types::{
    FetchOutcome, RateLimit, SaleRecord, SalesPage, SalesRequest, TransactionLookup,
};
use crate::auth::state::{Authenticated, State, Unauthenticated};
use crate::auth::{self, Credentials, Token};
use crate::table::Table;
use crate::{Result, ToQueryParams as _};

/// The default sales API host.
pub const DEFAULT_API_HOST: &str = "https://developers.hotmart.com";
/// The default OAuth host.
pub const DEFAULT_AUTH_HOST: &str = "https://api-sec-vlc.hotmart.com";

const SALES_PATH: &str = "payments/api/v1/sales";
const DEFAULT_RATE_LIMIT_THRESHOLD: u64 = 25;
const DEFAULT_RATE_LIMIT_PADDING: Duration = Duration::from_secs(5);
const DEFAULT_PAGE_SIZE: u64 = 100;
/// Offset applied by [`Table::convert_date_strings`] when no other is configured (UTC-3).
const DEFAULT_LOCAL_OFFSET_SECS: i32 = -3 * 3600;

/// Configuration for [`Client`]
#[derive(Clone, Debug, Builder)]
pub struct Config {
    /// Host of the sales endpoints. Defaults to [`DEFAULT_API_HOST`].
    #[builder(into, default = DEFAULT_API_HOST.to_owned())]
    api_host: String,
    /// Host of the token endpoint. Defaults to [`DEFAULT_AUTH_HOST`].
    #[builder(into, default = DEFAULT_AUTH_HOST.to_owned())]
    auth_host: String,
    /// Pause once `RateLimit-Remaining` is at or below this value. Defaults to 25.
    #[builder(default = DEFAULT_RATE_LIMIT_THRESHOLD)]
    rate_limit_threshold: u64,
    /// Added to `RateLimit-Reset` when pausing. Defaults to five (5) seconds.
    #[builder(default = DEFAULT_RATE_LIMIT_PADDING)]
    rate_limit_padding: Duration,
    /// Page size the server uses, only for estimating the number of pages. Defaults to 100.
    #[builder(default = DEFAULT_PAGE_SIZE)]
    page_size: u64,
    /// Offset used by [`Client::local_dates`]. Defaults to UTC-3.
    #[builder(default = default_local_offset())]
    local_offset: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    #[must_use]
    pub fn rate_limit_threshold(&self) -> u64 {
        self.rate_limit_threshold
    }

    #[must_use]
    pub fn rate_limit_padding(&self) -> Duration {
        self.rate_limit_padding
    }

    #[must_use]
    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }
}

fn default_local_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_LOCAL_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Client for the sales endpoints.
///
/// Starts [`Unauthenticated`]; [`Client::authenticate`] exchanges [`Credentials`] for a bearer
/// token and returns a [`Client<Authenticated>`], which is the only state that can fetch sales.
///
/// ```rust,no_run
/// use sales_fetcher::auth::Credentials;
/// use sales_fetcher::sales::progress::NoProgress;
/// use sales_fetcher::sales::types::SalesRequest;
/// use sales_fetcher::sales::{Client, Config};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let credentials = Credentials::new(
///         std::env::var("SALES_CLIENT_ID")?,
///         std::env::var("SALES_CLIENT_SECRET")?,
///         std::env::var("SALES_AUTHORIZATION")?,
///     );
///     let client = Client::login(&credentials, Config::default()).await?;
///
///     let request = SalesRequest::date_range("2024-01-01", "2024-01-31", "%Y-%m-%d")?;
///     let table = client.sales(&request, &NoProgress).await.into_table();
///     println!("{} sales, columns: {:?}", table.len(), table.columns());
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client<S: State = Unauthenticated> {
    config: Config,
    /// The current [`State`] of this client
    state: S,
    api_host: Url,
    auth_host: Url,
    /// The inner [`ReqwestClient`] used to make requests to both hosts.
    client: ReqwestClient,
    pause: Arc<dyn Pause>,
}

impl Default for Client<Unauthenticated> {
    fn default() -> Self {
        Client::new(Config::default()).expect("Client with default endpoints should succeed")
    }
}

impl Client<Unauthenticated> {
    /// Creates a new unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns an error if a host URL is invalid or the HTTP client fails to build.
    pub fn new(config: Config) -> Result<Client<Unauthenticated>> {
        let mut headers = HeaderMap::new();

        headers.insert("User-Agent", HeaderValue::from_static("sales_fetcher"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        Self::with_http_client(config, client)
    }

    /// Creates a client that sends its requests through `client`, e.g. one configured with a
    /// proxy or custom timeouts.
    pub fn with_http_client(
        config: Config,
        client: ReqwestClient,
    ) -> Result<Client<Unauthenticated>> {
        Ok(Self {
            api_host: Url::parse(&config.api_host)?,
            auth_host: Url::parse(&config.auth_host)?,
            config,
            state: Unauthenticated,
            client,
            pause: Arc::new(TokioPause),
        })
    }

    /// Creates a client and authenticates it in one step.
    pub async fn login(
        credentials: &Credentials,
        config: Config,
    ) -> Result<Client<Authenticated>> {
        Self::new(config)?.authenticate(credentials).await
    }

    /// Exchanges `credentials` for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::Kind::Authentication`] error carrying the status code and body
    /// when the token endpoint rejects the credentials.
    pub async fn authenticate(self, credentials: &Credentials) -> Result<Client<Authenticated>> {
        let response = auth::request_token(&self.client, &self.auth_host, credentials).await?;
        Ok(self.with_token(response.access_token))
    }

    /// Elevates the client with a token obtained elsewhere.
    #[must_use]
    pub fn with_token(self, token: Token) -> Client<Authenticated> {
        Client {
            config: self.config,
            state: Authenticated { token },
            api_host: self.api_host,
            auth_host: self.auth_host,
            client: self.client,
            pause: self.pause,
        }
    }
}

impl<S: State> Client<S> {
    /// Replaces the way the client waits out a rate-limit window.
    #[must_use]
    pub fn with_pause<P: Pause + 'static>(mut self, pause: P) -> Self {
        self.pause = Arc::new(pause);
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the sales API host.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.api_host
    }

    /// Returns the OAuth host.
    #[must_use]
    pub fn auth_host(&self) -> &Url {
        &self.auth_host
    }
}

impl Client<Authenticated> {
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.state.token
    }

    /// Fetches one page of `request`, continuing from `page_token` when given.
    ///
    /// The returned page carries the rate-limit quota read from the response headers.
    pub async fn fetch_page(
        &self,
        request: &SalesRequest,
        page_token: Option<&str>,
    ) -> Result<SalesPage> {
        let query = request.filter.query_params(page_token);
        let http_request = self
            .client
            .request(
                Method::GET,
                format!("{}{SALES_PATH}/{}{query}", self.api_host, request.endpoint),
            )
            .build()?;
        let headers = auth::bearer_headers(&self.state.token)?;

        let (mut page, response_headers): (SalesPage, _) =
            crate::request(&self.client, http_request, Some(headers)).await?;
        page.rate_limit = RateLimit::from_headers(&response_headers);

        #[cfg(feature = "tracing")]
        debug!(
            endpoint = %request.endpoint,
            items = page.items.len(),
            remaining = ?page.rate_limit.remaining,
            has_next = page.next_page_token().is_some(),
            "fetched sales page"
        );

        Ok(page)
    }

    /// Returns a stream of pages, following `next_page_token` until the server stops sending
    /// one.
    ///
    /// Whenever a page reports a remaining quota at or below the configured threshold, the
    /// stream pauses for `RateLimit-Reset` plus the configured padding before requesting the
    /// next page. The stream ends after the first error.
    pub fn pages<'client>(
        &'client self,
        request: &SalesRequest,
    ) -> impl Stream<Item = Result<SalesPage>> + use<'client> {
        let request = request.clone();

        try_stream! {
            let mut page_token: Option<String> = None;

            loop {
                let page = self.fetch_page(&request, page_token.as_deref()).await?;
                let next = page.next_page_token().map(str::to_owned);
                let pause = page
                    .rate_limit
                    .pause(self.config.rate_limit_threshold, self.config.rate_limit_padding);

                yield page;

                let Some(next) = next else {
                    break;
                };

                if let Some(duration) = pause {
                    #[cfg(feature = "tracing")]
                    info!(seconds = duration.as_secs(), "rate limit almost exhausted, pausing");

                    self.pause.pause(duration).await;
                }

                page_token = Some(next);
            }
        }
    }

    /// Fetches every page of `request` and collects the raw records.
    ///
    /// Date-range fetches report one progress step per page, with the total estimated from the
    /// `total_results` of the first page carrying items. Transaction lookups report nothing.
    pub async fn fetch_records(
        &self,
        request: &SalesRequest,
        progress: &dyn Progress,
    ) -> FetchOutcome<Vec<SaleRecord>> {
        let progress: &dyn Progress = if request.is_transaction() {
            &NoProgress
        } else {
            progress
        };

        let mut records: Vec<SaleRecord> = Vec::new();
        let mut fetched: u64 = 0;
        let mut started = false;
        let mut pages = pin!(self.pages(request));

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    if !started && !page.items.is_empty() {
                        started = true;
                        progress.start(
                            page.page_info
                                .total_results
                                .map(|total| total / self.config.page_size.max(1) + 1),
                        );
                    }
                    fetched += 1;
                    records.extend(page.items);
                    progress.advance(fetched);
                }
                Err(error) => {
                    progress.finish();

                    #[cfg(feature = "tracing")]
                    warn!(
                        pages = fetched,
                        records = records.len(),
                        error = %error,
                        "sales fetch interrupted"
                    );

                    let is_empty = records.is_empty();
                    return FetchOutcome::interrupted(records, is_empty, error);
                }
            }
        }

        progress.finish();
        let is_empty = records.is_empty();
        FetchOutcome::finished(records, is_empty)
    }

    /// Fetches every page of `request` as a [`Table`].
    ///
    /// Nested-object columns are flattened into `<column>.<key>` columns and every column whose
    /// name contains `date` is converted from epoch milliseconds to a date-time.
    pub async fn sales(
        &self,
        request: &SalesRequest,
        progress: &dyn Progress,
    ) -> FetchOutcome<Table> {
        self.fetch_records(request, progress)
            .await
            .map(|records| Table::from_records(records).normalized())
    }

    /// Looks up each transaction code in turn and concatenates the results.
    ///
    /// A code for which the API returns an error or no rows is added to
    /// [`TransactionLookup::not_found`]; the remaining codes are still looked up. `progress`
    /// advances once per code.
    pub async fn transactions<I>(
        &self,
        transactions: I,
        progress: &dyn Progress,
    ) -> TransactionLookup
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let transactions: Vec<String> = transactions
            .into_iter()
            .map(|t| t.as_ref().to_owned())
            .collect();

        progress.start(Some(transactions.len() as u64));

        let mut tables = Vec::with_capacity(transactions.len());
        let mut not_found = Vec::new();

        for (done, transaction) in transactions.into_iter().enumerate() {
            let request = SalesRequest::transaction(transaction.as_str());

            match self.sales(&request, &NoProgress).await {
                FetchOutcome::Complete(table) | FetchOutcome::Partial { data: table, .. } => {
                    tables.push(table);
                }
                FetchOutcome::Empty => not_found.push(transaction),
                FetchOutcome::Failed(_error) => {
                    #[cfg(feature = "tracing")]
                    warn!(transaction = %transaction, error = %_error, "transaction lookup failed");

                    not_found.push(transaction);
                }
            }

            progress.advance(done as u64 + 1);
        }

        progress.finish();

        #[cfg(feature = "tracing")]
        if !not_found.is_empty() {
            warn!(not_found = ?not_found, "transactions not found");
        }

        TransactionLookup {
            table: Table::concat(tables),
            not_found,
        }
    }

    /// Applies the string-date conversion ([`Table::convert_date_strings`]) with the configured
    /// local offset.
    #[must_use]
    pub fn local_dates(&self, mut table: Table) -> Table {
        table.convert_date_strings(self.config.local_offset);
        table
    }
}
