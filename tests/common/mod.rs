#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Deeply nested uses in sub-modules are falsely flagged as being unused"
)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use httpmock::MockServer;
use reqwest::StatusCode;
use sales_fetcher::auth::Credentials;
use sales_fetcher::auth::state::Authenticated;
use sales_fetcher::sales::pause::Pause;
use sales_fetcher::sales::progress::Progress;
use sales_fetcher::sales::{Client, Config};
use serde_json::{Value, json};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const BASIC_AUTHORIZATION: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";
pub const ACCESS_TOKEN: &str = "access-token";
pub const BEARER: &str = "Bearer access-token";

/// 2023-11-14T22:13:20Z
pub const APPROVED: i64 = 1_700_000_000_000;

pub const TOKEN_PATH: &str = "/security/oauth/token";
pub const HISTORY_PATH: &str = "/payments/api/v1/sales/history";

pub const RATE_LIMIT_REMAINING: &str = "RateLimit-Remaining";
pub const RATE_LIMIT_RESET: &str = "RateLimit-Reset";

pub type TestClient = Client<Authenticated>;

#[must_use]
pub fn credentials() -> Credentials {
    Credentials::new(
        CLIENT_ID,
        CLIENT_SECRET.to_owned(),
        BASIC_AUTHORIZATION.to_owned(),
    )
}

/// Points both hosts at `server`.
#[must_use]
pub fn config(server: &MockServer) -> Config {
    let base_url = format!("{}/", server.base_url());
    Config::builder()
        .api_host(base_url.clone())
        .auth_host(base_url)
        .build()
}

pub async fn create_authenticated(
    server: &MockServer,
) -> anyhow::Result<(TestClient, RecordingPause)> {
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path(TOKEN_PATH)
            .query_param("grant_type", "client_credentials")
            .query_param("client_id", CLIENT_ID)
            .query_param("client_secret", CLIENT_SECRET)
            .header("authorization", BASIC_AUTHORIZATION);
        then.status(StatusCode::OK).json_body(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "expires_in": 172_799,
            "scope": "read write",
            "jti": "0b3e5f2c"
        }));
    });

    let pause = RecordingPause::default();
    let client = Client::new(config(server))?
        .with_pause(pause.clone())
        .authenticate(&credentials())
        .await?;

    mock.assert();

    Ok((client, pause))
}

/// A sales item shaped like the ones the history endpoint returns.
#[must_use]
pub fn sale(transaction: &str, approved_date: i64) -> Value {
    json!({
        "product": { "id": 1_234_567, "name": "Course" },
        "buyer": { "name": "Ana", "email": "ana@example.com", "ucode": "b-1" },
        "producer": { "name": "Producer", "ucode": "p-1" },
        "purchase": {
            "transaction": transaction,
            "status": "APPROVED",
            "approved_date": approved_date,
            "order_date": approved_date,
            "price": { "value": 97.0, "currency_code": "BRL" },
            "payment": { "type": "CREDIT_CARD", "installments_number": 1 }
        }
    })
}

#[must_use]
pub fn page(items: Vec<Value>, next_page_token: Option<&str>, total_results: u64) -> Value {
    let mut page_info = json!({
        "total_results": total_results,
        "results_per_page": 100
    });
    if let Some(token) = next_page_token {
        page_info["next_page_token"] = json!(token);
    }

    json!({ "items": items, "page_info": page_info })
}

/// Records each requested pause and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingPause(Arc<Mutex<Vec<Duration>>>);

impl RecordingPause {
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start(Option<u64>),
    Advance(u64),
    Finish,
}

/// Records every progress update.
#[derive(Debug, Default)]
pub struct RecordingProgress(Mutex<Vec<ProgressEvent>>);

impl RecordingProgress {
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Progress for RecordingProgress {
    fn start(&self, total: Option<u64>) {
        self.0.lock().unwrap().push(ProgressEvent::Start(total));
    }

    fn advance(&self, completed: u64) {
        self.0.lock().unwrap().push(ProgressEvent::Advance(completed));
    }

    fn finish(&self) {
        self.0.lock().unwrap().push(ProgressEvent::Finish);
    }
}
