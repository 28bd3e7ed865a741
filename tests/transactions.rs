mod common;

use httpmock::MockServer;
use reqwest::StatusCode;
use sales_fetcher::sales::progress::NoProgress;
use sales_fetcher::table::{Cell, Table};
use serde_json::json;

use crate::common::{
    APPROVED, HISTORY_PATH, ProgressEvent, RecordingProgress, create_authenticated, page, sale,
};

mod lookup {
    use super::*;

    #[tokio::test]
    async fn missing_transactions_should_be_reported() -> anyhow::Result<()> {
        let server = MockServer::start();
        let (client, _) = create_authenticated(&server).await?;

        let found = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(HISTORY_PATH)
                .query_param("transaction", "HP1")
                .query_param_missing("start_date");
            then.status(StatusCode::OK)
                .json_body(page(vec![sale("HP1", APPROVED)], None, 1));
        });
        let empty = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(HISTORY_PATH)
                .query_param("transaction", "HP2");
            then.status(StatusCode::OK)
                .json_body(json!({ "items": [], "page_info": {} }));
        });
        let failing = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(HISTORY_PATH)
                .query_param("transaction", "HP3");
            then.status(StatusCode::BAD_REQUEST)
                .json_body(json!({ "error": "invalid_parameter" }));
        });

        let progress = RecordingProgress::default();
        let lookup = client.transactions(["HP1", "HP2", "HP3"], &progress).await;

        found.assert_calls(1);
        empty.assert_calls(1);
        failing.assert_calls(1);

        assert_eq!(lookup.not_found, ["HP2", "HP3"]);
        assert_eq!(lookup.table.len(), 1);
        assert_eq!(
            lookup.table.get(0, "purchase.transaction"),
            Some(&Cell::Value(json!("HP1")))
        );
        assert_eq!(
            progress.events(),
            [
                ProgressEvent::Start(Some(3)),
                ProgressEvent::Advance(1),
                ProgressEvent::Advance(2),
                ProgressEvent::Advance(3),
                ProgressEvent::Finish,
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn found_transactions_should_be_concatenated() -> anyhow::Result<()> {
        let server = MockServer::start();
        let (client, _) = create_authenticated(&server).await?;

        server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(HISTORY_PATH)
                .query_param("transaction", "HP1");
            then.status(StatusCode::OK)
                .json_body(page(vec![sale("HP1", APPROVED)], None, 1));
        });
        server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path(HISTORY_PATH)
                .query_param("transaction", "HP2");
            then.status(StatusCode::OK).json_body(json!({
                "items": [{ "purchase": { "transaction": "HP2", "offer": { "code": "x1" } } }],
                "page_info": {}
            }));
        });

        let ids = vec!["HP1".to_owned(), "HP2".to_owned()];
        let lookup = client.transactions(&ids, &NoProgress).await;

        assert!(lookup.not_found.is_empty());
        let table = lookup.into_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "purchase.offer.code"), Some(&Cell::Null));
        assert_eq!(
            table.get(1, "purchase.offer.code"),
            Some(&Cell::Value(json!("x1")))
        );
        assert_eq!(table.get(1, "buyer.email"), Some(&Cell::Null));

        Ok(())
    }

    #[tokio::test]
    async fn no_transactions_should_make_no_calls() -> anyhow::Result<()> {
        let server = MockServer::start();
        let (client, _) = create_authenticated(&server).await?;

        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path(HISTORY_PATH);
            then.status(StatusCode::OK)
                .json_body(page(Vec::new(), None, 0));
        });

        let lookup = client.transactions(Vec::<String>::new(), &NoProgress).await;

        mock.assert_calls(0);
        assert!(lookup.not_found.is_empty());
        assert_eq!(lookup.table, Table::default());

        Ok(())
    }
}

#[tokio::test]
async fn local_dates_should_shift_string_columns() -> anyhow::Result<()> {
    let server = MockServer::start();
    let (client, _) = create_authenticated(&server).await?;

    let table = Table::from_json_values([json!({
        "Data de Venda": "2024-02-16 10:06:31",
        "Transacao": "HP1"
    })])?;
    let table = client.local_dates(table);

    assert_eq!(
        table
            .get(0, "Data de Venda")
            .and_then(Cell::as_datetime)
            .map(|date_time| date_time.to_rfc3339()),
        Some("2024-02-16T07:06:31-03:00".to_owned())
    );

    Ok(())
}
