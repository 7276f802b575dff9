//! End-to-end tests of the Tally client against a mock XML server.

mod support;

use std::net::TcpListener;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use support::{
    client_for, collection_envelope, config_for, data_envelope, line_error_envelope, xml_response,
    SequenceResponder,
};
use tallybridge_domain::{DataSource, TallyConfig, TallyError, TallyErrorKind, Voucher};
use tallybridge_infra::integrations::tally::{with_company, with_voucher_type, CallContext};
use tallybridge_infra::TallyClient;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn get_vouchers_sends_date_range_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/xml; charset=utf-8"))
        .and(body_string_contains("<TALLYREQUEST>Export Data</TALLYREQUEST>"))
        .and(body_string_contains("<SVFROMDATE>20240101</SVFROMDATE>"))
        .and(body_string_contains("<SVTODATE>20240131</SVTODATE>"))
        .and(body_string_contains("<VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>"))
        .respond_with(xml_response(
            200,
            collection_envelope(
                r#"<VOUCHER VCHTYPE="Sales"><DATE>20240115</DATE><VOUCHERNUMBER>S-17</VOUCHERNUMBER><PARTYLEDGERNAME>Acme Traders</PARTYLEDGERNAME></VOUCHER>"#,
            ),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .get_vouchers(
            &CallContext::new(),
            date(2024, 1, 1),
            date(2024, 1, 31),
            &[with_voucher_type("Sales")],
        )
        .await
        .expect("vouchers");

    assert!(response.is_success());
    assert_eq!(response.vouchers.len(), 1);
    assert_eq!(response.sources.vouchers, DataSource::Collection);
    let voucher = &response.vouchers[0];
    assert_eq!(voucher.voucher_number.as_deref(), Some("S-17"));
    assert_eq!(voucher.parsed_date().unwrap(), Some(date(2024, 1, 15)));
    assert!(response.raw_xml.contains("S-17"));
}

#[tokio::test]
async fn ledgers_tolerate_formatted_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<REPORTNAME>List of Ledgers</REPORTNAME>"))
        .respond_with(xml_response(
            200,
            collection_envelope(
                r#"<LEDGER NAME="Acme Traders">
                    <PARENT>Sundry Debtors</PARENT>
                    <OPENINGBALANCE> 1,250.50 Dr</OPENINGBALANCE>
                    <CREDITPERIOD>30 Days</CREDITPERIOD>
                </LEDGER>
                <LEDGER NAME="Cash"><OPENINGBALANCE>n/a</OPENINGBALANCE></LEDGER>"#,
            ),
        ))
        .mount(&server)
        .await;

    let response = client_for(&server).get_ledgers(&CallContext::new(), &[]).await.unwrap();

    assert_eq!(response.ledgers.len(), 2);
    let acme = &response.ledgers[0];
    assert_eq!(acme.display_name(), Some("Acme Traders"));
    assert_eq!(acme.opening_balance, Some(1250.50));
    assert_eq!(acme.credit_period, Some(30));
    assert_eq!(response.ledgers[1].opening_balance, None);
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(SequenceResponder::new(vec![
            ResponseTemplate::new(503),
            ResponseTemplate::new(503),
            xml_response(200, collection_envelope(r#"<COSTCENTRE NAME="Head Office"/>"#)),
        ]))
        .expect(3)
        .mount(&server)
        .await;

    let response = client_for(&server).get_cost_centres(&CallContext::new(), &[]).await.unwrap();

    assert_eq!(response.cost_centres.len(), 1);
    assert_eq!(response.cost_centres[0].display_name(), Some("Head Office"));
}

#[tokio::test]
async fn persistent_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).get_stock_items(&CallContext::new(), &[]).await.unwrap_err();

    match &err {
        TallyError::RetryExhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert_eq!(last.kind(), TallyErrorKind::ConnectionFailed);
            assert!(last.to_string().contains("503"));
        }
        other => panic!("expected retry exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_parsed_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_response(400, line_error_envelope("Unknown request")))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_ledgers(&CallContext::new(), &[]).await.unwrap_err();

    assert_eq!(err.kind(), TallyErrorKind::OperationFailed);
    let response = err.response().expect("response travels with the error");
    assert_eq!(response.error, "Unknown request");
    assert_eq!(response.status, 0);
}

#[tokio::test]
async fn unreadable_body_without_markers_is_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_response(200, "Tally is starting up, please wait"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_ledgers(&CallContext::new(), &[]).await.unwrap_err();

    assert_eq!(err.kind(), TallyErrorKind::ResponseParseFailed);
}

#[tokio::test]
async fn deadline_cuts_slow_request_short() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_response(200, collection_envelope("")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = CallContext::with_timeout(Duration::from_millis(150));
    let started = Instant::now();

    let err = client.get_day_book(&ctx, date(2024, 3, 31), &[]).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn ping_accepts_error_replies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<REPORTNAME>List of Companies</REPORTNAME>"))
        .respond_with(xml_response(200, line_error_envelope("No company is open")))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).ping(&CallContext::new()).await.expect("server is reachable");
}

#[tokio::test]
async fn ping_fails_when_nothing_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = TallyClient::new(TallyConfig {
        host: "127.0.0.1".into(),
        port,
        max_retries: 1,
        retry_delay_ms: 5,
        ..TallyConfig::default()
    })
    .unwrap();

    let err = client.ping(&CallContext::new()).await.unwrap_err();

    assert_eq!(err.kind(), TallyErrorKind::RetryExhausted);
    assert_eq!(err.last_error().kind(), TallyErrorKind::ConnectionFailed);
}

#[tokio::test]
async fn companies_are_listed_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_response(
            200,
            collection_envelope(
                r#"<COMPANY NAME="Acme Clinic"/><COMPANY NAME="Beta &amp; Sons"/><COMPANY NAME="Acme Clinic"/>"#,
            ),
        ))
        .mount(&server)
        .await;

    let companies = client_for(&server).get_companies(&CallContext::new()).await.unwrap();

    assert_eq!(companies, vec!["Acme Clinic".to_string(), "Beta & Sons".to_string()]);
}

#[tokio::test]
async fn import_reports_counters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<TALLYREQUEST>Import Data</TALLYREQUEST>"))
        .and(body_string_contains("<SVCURRENTCOMPANY>Acme Clinic</SVCURRENTCOMPANY>"))
        .and(body_string_contains("<TALLYMESSAGE"))
        .and(body_string_contains("<VOUCHERNUMBER>R-1</VOUCHERNUMBER>"))
        .respond_with(xml_response(
            200,
            data_envelope(
                "<IMPORTRESULT><CREATED>2</CREATED><ALTERED>0</ALTERED><ERRORS>0</ERRORS></IMPORTRESULT>",
            ),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = TallyClient::builder(config_for(&server)).build().unwrap();
    let vouchers = vec![
        Voucher {
            vch_type: Some("Receipt".into()),
            voucher_number: Some("R-1".into()),
            ..Voucher::default()
        },
        Voucher {
            vch_type: Some("Receipt".into()),
            voucher_number: Some("R-2".into()),
            ..Voucher::default()
        },
    ];

    let response = client
        .import_vouchers(&CallContext::new(), vouchers, &[with_company("Acme Clinic")])
        .await
        .unwrap();

    let result = response.import_result.expect("import counters");
    assert_eq!(result.created, Some(2));
    assert_eq!(result.altered, Some(0));
    assert!(response.error.is_empty());
}
