//! Shared helpers for the infra integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use tallybridge_domain::TallyConfig;
use tallybridge_infra::TallyClient;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Config pointing at `server` with a small, fast retry budget.
pub fn config_for(server: &MockServer) -> TallyConfig {
    let addr = server.address();
    TallyConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        company: String::new(),
        timeout_secs: 5,
        max_retries: 2,
        retry_delay_ms: 10,
    }
}

/// Client talking to `server` over the default HTTP transport.
pub fn client_for(server: &MockServer) -> TallyClient {
    TallyClient::new(config_for(server)).expect("client should build")
}

/// Wrap `data` in `ENVELOPE/BODY/DATA`.
pub fn data_envelope(data: &str) -> String {
    format!("<ENVELOPE><HEADER><VERSION>1</VERSION><STATUS>1</STATUS></HEADER><BODY><DATA>{data}</DATA></BODY></ENVELOPE>")
}

/// Wrap `items` in a single `COLLECTION`.
pub fn collection_envelope(items: &str) -> String {
    data_envelope(&format!("<COLLECTION>{items}</COLLECTION>"))
}

/// Envelope carrying only a top-level `LINEERROR`.
pub fn line_error_envelope(message: &str) -> String {
    format!("<ENVELOPE><LINEERROR>{message}</LINEERROR></ENVELOPE>")
}

/// Plays `responses` in order, repeating the last one once exhausted.
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        Self { responses, calls: AtomicUsize::new(0) }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

/// XML response with the content type Tally sends.
pub fn xml_response(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.into(), "text/xml; charset=utf-8")
}
