//! Tally XML gateway client

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tallybridge_domain::{
    Ledger, ReportName, RequestType, Result, TallyConfig, TallyError, TallyResponse, Voucher,
};
use tracing::{debug, info};

use super::context::CallContext;
use super::envelope::TallyMessage;
use super::parser::parse_response;
use super::request::{
    build_company_list_request, build_export_request, build_import_request, RequestOption,
    RequestOptions,
};
use super::scan::extract_companies_from_xml;
use super::transport::{send_with_retry, HttpTransport, RetryPolicy, XmlTransport};
use crate::observability::log_operation_outcome;

/// Client for one Tally XML server.
///
/// Cheap to clone; clones share the transport and its connection pool.
#[derive(Clone)]
pub struct TallyClient {
    config: TallyConfig,
    transport: Arc<dyn XmlTransport>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for TallyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TallyClient")
            .field("endpoint", &self.transport.endpoint())
            .field("company", &self.config.company())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Builder for [`TallyClient`].
pub struct TallyClientBuilder {
    config: TallyConfig,
    transport: Option<Arc<dyn XmlTransport>>,
    base_url: Option<String>,
}

impl TallyClientBuilder {
    /// Use a custom transport instead of the pooled HTTP client.
    ///
    /// The transport's own endpoint is used; `base_url` is ignored.
    pub fn transport(mut self, transport: Arc<dyn XmlTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override `http://{host}:{port}` from the config.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// # Errors
    /// `RequestFailed` for an unparseable base URL or an HTTP client that
    /// cannot be built.
    pub fn build(self) -> Result<TallyClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let url = self.base_url.unwrap_or_else(|| self.config.base_url());
                Arc::new(HttpTransport::new(url, self.config.timeout())?) as Arc<dyn XmlTransport>
            }
        };

        let retry = RetryPolicy::from_config(&self.config);
        Ok(TallyClient { config: self.config, transport, retry })
    }
}

impl TallyClient {
    /// Client with the default pooled HTTP transport.
    pub fn new(config: TallyConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: TallyConfig) -> TallyClientBuilder {
        TallyClientBuilder { config, transport: None, base_url: None }
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Endpoint requests are posted to.
    pub fn base_url(&self) -> &str {
        self.transport.endpoint()
    }

    /// Send `payload` with retries and normalize the reply.
    ///
    /// `duration` on the returned response, including the one attached to
    /// an `OperationFailed` error, spans from the first attempt to the end
    /// of parsing.
    ///
    /// # Errors
    /// - `Timeout` when `ctx` is cancelled or its deadline passes
    /// - `RetryExhausted` when every attempt failed with a retryable error
    /// - `OperationFailed` / `ResponseParseFailed` from the parser
    /// - any other non-retryable transport error, unchanged
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request_type: RequestType,
        payload: &str,
    ) -> Result<TallyResponse> {
        let started = Instant::now();
        debug!(request_type = %request_type, base_url = %self.base_url(), "executing tally request");

        let outcome = match send_with_retry(self.transport.as_ref(), ctx, &self.retry, payload).await
        {
            Ok(body) => parse_response(&body),
            Err(err) => Err(err),
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(mut response) => {
                response.duration = elapsed;
                debug!(
                    status = response.status,
                    ledgers_count = response.ledgers.len(),
                    cost_centres_count = response.cost_centres.len(),
                    stock_items_count = response.stock_items.len(),
                    vouchers_count = response.vouchers.len(),
                    duration_ms = elapsed.as_millis() as u64,
                    "tally request completed"
                );
                Ok(response)
            }
            Err(TallyError::OperationFailed { message, mut response }) => {
                response.duration = elapsed;
                Err(TallyError::OperationFailed { message, response })
            }
            Err(err) => Err(err),
        }
    }

    /// Chart of accounts.
    pub async fn get_ledgers(
        &self,
        ctx: &CallContext,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let request = RequestOptions::from_options(options);
        self.export(ctx, "get_ledgers", ReportName::ListOfLedgers, request).await
    }

    pub async fn get_cost_centres(
        &self,
        ctx: &CallContext,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let request = RequestOptions::from_options(options);
        self.export(ctx, "get_cost_centres", ReportName::ListOfCostCentres, request).await
    }

    pub async fn get_stock_items(
        &self,
        ctx: &CallContext,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let request = RequestOptions::from_options(options);
        self.export(ctx, "get_stock_items", ReportName::ListOfStockItems, request).await
    }

    /// Every master type in one export.
    pub async fn get_all_masters(
        &self,
        ctx: &CallContext,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let request = RequestOptions::from_options(options);
        self.export(ctx, "get_all_masters", ReportName::AllMasters, request).await
    }

    /// Vouchers dated within `[from, to]`.
    ///
    /// A `with_date_range` option replaces the range given here.
    pub async fn get_vouchers(
        &self,
        ctx: &CallContext,
        from: NaiveDate,
        to: NaiveDate,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let mut request =
            RequestOptions { from_date: Some(from), to_date: Some(to), ..RequestOptions::default() };
        request.apply(options);
        self.export(ctx, "get_vouchers", ReportName::ListOfVouchers, request).await
    }

    /// Vouchers altered after `last_alter_id`, for incremental sync.
    pub async fn get_vouchers_modified_since(
        &self,
        ctx: &CallContext,
        last_alter_id: &str,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let mut request = RequestOptions {
            last_alter_id: Some(last_alter_id.to_string()),
            ..RequestOptions::default()
        };
        request.apply(options);
        self.export(ctx, "get_vouchers_modified_since", ReportName::AlteredVouchers, request).await
    }

    /// Transactions recorded on `date`.
    pub async fn get_day_book(
        &self,
        ctx: &CallContext,
        date: NaiveDate,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let mut request = RequestOptions { day_book_date: Some(date), ..RequestOptions::default() };
        request.apply(options);
        self.export(ctx, "get_day_book", ReportName::DayBook, request).await
    }

    /// Reachability check.
    ///
    /// Any answer from Tally counts as reachable, including one reporting
    /// an error; only transport failures are returned.
    pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
        let started = Instant::now();
        let payload = build_company_list_request()?;

        let result = match self.execute(ctx, RequestType::ExportData, &payload).await {
            Ok(_) => Ok(()),
            Err(TallyError::OperationFailed { message, .. }) => {
                debug!(error = %message, "tally answered ping with an error; server is reachable");
                Ok(())
            }
            Err(err) => Err(err),
        };

        log_operation_outcome("ping", started.elapsed(), result.as_ref().err());
        result
    }

    /// Names of the companies loaded in Tally, in the order listed.
    pub async fn get_companies(&self, ctx: &CallContext) -> Result<Vec<String>> {
        let started = Instant::now();
        let payload = build_company_list_request()?;

        let result = self
            .execute(ctx, RequestType::ExportData, &payload)
            .await
            .map(|response| extract_companies_from_xml(&response.raw_xml));

        log_operation_outcome("get_companies", started.elapsed(), result.as_ref().err());
        result
    }

    /// Create or alter vouchers.
    ///
    /// Counters come back in [`TallyResponse::import_result`].
    pub async fn import_vouchers(
        &self,
        ctx: &CallContext,
        vouchers: Vec<Voucher>,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let message = TallyMessage { vouchers, ..TallyMessage::for_import() };
        self.import(ctx, "import_vouchers", ReportName::Vouchers, message, options).await
    }

    /// Create or alter ledger masters.
    pub async fn import_ledgers(
        &self,
        ctx: &CallContext,
        ledgers: Vec<Ledger>,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let message = TallyMessage { ledgers, ..TallyMessage::for_import() };
        self.import(ctx, "import_ledgers", ReportName::AllMasters, message, options).await
    }

    async fn export(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        report: ReportName,
        mut request: RequestOptions,
    ) -> Result<TallyResponse> {
        let started = Instant::now();
        request.company = self.resolve_company(request.company.take());

        let result = match build_export_request(report, &request) {
            Ok(payload) => self.execute(ctx, RequestType::ExportData, &payload).await,
            Err(err) => Err(err),
        };

        if let Ok(response) = &result {
            info!(
                operation,
                report = %report,
                company = request.company.as_deref().unwrap_or(""),
                entities = response.entity_count(),
                "tally export finished"
            );
        }
        log_operation_outcome(operation, started.elapsed(), result.as_ref().err());
        result
    }

    async fn import(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        report: ReportName,
        message: TallyMessage,
        options: &[RequestOption],
    ) -> Result<TallyResponse> {
        let started = Instant::now();
        let company = self.resolve_company(RequestOptions::from_options(options).company);

        let result = match build_import_request(report, company.as_deref(), message) {
            Ok(payload) => self.execute(ctx, RequestType::ImportData, &payload).await,
            Err(err) => Err(err),
        };

        log_operation_outcome(operation, started.elapsed(), result.as_ref().err());
        result
    }

    /// Per-call override, else the configured company.
    fn resolve_company(&self, requested: Option<String>) -> Option<String> {
        requested.or_else(|| self.config.company().map(str::to_string))
    }
}
