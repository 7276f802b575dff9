//! Normalizes raw Tally bodies into [`TallyResponse`]
//!
//! Tally does not set a reliable status flag, so success is inferred: a
//! body carrying an error and no entities is a failure, anything else is a
//! success. A body with both an error and partial data counts as success.

use quick_xml::events::Event;
use quick_xml::Reader;
use tallybridge_domain::constants::STATUS_SUCCESS;
use tallybridge_domain::{DataSource, EntitySources, ImportResult, Result, TallyError, TallyResponse};
use tracing::{debug, warn};

use super::envelope::{Collection, ResponseEnvelope, TallyMessage};
use super::repair::repair_entities;
use super::scan::find_error_marker;
use crate::errors::InfraError;

const ROOT_ELEMENT: &str = "ENVELOPE";

/// Parse a raw response body.
///
/// # Errors
/// - [`TallyError::OperationFailed`] with a status-0 response when Tally
///   reported an error and returned no entities, or when an undecodable
///   body carries a recognizable error marker
/// - [`TallyError::ResponseParseFailed`] when the body neither decodes nor
///   carries an error marker
pub fn parse_response(raw: &str) -> Result<TallyResponse> {
    match decode_envelope(raw) {
        Ok(envelope) => normalize(envelope, raw),
        Err(err) => fallback(raw, err),
    }
}

fn decode_envelope(raw: &str) -> Result<ResponseEnvelope> {
    match root_element(raw) {
        Some(name) if name == ROOT_ELEMENT => {}
        Some(name) => {
            return Err(TallyError::ResponseParseFailed(format!("unexpected root element <{name}>")))
        }
        None => return Err(TallyError::ResponseParseFailed("no root element".to_string())),
    }

    let err = match decode_xml(raw) {
        Ok(envelope) => return Ok(envelope),
        Err(err) => err,
    };

    // A single malformed record must not sink the whole export.
    let Some(repair) = repair_entities(raw) else {
        return Err(err);
    };
    warn!(
        decode_error = %err,
        repaired = repair.repaired,
        dropped = repair.dropped,
        "recovered tally response with malformed records"
    );
    decode_xml(&repair.xml)
}

fn decode_xml(xml: &str) -> Result<ResponseEnvelope> {
    quick_xml::de::from_str(xml).map_err(|err| TallyError::from(InfraError::from(err)))
}

/// Name of the first element in `raw`, skipping prolog and text.
fn root_element(raw: &str) -> Option<String> {
    let mut reader = Reader::from_str(raw);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Some(String::from_utf8_lossy(element.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn fallback(raw: &str, err: TallyError) -> Result<TallyResponse> {
    match find_error_marker(raw) {
        Some(message) => {
            warn!(
                decode_error = %err,
                error = %message,
                "undecodable tally response carried an error marker"
            );
            Err(operation_failed(message, raw, None))
        }
        None => {
            warn!(decode_error = %err, bytes = raw.len(), "failed to decode tally response");
            Err(err)
        }
    }
}

fn normalize(envelope: ResponseEnvelope, raw: &str) -> Result<TallyResponse> {
    let ResponseEnvelope { body, line_error, .. } = envelope;
    let data = body.data;

    let import_result = body.import_result.or(data.import_result);
    let error_message = non_blank(line_error)
        .or_else(|| non_blank(body.line_error))
        .or_else(|| non_blank(data.line_error))
        .or_else(|| import_result.as_ref().and_then(ImportResult::error_message));

    let collection = merge_collections(data.collections);
    let message = merge_messages(data.tally_messages);
    let has_data = collection_has_data(&collection) || message_has_data(&message);

    if let Some(message_text) = error_message.as_deref() {
        if !has_data {
            return Err(operation_failed(message_text.to_string(), raw, import_result));
        }
        warn!(error = %message_text, "tally reported an error alongside data; treating as success");
    }

    let (ledgers, ledger_source) = prefer(collection.ledgers, message.ledgers);
    let (cost_centres, cost_centre_source) = prefer(collection.cost_centres, message.cost_centres);
    let (stock_items, stock_item_source) = prefer(collection.stock_items, message.stock_items);
    let (vouchers, voucher_source) = prefer(collection.vouchers, message.vouchers);

    let response = TallyResponse {
        status: STATUS_SUCCESS,
        raw_xml: raw.to_string(),
        ledgers,
        cost_centres,
        stock_items,
        vouchers,
        import_result,
        sources: EntitySources {
            ledgers: ledger_source,
            cost_centres: cost_centre_source,
            stock_items: stock_item_source,
            vouchers: voucher_source,
        },
        ..TallyResponse::default()
    };

    debug!(
        ledgers = response.ledgers.len(),
        cost_centres = response.cost_centres.len(),
        stock_items = response.stock_items.len(),
        vouchers = response.vouchers.len(),
        "decoded tally response"
    );

    Ok(response)
}

fn operation_failed(message: String, raw: &str, import_result: Option<ImportResult>) -> TallyError {
    let mut response = TallyResponse::failure(message.clone(), raw);
    response.import_result = import_result;
    TallyError::OperationFailed { message, response: Box::new(response) }
}

/// `COLLECTION` wins when it has entities, else `TALLYMESSAGE`.
fn prefer<T>(collection: Vec<T>, message: Vec<T>) -> (Vec<T>, DataSource) {
    if !collection.is_empty() {
        (collection, DataSource::Collection)
    } else if !message.is_empty() {
        (message, DataSource::TallyMessage)
    } else {
        (Vec::new(), DataSource::None)
    }
}

fn merge_collections(collections: Vec<Collection>) -> Collection {
    collections.into_iter().fold(Collection::default(), |mut merged, next| {
        merged.ledgers.extend(next.ledgers);
        merged.cost_centres.extend(next.cost_centres);
        merged.stock_items.extend(next.stock_items);
        merged.vouchers.extend(next.vouchers);
        merged
    })
}

fn merge_messages(messages: Vec<TallyMessage>) -> TallyMessage {
    messages.into_iter().fold(TallyMessage::default(), |mut merged, next| {
        merged.ledgers.extend(next.ledgers);
        merged.cost_centres.extend(next.cost_centres);
        merged.stock_items.extend(next.stock_items);
        merged.vouchers.extend(next.vouchers);
        merged
    })
}

fn collection_has_data(collection: &Collection) -> bool {
    !(collection.ledgers.is_empty()
        && collection.cost_centres.is_empty()
        && collection.stock_items.is_empty()
        && collection.vouchers.is_empty())
}

fn message_has_data(message: &TallyMessage) -> bool {
    !(message.ledgers.is_empty()
        && message.cost_centres.is_empty()
        && message.stock_items.is_empty()
        && message.vouchers.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
