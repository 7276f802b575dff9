//! Recovery for envelopes whose records do not decode
//!
//! Tally sometimes repeats a scalar tag inside one record
//! (`<PARENT>A</PARENT><PARENT>B</PARENT>`), which the typed decoder rejects
//! for the whole envelope. Each record under `COLLECTION` or `TALLYMESSAGE`
//! is checked on its own: repeated leaf tags keep their last value, and a
//! record that still does not decode is dropped.

use std::ops::Range;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use tallybridge_domain::{CostCentre, Ledger, StockItem, TallyError, Voucher};
use tracing::warn;

use crate::errors::InfraError;

const ENTITY_CONTAINERS: [&str; 2] = ["COLLECTION", "TALLYMESSAGE"];
const ENTITY_TAGS: [&str; 4] = ["LEDGER", "COSTCENTRE", "STOCKITEM", "VOUCHER"];

/// Leaf tags that form lists and may repeat.
const REPEATABLE_LEAVES: [&str; 1] = ["ADDRESS"];

/// A rewritten document plus what was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub xml: String,
    /// Records kept after dropping superseded duplicate tags.
    pub repaired: usize,
    /// Records removed because they did not decode even after repair.
    pub dropped: usize,
}

/// Rewrite `raw` so that every record decodes on its own.
///
/// Returns `None` when nothing needed changing or `raw` is not well-formed.
pub fn repair_entities(raw: &str) -> Option<Repair> {
    let mut reader = Reader::from_str(raw);
    let mut open: Vec<String> = Vec::new();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let (mut repaired, mut dropped) = (0, 0);

    loop {
        let start = position(&reader);
        let (name, span) = match reader.read_event().ok()? {
            Event::Start(element) => {
                let name = element_name(element.name().as_ref());
                if !is_entity(&open, &name) {
                    open.push(name);
                    continue;
                }
                let end = element.to_end().into_owned();
                reader.read_to_end(end.name()).ok()?;
                (name, start..position(&reader))
            }
            Event::Empty(element) => {
                let name = element_name(element.name().as_ref());
                if !is_entity(&open, &name) {
                    continue;
                }
                (name, start..position(&reader))
            }
            Event::End(_) => {
                open.pop();
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let record = raw.get(span.clone())?;
        match check_entity(&name, record) {
            EntityCheck::Decodes => {}
            EntityCheck::Repaired(fixed) => {
                repaired += 1;
                edits.push((span, fixed));
            }
            EntityCheck::Unusable(err) => {
                warn!(tag = %name, error = %err, "dropping tally record that does not decode");
                dropped += 1;
                edits.push((span, String::new()));
            }
        }
    }

    if edits.is_empty() {
        return None;
    }
    Some(Repair { xml: apply_edits(raw, &edits), repaired, dropped })
}

enum EntityCheck {
    Decodes,
    Repaired(String),
    Unusable(TallyError),
}

fn check_entity(tag: &str, record: &str) -> EntityCheck {
    let Err(err) = decode_as(tag, record) else {
        return EntityCheck::Decodes;
    };

    match keep_last_leaves(record) {
        Some(fixed) if decode_as(tag, &fixed).is_ok() => EntityCheck::Repaired(fixed),
        _ => EntityCheck::Unusable(err),
    }
}

fn decode_as(tag: &str, record: &str) -> Result<(), TallyError> {
    match tag {
        "LEDGER" => decodes::<Ledger>(record),
        "COSTCENTRE" => decodes::<CostCentre>(record),
        "STOCKITEM" => decodes::<StockItem>(record),
        _ => decodes::<Voucher>(record),
    }
}

fn decodes<T: DeserializeOwned>(record: &str) -> Result<(), TallyError> {
    quick_xml::de::from_str::<T>(record)
        .map(drop)
        .map_err(|err| TallyError::from(InfraError::from(err)))
}

struct Child {
    name: String,
    span: Range<usize>,
    leaf: bool,
}

struct Frame {
    name: String,
    start: usize,
    children: Vec<Child>,
}

/// Remove every leaf element that a later sibling of the same name
/// overrides. `None` if there is nothing to remove.
fn keep_last_leaves(record: &str) -> Option<String> {
    let mut reader = Reader::from_str(record);
    let mut frames: Vec<Frame> = Vec::new();
    let mut superseded: Vec<(Range<usize>, String)> = Vec::new();

    loop {
        let start = position(&reader);
        match reader.read_event().ok()? {
            Event::Start(element) => frames.push(Frame {
                name: element_name(element.name().as_ref()),
                start,
                children: Vec::new(),
            }),
            Event::Empty(element) => {
                if let Some(parent) = frames.last_mut() {
                    parent.children.push(Child {
                        name: element_name(element.name().as_ref()),
                        span: start..position(&reader),
                        leaf: true,
                    });
                }
            }
            Event::End(_) => {
                let frame = frames.pop()?;
                superseded.extend(
                    superseded_leaves(&frame.children).map(|span| (span, String::new())),
                );
                if let Some(parent) = frames.last_mut() {
                    parent.children.push(Child {
                        name: frame.name,
                        span: frame.start..position(&reader),
                        leaf: frame.children.is_empty(),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if superseded.is_empty() {
        return None;
    }
    superseded.sort_by_key(|(span, _)| span.start);
    Some(apply_edits(record, &superseded))
}

fn superseded_leaves(children: &[Child]) -> impl Iterator<Item = Range<usize>> + '_ {
    children
        .iter()
        .enumerate()
        .filter(move |(index, child)| {
            child.leaf
                && !is_repeatable(&child.name)
                && children[index + 1..].iter().any(|later| later.leaf && later.name == child.name)
        })
        .map(|(_, child)| child.span.clone())
}

fn is_repeatable(name: &str) -> bool {
    REPEATABLE_LEAVES.contains(&name) || name.ends_with(".LIST")
}

fn is_entity(open: &[String], name: &str) -> bool {
    ENTITY_TAGS.contains(&name)
        && open.last().is_some_and(|parent| ENTITY_CONTAINERS.contains(&parent.as_str()))
}

/// Replace sorted, non-overlapping spans of `source`.
fn apply_edits(source: &str, edits: &[(Range<usize>, String)]) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        output.push_str(&source[cursor..span.start]);
        output.push_str(replacement);
        cursor = span.end;
    }
    output.push_str(&source[cursor..]);
    output
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
