//! Orders input: one shipment event per non-blank line.

use std::io::BufRead;

use thiserror::Error;

use vaxtrack_events::{EventEnvelope, EventParseError, ShipmentEvent};

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("failed to read orders input: {0}")]
    Io(#[from] std::io::Error),

    #[error("orders line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: EventParseError,
    },
}

/// Lazily parse `reader` into events tagged with their 1-based line number.
///
/// Blank lines are skipped. The iterator yields an error for the first malformed
/// line; callers stop there.
pub fn read_events<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<EventEnvelope<ShipmentEvent>, OrdersError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line_no = idx as u64 + 1;
            match line {
                Err(err) => Some(Err(OrdersError::Io(err))),
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(
                    ShipmentEvent::parse_line(&text)
                        .map(|event| EventEnvelope::new(line_no, event))
                        .map_err(|source| OrdersError::Parse {
                            line: line_no,
                            source,
                        }),
                ),
            }
        })
}
