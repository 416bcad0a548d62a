//! Sequential replay of an orders stream through the engine.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{info, warn};

use vaxtrack_events::{Event, EventEnvelope, ShipmentEvent};

use crate::config::InsufficientInventoryPolicy;
use crate::engine::{EngineError, OrderEngine};
use crate::orders::OrdersError;
use crate::sink::SummarySink;
use crate::store::InventoryStore;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Orders(#[from] OrdersError),

    #[error("orders line {line}: {source}")]
    Engine {
        line: u64,
        #[source]
        source: EngineError,
    },

    #[error("failed to write summary output: {0}")]
    Output(#[from] io::Error),
}

/// Outcome of a completed replay.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Events applied; one summary line was written for each.
    pub processed: u64,
    /// Sends rejected for insufficient inventory under [`InsufficientInventoryPolicy::Skip`].
    pub skipped: u64,
}

/// Feed `events` to `engine` in order, writing a summary line after each.
///
/// Stops at the first fatal error. The sink is flushed on every exit path, so the
/// output holds every line produced before the failure.
pub async fn replay<S, I, W>(
    engine: &OrderEngine<S>,
    events: I,
    sink: &mut SummarySink<W>,
    policy: InsufficientInventoryPolicy,
) -> Result<ReplayReport, ReplayError>
where
    S: InventoryStore,
    I: IntoIterator<Item = Result<EventEnvelope<ShipmentEvent>, OrdersError>>,
    W: Write,
{
    let outcome = run(engine, events, sink, policy).await;
    let flushed = sink.flush();

    let report = outcome?;
    flushed?;
    info!(processed = report.processed, skipped = report.skipped, "replay finished");
    Ok(report)
}

async fn run<S, I, W>(
    engine: &OrderEngine<S>,
    events: I,
    sink: &mut SummarySink<W>,
    policy: InsufficientInventoryPolicy,
) -> Result<ReplayReport, ReplayError>
where
    S: InventoryStore,
    I: IntoIterator<Item = Result<EventEnvelope<ShipmentEvent>, OrdersError>>,
    W: Write,
{
    let mut report = ReplayReport::default();

    for envelope in events {
        let envelope = envelope?;
        let line = envelope.sequence_number();

        match engine.handle(envelope.payload()).await {
            Ok(summary) => {
                sink.write(&summary)?;
                report.processed += 1;
            }
            Err(err)
                if err.is_insufficient_inventory()
                    && policy == InsufficientInventoryPolicy::Skip =>
            {
                warn!(
                    line,
                    event_type = envelope.payload().event_type(),
                    amount = %envelope.payload().amount(),
                    error = %err,
                    "skipping event"
                );
                report.skipped += 1;
            }
            Err(source) => return Err(ReplayError::Engine { line, source }),
        }
    }

    Ok(report)
}
