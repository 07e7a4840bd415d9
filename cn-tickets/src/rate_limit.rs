use crate::adapter::{TicketOutcome, TrackerAdapter};
use cn_core::PlanItem;
use std::time::Duration;

/// Paced delay before each marker search (read traffic is cheap but still
/// throttled to stay well under tracker rate limits on large plans).
pub const READ_DELAY_MS: u64 = 200;

/// At most this many ticket writes (create/reopen) run concurrently.
pub const MAX_CONCURRENT_WRITES: usize = 2;

/// Pause between write batches, on top of the per-write concurrency cap.
pub const BATCH_DELAY_MS: u64 = 500;

/// Single retry after a fixed backoff when the tracker reports rate
/// limiting; the backoff is either whatever the retry hint says or this
/// fixed fallback.
pub const RATE_LIMIT_FALLBACK_BACKOFF_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct TicketResult {
    pub finding_id: String,
    pub outcome: Result<TicketOutcome, String>,
}

/// Files one ticket per plan item against `adapter`, deduplicating via
/// `search_by_marker` first. Reads are sequential and paced; writes run in
/// capped-concurrency batches with a pause between batches. A single
/// item's failure (including rate-limit retry exhaustion) is recorded and
/// the batch continues — one bad ticket never aborts the rest of the plan.
///
/// `reopen_closed` governs what happens when the duplicate found for an
/// item is closed: `true` reopens it, `false` leaves it closed and reports
/// `SkippedAsDuplicate`. Label policy is not a parameter here — each
/// adapter already carries the `LabelPolicy` it was constructed with and
/// branches on it inside `ensure_labels`.
pub async fn file_tickets(
    adapter: &dyn TrackerAdapter,
    items: &[PlanItem],
    reopen_closed: bool,
) -> Vec<TicketResult> {
    let mut results = Vec::with_capacity(items.len());

    for chunk in items.chunks(MAX_CONCURRENT_WRITES) {
        let mut batch = Vec::with_capacity(chunk.len());
        for item in chunk {
            tokio::time::sleep(Duration::from_millis(READ_DELAY_MS)).await;
            batch.push(file_one(adapter, item, reopen_closed));
        }
        let outcomes = futures::future::join_all(batch).await;
        results.extend(outcomes);

        if !results.is_empty() {
            tokio::time::sleep(Duration::from_millis(BATCH_DELAY_MS)).await;
        }
    }

    results
}

async fn file_one(adapter: &dyn TrackerAdapter, item: &PlanItem, reopen_closed: bool) -> TicketResult {
    let outcome = file_one_inner(adapter, item, reopen_closed).await;
    TicketResult {
        finding_id: item.finding_id.clone(),
        outcome: outcome.map_err(|e| e.to_string()),
    }
}

async fn file_one_inner(
    adapter: &dyn TrackerAdapter,
    item: &PlanItem,
    reopen_closed: bool,
) -> cn_core::CnResult<TicketOutcome> {
    if let Some(existing) = adapter.search_by_marker(&item.dedupe_query).await? {
        if existing.is_open {
            return Ok(TicketOutcome::AlreadyOpen {
                id: existing.id,
                url: existing.url,
            });
        }
        if !reopen_closed {
            return Ok(TicketOutcome::SkippedAsDuplicate {
                id: existing.id,
                url: existing.url,
            });
        }
        adapter.reopen(&existing.id).await?;
        return Ok(TicketOutcome::ReopenedExisting {
            id: existing.id,
            url: existing.url,
        });
    }

    adapter.ensure_labels(&item.labels).await?;

    adapter.create_issue(&item.title, &item.body, &item.labels).await
}
