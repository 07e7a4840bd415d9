use async_trait::async_trait;
use cn_core::CnResult;

/// Outcome of filing one ticket, reported back per `PlanItem` so
/// `create_tickets` can summarise created-vs-reopened-vs-already-open counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    Created { id: String, url: String },
    ReopenedExisting { id: String, url: String },
    AlreadyOpen { id: String, url: String },
    /// A closed duplicate was found but `reopenClosed` was false, so it was
    /// left closed rather than reopened.
    SkippedAsDuplicate { id: String, url: String },
}

/// One existing ticket found by a marker search, enough information for the
/// caller to decide whether to reopen it.
#[derive(Debug, Clone)]
pub struct ExistingTicket {
    pub id: String,
    pub url: String,
    pub is_open: bool,
}

/// The common surface GitHub Issues and Jira both implement. Credentials
/// are read from the environment by each adapter's constructor, never
/// threaded through call sites.
#[async_trait]
pub trait TrackerAdapter: Send + Sync {
    /// Finds an existing ticket whose body contains `dedupe_query`
    /// (typically the `CN-FINDING-ID:` marker line), if any.
    async fn search_by_marker(&self, dedupe_query: &str) -> CnResult<Option<ExistingTicket>>;

    /// Reopens a closed ticket, idempotent if it is already open.
    async fn reopen(&self, id: &str) -> CnResult<()>;

    /// Ensures `labels` exist on the tracker, honoring the configured
    /// label policy (create-if-missing vs require-existing).
    async fn ensure_labels(&self, labels: &[String]) -> CnResult<()>;

    /// Creates a new ticket with the given title/body/labels.
    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> CnResult<TicketOutcome>;
}

/// How the adapter should behave when a `PlanItem`'s labels do not already
/// exist on the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    RequireExisting,
    CreateIfMissing,
}
