use crate::models::{ApiBody, Posting, RunSummary};

/// Events emitted by the pipeline for monitoring/logging.
///
/// The pipeline never logs from control flow; it reports these values and a
/// reporter decides how to render them.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    LedgerLoaded {
        already_applied: usize,
    },
    FetchStarted,
    PageFetched {
        start_index: u32,
        count: usize,
    },
    FetchCompleted {
        total_count: u64,
        fetched: usize,
    },
    PostingSkipped {
        posting: &'a Posting,
    },
    Submitting {
        posting: &'a Posting,
    },
    /// The target signalled a mandatory cover letter; one retry follows.
    CoverLetterRetry {
        posting: &'a Posting,
    },
    Applied {
        posting: &'a Posting,
        body: &'a ApiBody,
    },
    Rejected {
        posting: &'a Posting,
        body: &'a ApiBody,
    },
    Completed {
        summary: &'a RunSummary,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl PipelineReporter for TracingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::LedgerLoaded { already_applied } => {
                tracing::info!(%already_applied, "Ledger loaded");
            }
            PipelineEvent::FetchStarted => {
                tracing::info!("Fetching postings");
            }
            PipelineEvent::PageFetched { start_index, count } => {
                tracing::debug!(%start_index, %count, "Page fetched");
            }
            PipelineEvent::FetchCompleted {
                total_count,
                fetched,
            } => {
                tracing::info!(%total_count, %fetched, "Fetch completed");
            }
            PipelineEvent::PostingSkipped { posting } => {
                tracing::info!(id = %posting.id, title = %posting.title, "Already applied, skipping");
            }
            PipelineEvent::Submitting { posting } => {
                tracing::info!(
                    id = %posting.id,
                    title = %posting.title,
                    company = %posting.company_name,
                    "Submitting application"
                );
            }
            PipelineEvent::CoverLetterRetry { posting } => {
                tracing::warn!(
                    id = %posting.id,
                    title = %posting.title,
                    company = %posting.company_name,
                    "Cover letter required, retrying with cover letter attached"
                );
            }
            PipelineEvent::Applied { posting, body } => {
                tracing::info!(
                    id = %posting.id,
                    title = %posting.title,
                    company = %posting.company_name,
                    salary = %posting.salary_text.as_deref().unwrap_or("N/A"),
                    %body,
                    "Application sent"
                );
            }
            PipelineEvent::Rejected { posting, body } => {
                tracing::warn!(
                    id = %posting.id,
                    title = %posting.title,
                    company = %posting.company_name,
                    %body,
                    "Application rejected by the board, will not retry"
                );
            }
            PipelineEvent::Completed { summary } => {
                tracing::info!(
                    fetched = %summary.fetched,
                    applied = %summary.applied,
                    rejected = %summary.rejected,
                    skipped = %summary.skipped,
                    "Run completed"
                );
            }
        }
    }
}
