//! End-to-end driver: fetch, deduplicate, submit with pacing.

use std::time::Duration;

use chrono::Utc;

use crate::error::AppError;
use crate::events::{PipelineEvent, PipelineReporter};
use crate::models::{ApplicantProfile, Posting, RunSummary, SearchFilter, SessionCredential};
use crate::search::fetch_all_postings;
use crate::submit::{SubmitOutcome, submit_application};
use crate::traits::{ApplicationApi, Ledger, SearchApi};

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Search page size.
    pub range: u32,
    /// Delay between consecutive submissions. Skips are not paced.
    pub pace: Duration,
    /// Stored cover-letter id for the conditional retry; without one the
    /// retry is impossible and cover-letter-required postings are rejected.
    pub cover_letter_id: Option<i64>,
}

impl Default for PipelineConfig {
    /// Page size 100, 10 seconds between submissions.
    fn default() -> Self {
        Self {
            range: 100,
            pace: Duration::from_secs(10),
            cover_letter_id: None,
        }
    }
}

/// Owns the end-to-end sequence for a run. Generic over the outbound APIs
/// and the ledger so the whole flow is testable without HTTP or disk.
pub struct Pipeline<S, A, L>
where
    S: SearchApi,
    A: ApplicationApi,
    L: Ledger,
{
    search: S,
    applications: A,
    ledger: L,
    profile: ApplicantProfile,
    filter: SearchFilter,
    config: PipelineConfig,
}

impl<S, A, L> Pipeline<S, A, L>
where
    S: SearchApi,
    A: ApplicationApi,
    L: Ledger,
{
    pub fn new(
        search: S,
        applications: A,
        ledger: L,
        profile: ApplicantProfile,
        filter: SearchFilter,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            applications,
            ledger,
            profile,
            filter,
            config,
        }
    }

    /// Fetch all postings and return the ones not yet in the ledger, in
    /// fetch order. No submissions, no ledger writes.
    pub async fn plan<R: PipelineReporter>(
        &self,
        session: &SessionCredential,
        reporter: &R,
    ) -> Result<Vec<Posting>, AppError> {
        reporter.report(PipelineEvent::FetchStarted);
        let postings = fetch_all_postings(
            &self.search,
            session,
            &self.filter,
            self.config.range,
            reporter,
        )
        .await?;

        Ok(postings
            .into_iter()
            .filter(|p| !self.ledger.contains(&p.id))
            .collect())
    }

    /// Run the full pipeline: load → fetch → iterate, skipping ledger hits,
    /// submitting the rest with pacing, recording terminal outcomes.
    ///
    /// A fatal error stops the run at the offending posting with the ledger
    /// untouched for it; postings not yet reached stay eligible for a future
    /// run. Rejections are terminal per posting, recorded, and do not stop
    /// the run.
    pub async fn run<R: PipelineReporter>(
        &mut self,
        session: &SessionCredential,
        reporter: &R,
    ) -> Result<RunSummary, AppError> {
        let started_at = Utc::now();

        reporter.report(PipelineEvent::LedgerLoaded {
            already_applied: self.ledger.len(),
        });

        reporter.report(PipelineEvent::FetchStarted);
        let postings = fetch_all_postings(
            &self.search,
            session,
            &self.filter,
            self.config.range,
            reporter,
        )
        .await?;

        let mut applied = 0;
        let mut rejected = 0;
        let mut skipped = 0;

        for posting in &postings {
            if self.ledger.contains(&posting.id) {
                skipped += 1;
                reporter.report(PipelineEvent::PostingSkipped { posting });
                continue;
            }

            reporter.report(PipelineEvent::Submitting { posting });
            let outcome = submit_application(
                &self.applications,
                session,
                &self.profile,
                self.config.cover_letter_id,
                posting,
                reporter,
            )
            .await?;

            match outcome {
                SubmitOutcome::Applied { body } => {
                    self.ledger.append(&posting.id)?;
                    applied += 1;
                    reporter.report(PipelineEvent::Applied {
                        posting,
                        body: &body,
                    });
                }
                SubmitOutcome::Rejected { body } => {
                    self.ledger.append(&posting.id)?;
                    rejected += 1;
                    reporter.report(PipelineEvent::Rejected {
                        posting,
                        body: &body,
                    });
                }
            }

            tokio::time::sleep(self.config.pace).await;
        }

        let summary = RunSummary {
            fetched: postings.len(),
            applied,
            rejected,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };
        reporter.report(PipelineEvent::Completed { summary: &summary });

        Ok(summary)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}
