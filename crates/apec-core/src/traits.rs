use std::future::Future;

use crate::error::AppError;
use crate::models::{ApiResponse, ApplicationPayload, SearchFilter, SearchPage, SessionCredential};

/// Fetches one page of postings from the search endpoint.
pub trait SearchApi: Send + Sync + Clone {
    fn fetch_page(
        &self,
        session: &SessionCredential,
        filter: &SearchFilter,
        range: u32,
        start_index: u32,
    ) -> impl Future<Output = Result<SearchPage, AppError>> + Send;
}

/// Sends one application payload to the submission endpoint.
///
/// Transport failures (connect, timeout) are errors; any HTTP status is an
/// `Ok` response left to the protocol layer to classify.
pub trait ApplicationApi: Send + Sync + Clone {
    fn submit(
        &self,
        session: &SessionCredential,
        payload: &ApplicationPayload,
    ) -> impl Future<Output = Result<ApiResponse, AppError>> + Send;
}

/// Set of posting ids the pipeline has reached a terminal decision for.
///
/// `append` must be idempotent and must durably persist before returning, so
/// a crash mid-run loses at most the in-flight posting's state.
pub trait Ledger: Send + Sync {
    fn contains(&self, id: &str) -> bool;

    fn append(&mut self, id: &str) -> Result<(), AppError>;

    /// Ids in insertion order.
    fn ids(&self) -> &[String];

    fn len(&self) -> usize {
        self.ids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
