//! Pagination over the posting search endpoint.

use crate::error::AppError;
use crate::events::{PipelineEvent, PipelineReporter};
use crate::models::{Posting, SearchFilter, SessionCredential};
use crate::traits::SearchApi;

/// Fetch every posting matching `filter`, eagerly, in request order.
///
/// The endpoint is page-based and only reports the total count with each
/// response. Pages of `range` are requested from offset 0 upward; the loop
/// terminates on the total reported by the *first* response. The target may
/// add or remove postings between pages, so a later page may come back short
/// or empty; whatever is returned is concatenated as-is.
///
/// Any page error aborts the whole fetch: a partial posting list would
/// silently skip eligible applications downstream.
pub async fn fetch_all_postings<S, R>(
    api: &S,
    session: &SessionCredential,
    filter: &SearchFilter,
    range: u32,
    reporter: &R,
) -> Result<Vec<Posting>, AppError>
where
    S: SearchApi,
    R: PipelineReporter,
{
    if range == 0 {
        return Err(AppError::InvalidConfig(
            "search page size must be at least 1".to_string(),
        ));
    }

    let mut postings = Vec::new();
    let mut start_index = 0u32;
    let mut first_total: Option<u64> = None;

    loop {
        let page = api.fetch_page(session, filter, range, start_index).await?;
        let total = *first_total.get_or_insert(page.total_count);

        reporter.report(PipelineEvent::PageFetched {
            start_index,
            count: page.postings.len(),
        });

        postings.extend(page.postings);
        start_index += range;

        if u64::from(start_index) >= total {
            break;
        }
    }

    reporter.report(PipelineEvent::FetchCompleted {
        total_count: first_total.unwrap_or(0),
        fetched: postings.len(),
    });

    Ok(postings)
}
