//! Test utilities: mock implementations of the outbound API traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::events::{PipelineEvent, PipelineReporter};
use crate::models::{
    ApiBody, ApiResponse, ApplicantProfile, ApplicationPayload, Posting, SearchFilter, SearchPage,
    SessionCredential,
};
use crate::traits::{ApplicationApi, SearchApi};

// ---------------------------------------------------------------------------
// MockSearchApi
// ---------------------------------------------------------------------------

/// Mock search endpoint with a scripted queue of pages. Each call pops the
/// first element; an exhausted queue serves an empty result set. Records the
/// requested offsets for pagination assertions.
#[derive(Clone)]
pub struct MockSearchApi {
    pages: Arc<Mutex<Vec<Result<SearchPage, AppError>>>>,
    offsets: Arc<Mutex<Vec<u32>>>,
}

impl MockSearchApi {
    pub fn with_pages(pages: Vec<Result<SearchPage, AppError>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages)),
            offsets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requested_offsets(&self) -> Vec<u32> {
        self.offsets.lock().unwrap().clone()
    }
}

impl SearchApi for MockSearchApi {
    async fn fetch_page(
        &self,
        _session: &SessionCredential,
        _filter: &SearchFilter,
        _range: u32,
        start_index: u32,
    ) -> Result<SearchPage, AppError> {
        self.offsets.lock().unwrap().push(start_index);
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            Ok(SearchPage {
                total_count: 0,
                postings: Vec::new(),
            })
        } else {
            pages.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockApplicationApi
// ---------------------------------------------------------------------------

/// Mock application endpoint with a scripted queue of responses. Records
/// every payload it receives so tests can assert on the retry protocol.
#[derive(Clone)]
pub struct MockApplicationApi {
    responses: Arc<Mutex<Vec<Result<ApiResponse, AppError>>>>,
    received: Arc<Mutex<Vec<ApplicationPayload>>>,
}

impl MockApplicationApi {
    pub fn with_responses(responses: Vec<Result<ApiResponse, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn received_payloads(&self) -> Vec<ApplicationPayload> {
        self.received.lock().unwrap().clone()
    }
}

impl ApplicationApi for MockApplicationApi {
    async fn submit(
        &self,
        _session: &SessionCredential,
        payload: &ApplicationPayload,
    ) -> Result<ApiResponse, AppError> {
        self.received.lock().unwrap().push(payload.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(json_response(200, "{}"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records event labels.
#[derive(Default)]
pub struct RecordingReporter {
    labels: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl PipelineReporter for RecordingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let label = match &event {
            PipelineEvent::LedgerLoaded { .. } => "LedgerLoaded",
            PipelineEvent::FetchStarted => "FetchStarted",
            PipelineEvent::PageFetched { .. } => "PageFetched",
            PipelineEvent::FetchCompleted { .. } => "FetchCompleted",
            PipelineEvent::PostingSkipped { .. } => "PostingSkipped",
            PipelineEvent::Submitting { .. } => "Submitting",
            PipelineEvent::CoverLetterRetry { .. } => "CoverLetterRetry",
            PipelineEvent::Applied { .. } => "Applied",
            PipelineEvent::Rejected { .. } => "Rejected",
            PipelineEvent::Completed { .. } => "Completed",
        };
        self.labels.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

pub fn make_session() -> SessionCredential {
    SessionCredential::new("apec_activity_cookie=abc; JSESSIONID=def")
}

pub fn make_profile() -> ApplicantProfile {
    ApplicantProfile::new("cadre-test", "cv-test")
}

pub fn make_posting(id: &str) -> Posting {
    Posting {
        id: id.to_string(),
        title: format!("Développeur {id}"),
        company_name: "ACME".to_string(),
        salary_text: Some("40 - 45 k€".to_string()),
    }
}

pub fn make_page(total_count: u64, ids: &[&str]) -> SearchPage {
    SearchPage {
        total_count,
        postings: ids.iter().map(|id| make_posting(id)).collect(),
    }
}

pub fn json_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: ApiBody::parse(body),
    }
}

pub fn text_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: ApiBody::Text(body.to_string()),
    }
}

/// The 400 response that triggers the cover-letter retry.
pub fn cover_letter_required() -> ApiResponse {
    json_response(400, r#"{"candidatureLM": "obligatoire"}"#)
}
