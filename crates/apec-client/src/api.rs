use std::time::Duration;

use apec_core::error::AppError;
use apec_core::models::{
    ApiBody, ApiResponse, ApplicationPayload, SearchFilter, SearchPage, SessionCredential,
};
use apec_core::traits::{ApplicationApi, SearchApi};
use reqwest::Client;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.apec.fr";
const SEARCH_PATH: &str = "/cms/webservices/rechercheOffre";
const SUBMIT_PATH: &str = "/cms/webservices/candidature/avecCompte";
const APPLY_REFERER: &str =
    "https://www.apec.fr/candidat/recherche-emploi/postuler-a-une-offre.html";

/// The board rejects requests that do not look like its own web front end,
/// so both endpoints get a fixed browser-like header set.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the two Apec webservice endpoints.
///
/// Implements [`SearchApi`] and [`ApplicationApi`] on top of one
/// `reqwest::Client`. The session cookie is attached per request; the client
/// itself holds no credential state.
#[derive(Clone, Debug)]
pub struct ApecClient {
    client: Client,
    search_url: Url,
    submit_url: Url,
    timeout_secs: u64,
}

impl ApecClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different origin (e.g. a local mock of the
    /// board for integration testing).
    pub fn with_base_url(base: &str) -> Result<Self, AppError> {
        Self::build(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(self.search_url.origin().ascii_serialization().as_str(), timeout)
    }

    fn build(base: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base)
            .map_err(|e| AppError::InvalidConfig(format!("invalid base URL '{base}': {e}")))?;
        let join = |path: &str| {
            base_url
                .join(path)
                .map_err(|e| AppError::InvalidConfig(format!("invalid endpoint path: {e}")))
        };

        let origin = base_url.origin().ascii_serialization();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&origin)
                .map_err(|e| AppError::InvalidConfig(format!("invalid origin header: {e}")))?,
        );

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            client,
            search_url: join(SEARCH_PATH)?,
            submit_url: join(SUBMIT_PATH)?,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::Network(format!("Connection failed: {e}"))
        } else {
            AppError::Network(e.to_string())
        }
    }
}

// ---- Wire types ----

#[derive(Serialize)]
struct SearchRequest<'a> {
    #[serde(flatten)]
    filter: &'a SearchFilter,
    pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    range: u32,
    start_index: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    total_count: u64,
    /// Missing on an over-fetched page past the true end of the result set.
    #[serde(default)]
    resultats: Vec<apec_core::models::Posting>,
}

impl SearchApi for ApecClient {
    async fn fetch_page(
        &self,
        session: &SessionCredential,
        filter: &SearchFilter,
        range: u32,
        start_index: u32,
    ) -> Result<SearchPage, AppError> {
        let request = SearchRequest {
            filter,
            pagination: Pagination { range, start_index },
        };

        tracing::debug!(%start_index, %range, "Requesting search page");
        let response = self
            .client
            .post(self.search_url.clone())
            .header(COOKIE, session.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => AppError::SessionInvalid { body: raw },
                403 => AppError::AccessDenied { body: raw },
                code => AppError::UnexpectedStatus {
                    status: code,
                    body: raw,
                },
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&raw)?;
        Ok(SearchPage {
            total_count: parsed.total_count,
            postings: parsed.resultats,
        })
    }
}

impl ApplicationApi for ApecClient {
    async fn submit(
        &self,
        session: &SessionCredential,
        payload: &ApplicationPayload,
    ) -> Result<ApiResponse, AppError> {
        tracing::debug!(id_offre = %payload.id_offre, with_cover_letter = %payload.id_lm.is_some(), "Posting application");
        let response = self
            .client
            .post(self.submit_url.clone())
            .header(COOKIE, session.as_str())
            .header(REFERER, APPLY_REFERER)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response body: {e}")))?;

        // Every HTTP status is a classifiable answer here; only transport
        // failures are errors.
        Ok(ApiResponse {
            status,
            body: ApiBody::parse(&raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_derive_from_base_url() {
        let client = ApecClient::new().unwrap();
        assert_eq!(
            client.search_url.as_str(),
            "https://www.apec.fr/cms/webservices/rechercheOffre"
        );
        assert_eq!(
            client.submit_url.as_str(),
            "https://www.apec.fr/cms/webservices/candidature/avecCompte"
        );

        let local = ApecClient::with_base_url("http://localhost:8080").unwrap();
        assert_eq!(
            local.search_url.as_str(),
            "http://localhost:8080/cms/webservices/rechercheOffre"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = ApecClient::with_base_url("not a url").unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_search_request_wire_shape() {
        let filter = SearchFilter::default();
        let request = SearchRequest {
            filter: &filter,
            pagination: Pagination {
                range: 100,
                start_index: 200,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["pagination"]["range"], 100);
        assert_eq!(value["pagination"]["startIndex"], 200);
        // Filter fields are flattened next to the pagination object.
        assert_eq!(value["typeClient"], "CADRE");
        assert_eq!(value["activeFiltre"], true);
    }

    #[test]
    fn test_search_response_tolerates_missing_resultats() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"totalCount": 12}"#).unwrap();
        assert_eq!(parsed.total_count, 12);
        assert!(parsed.resultats.is_empty());
    }
}
