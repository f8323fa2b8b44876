//! The submit-with-conditional-retry protocol for one posting.

use crate::error::AppError;
use crate::events::{PipelineEvent, PipelineReporter};
use crate::models::{
    ApiBody, ApiResponse, ApplicantProfile, ApplicationPayload, Posting, SessionCredential,
};
use crate::traits::ApplicationApi;

/// Closed classification of one application response. Produced by
/// [`classify`] alone; everything downstream switches on this instead of
/// matching status integers or magic body fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx. The body is informational only.
    Success,
    /// 400 with the body signalling a mandatory cover letter for this posting.
    CoverLetterRequired,
    /// Any other 400: the board judged the request structurally invalid.
    ValidationRejected,
    /// 401.
    SessionInvalid,
    /// 403.
    AccessDenied,
    /// 404.
    PostingNotFound,
    /// Anything else.
    Unexpected,
}

/// Field the board sets on a 400 response when a cover letter is mandatory.
const COVER_LETTER_FIELD: &str = "candidatureLM";
const COVER_LETTER_REQUIRED: &str = "obligatoire";

pub fn classify(response: &ApiResponse) -> ResponseClass {
    match response.status {
        200..=299 => ResponseClass::Success,
        400 => {
            if response.body.str_field(COVER_LETTER_FIELD) == Some(COVER_LETTER_REQUIRED) {
                ResponseClass::CoverLetterRequired
            } else {
                ResponseClass::ValidationRejected
            }
        }
        401 => ResponseClass::SessionInvalid,
        403 => ResponseClass::AccessDenied,
        404 => ResponseClass::PostingNotFound,
        _ => ResponseClass::Unexpected,
    }
}

/// Terminal, non-fatal outcome of the protocol for one posting. Both
/// variants must be recorded in the ledger so the posting is never touched
/// again in a future run.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Applied { body: ApiBody },
    Rejected { body: ApiBody },
}

/// Run the two-state submit protocol for one posting.
///
/// POSTs the base payload, and if the board answers 400 with the
/// cover-letter-required signal, POSTs once more with the cover-letter id
/// attached. The final response alone is classified: a retry that itself
/// signals cover-letter-required is a plain rejection, never a third attempt.
/// Without a configured cover-letter id the retry is impossible and the
/// first response is terminal.
///
/// Fatal classes (401/403/404/anything unrecognised) become errors carrying
/// the status and raw or parsed body; the caller must not record the posting
/// as handled in that case.
pub async fn submit_application<A, R>(
    api: &A,
    session: &SessionCredential,
    profile: &ApplicantProfile,
    cover_letter_id: Option<i64>,
    posting: &Posting,
    reporter: &R,
) -> Result<SubmitOutcome, AppError>
where
    A: ApplicationApi,
    R: PipelineReporter,
{
    let payload = ApplicationPayload::base(profile.clone(), &posting.id);
    let mut response = api.submit(session, &payload).await?;

    if classify(&response) == ResponseClass::CoverLetterRequired {
        if let Some(id_lm) = cover_letter_id {
            reporter.report(PipelineEvent::CoverLetterRetry { posting });
            let retry_payload = payload.with_cover_letter(id_lm);
            response = api.submit(session, &retry_payload).await?;
        }
    }

    let class = classify(&response);
    let ApiResponse { status, body } = response;

    match class {
        ResponseClass::Success => Ok(SubmitOutcome::Applied { body }),
        ResponseClass::ValidationRejected | ResponseClass::CoverLetterRequired => {
            Ok(SubmitOutcome::Rejected { body })
        }
        ResponseClass::SessionInvalid => Err(AppError::SessionInvalid {
            body: body.to_string(),
        }),
        ResponseClass::AccessDenied => Err(AppError::AccessDenied {
            body: body.to_string(),
        }),
        ResponseClass::PostingNotFound => Err(AppError::PostingNotFound {
            body: body.to_string(),
        }),
        ResponseClass::Unexpected => Err(AppError::UnexpectedStatus {
            status,
            body: body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        MockApplicationApi, RecordingReporter, cover_letter_required, json_response, make_posting,
        make_profile, make_session, text_response,
    };

    fn class_of(status: u16, body: &str) -> ResponseClass {
        classify(&ApiResponse {
            status,
            body: ApiBody::parse(body),
        })
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(class_of(200, "{}"), ResponseClass::Success);
        assert_eq!(class_of(201, "created"), ResponseClass::Success);
        assert_eq!(
            class_of(400, r#"{"candidatureLM": "obligatoire"}"#),
            ResponseClass::CoverLetterRequired
        );
        assert_eq!(
            class_of(400, r#"{"salaire": "invalide"}"#),
            ResponseClass::ValidationRejected
        );
        // The signal only counts with the exact value.
        assert_eq!(
            class_of(400, r#"{"candidatureLM": "fournie"}"#),
            ResponseClass::ValidationRejected
        );
        // A text body cannot carry the signal.
        assert_eq!(
            class_of(400, "candidatureLM obligatoire"),
            ResponseClass::ValidationRejected
        );
        assert_eq!(class_of(401, "{}"), ResponseClass::SessionInvalid);
        assert_eq!(class_of(403, "{}"), ResponseClass::AccessDenied);
        assert_eq!(class_of(404, "{}"), ResponseClass::PostingNotFound);
        assert_eq!(class_of(500, "{}"), ResponseClass::Unexpected);
        assert_eq!(class_of(302, ""), ResponseClass::Unexpected);
    }

    #[tokio::test]
    async fn success_applies_without_retry() {
        let api = MockApplicationApi::with_responses(vec![Ok(json_response(
            200,
            r#"{"statut": "envoyee"}"#,
        ))]);
        let posting = make_posting("174514W");

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &posting,
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Applied { .. }));
        let sent = api.received_payloads();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id_offre, "174514W");
        assert_eq!(sent[0].id_lm, None);
    }

    #[tokio::test]
    async fn unparsable_success_body_is_still_applied() {
        let api = MockApplicationApi::with_responses(vec![Ok(text_response(200, "<html>ok"))]);

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            None,
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn cover_letter_signal_triggers_exactly_one_retry() {
        let api = MockApplicationApi::with_responses(vec![
            Ok(cover_letter_required()),
            Ok(json_response(200, "{}")),
        ]);
        let reporter = RecordingReporter::new();

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &make_posting("174514W"),
            &reporter,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Applied { .. }));
        let sent = api.received_payloads();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].id_lm, None);
        assert_eq!(sent[1].id_lm, Some(42));
        assert_eq!(sent[1].id_offre, "174514W");
        assert!(reporter.labels().contains(&"CoverLetterRetry".to_string()));
    }

    #[tokio::test]
    async fn retry_response_alone_determines_the_outcome() {
        let api = MockApplicationApi::with_responses(vec![
            Ok(cover_letter_required()),
            Ok(json_response(400, r#"{"cv": "invalide"}"#)),
        ]);

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn no_third_attempt_when_retry_also_requires_cover_letter() {
        let api = MockApplicationApi::with_responses(vec![
            Ok(cover_letter_required()),
            Ok(cover_letter_required()),
        ]);

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(api.received_payloads().len(), 2);
    }

    #[tokio::test]
    async fn without_cover_letter_id_the_signal_is_a_rejection() {
        let api = MockApplicationApi::with_responses(vec![Ok(cover_letter_required())]);

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            None,
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(api.received_payloads().len(), 1);
    }

    #[tokio::test]
    async fn plain_rejection_does_not_retry() {
        let api =
            MockApplicationApi::with_responses(vec![Ok(json_response(400, r#"{"cv": "absent"}"#))]);

        let outcome = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(api.received_payloads().len(), 1);
    }

    #[tokio::test]
    async fn authorization_failure_is_fatal() {
        let api = MockApplicationApi::with_responses(vec![Ok(json_response(
            401,
            r#"{"message": "non autorise"}"#,
        ))]);

        let err = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            Some(42),
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_session_failure());
        assert!(err.to_string().contains("non autorise"));
    }

    #[tokio::test]
    async fn unexpected_status_carries_status_and_body() {
        let api = MockApplicationApi::with_responses(vec![Ok(text_response(502, "Bad Gateway"))]);

        let err = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            None,
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap_err();

        match err {
            AppError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let api =
            MockApplicationApi::with_responses(vec![Err(AppError::Network("refused".into()))]);

        let err = submit_application(
            &api,
            &make_session(),
            &make_profile(),
            None,
            &make_posting("174514W"),
            &RecordingReporter::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Network(_)));
    }
}
