//! Question API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use meli_pulse_core::{InboxQuestion, QuestionFilter, QuestionId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{engine::Diagnostics, error::AppError, state::AppState};

/// Longest answer the marketplace accepts.
const MAX_ANSWER_CHARS: usize = 2000;

/// Inbox page size used when `limit` is not given.
const DEFAULT_INBOX_LIMIT: usize = 20;

/// Largest inbox page accepted from clients.
const MAX_INBOX_LIMIT: usize = 100;

/// Build the questions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/questions", get(list_questions))
        .route("/api/questions/answer", post(answer_question))
}

/// Inbox query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    /// `answered`, `unanswered` or `all`; all questions when absent.
    pub status: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl InboxQuery {
    /// The requested status filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown status.
    pub fn filter(&self) -> Result<Option<QuestionFilter>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(status) if status.eq_ignore_ascii_case("all") => Ok(None),
            Some(status) => status
                .parse::<QuestionFilter>()
                .map(Some)
                .map_err(|e| AppError::BadRequest(e.to_string())),
        }
    }

    /// The requested page size.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `limit` is outside `1..=100`.
    pub fn limit(&self) -> Result<usize, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_INBOX_LIMIT);
        if !(1..=MAX_INBOX_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_INBOX_LIMIT}"
            )));
        }
        Ok(limit)
    }
}

/// One page of the question inbox.
#[derive(Debug, Serialize)]
pub struct QuestionInboxResponse {
    pub questions: Vec<InboxQuestion>,
    /// Questions matching the filter across all pages.
    pub total: usize,
    pub has_more: bool,
    pub diagnostics: Diagnostics,
}

impl QuestionInboxResponse {
    fn page(
        questions: Vec<InboxQuestion>,
        offset: usize,
        limit: usize,
        diagnostics: Diagnostics,
    ) -> Self {
        let total = questions.len();
        let questions: Vec<InboxQuestion> =
            questions.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(questions.len()) < total;

        Self {
            questions,
            total,
            has_more,
            diagnostics,
        }
    }
}

/// The seller's question inbox with listing titles and SKUs.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unknown status or limit.
#[instrument(skip(state))]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<QuestionInboxResponse>, AppError> {
    let filter = query.filter()?;
    let limit = query.limit()?;
    let report = state.engine().get_questions(filter).await;

    Ok(Json(QuestionInboxResponse::page(
        report.value,
        query.offset.unwrap_or(0),
        limit,
        report.diagnostics,
    )))
}

/// Request for answering a question.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub answer: String,
}

/// Response for an answered question.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub success: bool,
}

impl AnswerRequest {
    /// The trimmed answer text.
    fn text(&self) -> Result<&str, AppError> {
        let text = self.answer.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("answer must not be empty".to_string()));
        }
        if text.chars().count() > MAX_ANSWER_CHARS {
            return Err(AppError::BadRequest(format!(
                "answer must be at most {MAX_ANSWER_CHARS} characters"
            )));
        }
        Ok(text)
    }
}

/// Post the seller's answer to a buyer question.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty answer, or
/// `AppError::Marketplace` if the marketplace rejects it.
#[instrument(skip(state, body), fields(question_id = %body.question_id))]
pub async fn answer_question(
    State(state): State<AppState>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let text = body.text()?;
    state
        .marketplace()
        .answer_question(&body.question_id, text)
        .await?;

    Ok(Json(AnswerResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use meli_pulse_core::Question;
    use serde_json::json;

    use super::*;

    fn inbox(count: u64) -> Vec<InboxQuestion> {
        (1..=count)
            .map(|id| {
                let question: Question =
                    serde_json::from_value(json!({"id": id, "text": "¿Envían a Córdoba?"})).unwrap();
                InboxQuestion {
                    question,
                    item_title: None,
                    item_sku: None,
                }
            })
            .collect()
    }

    #[test]
    fn test_inbox_status_parsing() {
        let status = |s: &str| InboxQuery {
            status: Some(s.to_string()),
            ..InboxQuery::default()
        };

        assert_eq!(InboxQuery::default().filter().unwrap(), None);
        assert_eq!(status("all").filter().unwrap(), None);
        assert_eq!(status("UNANSWERED").filter().unwrap(), Some(QuestionFilter::Unanswered));
        assert_eq!(status("answered").filter().unwrap(), Some(QuestionFilter::Answered));
        assert!(matches!(status("closed").filter(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_inbox_limit_defaults_and_bounds() {
        assert_eq!(InboxQuery::default().limit().unwrap(), 20);
        for limit in [0, 101] {
            let query = InboxQuery {
                limit: Some(limit),
                ..InboxQuery::default()
            };
            assert!(matches!(query.limit(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_inbox_page_slices_and_reports_more() {
        let first = QuestionInboxResponse::page(inbox(25), 0, 20, Diagnostics::default());
        assert_eq!(first.questions.len(), 20);
        assert_eq!(first.total, 25);
        assert!(first.has_more);

        let last = QuestionInboxResponse::page(inbox(25), 20, 20, Diagnostics::default());
        assert_eq!(last.questions.len(), 5);
        assert_eq!(last.questions[0].question.id.as_str(), "21");
        assert!(!last.has_more);

        let past_end = QuestionInboxResponse::page(inbox(3), 10, 20, Diagnostics::default());
        assert!(past_end.questions.is_empty());
        assert!(!past_end.has_more);
    }

    #[test]
    fn test_answer_request_accepts_numeric_id() {
        let body: AnswerRequest =
            serde_json::from_str(r#"{"question_id": 123456, "answer": "  Sí, tenemos stock  "}"#)
                .unwrap();

        assert_eq!(body.question_id.as_str(), "123456");
        assert_eq!(body.text().unwrap(), "Sí, tenemos stock");
    }

    #[test]
    fn test_blank_answer_is_rejected() {
        let body = AnswerRequest {
            question_id: QuestionId::new("1"),
            answer: "   ".to_string(),
        };
        assert!(matches!(body.text(), Err(AppError::BadRequest(_))));
    }
}
