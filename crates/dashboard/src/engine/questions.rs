//! Buyer question engagement metrics.

use meli_pulse_core::{InboxQuestion, Question, QuestionFilter, QuestionSnapshot};

use super::fetcher::fetch_all;
use super::items::ItemCache;
use super::sku::resolve_product_sku;
use super::{Diagnostics, MetricsEngine, Report};
use crate::mercadolibre::MarketplaceApi;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

impl<A: MarketplaceApi> MetricsEngine<A> {
    /// Question metrics over every question the seller received.
    pub async fn get_questions_metrics(&self) -> QuestionSnapshot {
        self.questions_metrics_report().await.value
    }

    /// Question metrics with diagnostics.
    pub async fn questions_metrics_report(&self) -> Report<QuestionSnapshot> {
        self.within_deadline("questions_metrics", QuestionSnapshot::zero(), async {
            self.list_questions(None)
                .await
                .map(|questions| summarize_questions(&questions))
        })
        .await
    }

    /// The seller's question inbox, newest first.
    ///
    /// `filter` narrows to answered or unanswered questions. Each question
    /// carries the title and SKU of its listing, which is fetched once per
    /// listing.
    pub async fn get_questions(
        &self,
        filter: Option<QuestionFilter>,
    ) -> Report<Vec<InboxQuestion>> {
        self.within_deadline("get_questions", Vec::new(), async {
            let Report {
                value: questions,
                mut diagnostics,
            } = self.list_questions(filter).await;

            let mut items = ItemCache::new(&self.api);
            let mut inbox = Vec::with_capacity(questions.len());
            for question in questions {
                let product = match &question.item_id {
                    Some(item_id) => items.get(item_id).await,
                    None => None,
                };
                inbox.push(InboxQuestion {
                    item_title: product.map(|p| p.title.clone()),
                    item_sku: product.map(resolve_product_sku),
                    question,
                });
            }

            diagnostics.failed_item_fetches += items.failed();
            Report::new(inbox, diagnostics)
        })
        .await
    }

    async fn list_questions(&self, filter: Option<QuestionFilter>) -> Report<Vec<Question>> {
        let api = &self.api;
        let seller_id = self.options.seller_id.as_str();

        let fetched = fetch_all(self.options.page_size, move |offset, limit| {
            api.list_questions(seller_id, filter, offset, limit)
        })
        .await;

        Report::new(
            fetched.items,
            Diagnostics {
                failed_pages: fetched.failed_pages,
                ..Diagnostics::default()
            },
        )
    }
}

/// Compute question metrics.
///
/// The mean response time covers answered questions with a non-negative
/// delay; an answer dated before its question still counts as answered.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_questions(questions: &[Question]) -> QuestionSnapshot {
    let total_questions = questions.len() as u64;
    let pending = questions.iter().filter(|q| !q.is_answered()).count() as u64;

    let delays: Vec<f64> = questions
        .iter()
        .filter_map(Question::response_time)
        .filter(|delay| delay.num_milliseconds() >= 0)
        .map(|delay| delay.num_milliseconds() as f64 / MILLIS_PER_HOUR)
        .collect();

    let avg_response_time_hours = if delays.is_empty() {
        0.0
    } else {
        delays.iter().sum::<f64>() / delays.len() as f64
    };

    QuestionSnapshot {
        total_questions,
        answered: total_questions - pending,
        pending,
        avg_response_time_hours,
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::{Value, json};

    use super::*;
    use crate::engine::EngineOptions;
    use crate::engine::testing::{FakeApi, product};

    fn question(id: u64, asked: &str, answered: Option<&str>) -> Question {
        let answer = answered.map_or(Value::Null, |at| {
            json!({"text": "Sí, hay stock", "date_created": at})
        });
        serde_json::from_value(json!({
            "id": id,
            "text": "¿Hay stock?",
            "date_created": asked,
            "item_id": format!("MLA{}", id % 2 + 1),
            "status": if answered.is_some() { "ANSWERED" } else { "UNANSWERED" },
            "answer": answer
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_questions() {
        let questions = vec![
            question(1, "2024-03-01T10:00:00.000-03:00", Some("2024-03-01T12:00:00.000-03:00")),
            question(2, "2024-03-01T10:00:00.000-03:00", Some("2024-03-01T14:00:00.000-03:00")),
            question(3, "2024-03-01T10:00:00.000-03:00", None),
        ];

        let snapshot = summarize_questions(&questions);

        assert_eq!(snapshot.total_questions, 3);
        assert_eq!(snapshot.answered, 2);
        assert_eq!(snapshot.pending, 1);
        assert!((snapshot.avg_response_time_hours - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_delay_excluded_from_mean_only() {
        let questions = vec![
            question(1, "2024-03-01T10:00:00.000-03:00", Some("2024-03-01T11:00:00.000-03:00")),
            question(2, "2024-03-01T10:00:00.000-03:00", Some("2024-03-01T09:00:00.000-03:00")),
        ];

        let snapshot = summarize_questions(&questions);

        assert_eq!(snapshot.answered, 2);
        assert!((snapshot.avg_response_time_hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_answers_means_zero_average() {
        let snapshot = summarize_questions(&[question(1, "2024-03-01T10:00:00.000-03:00", None)]);
        assert_eq!(snapshot.pending, 1);
        assert!(snapshot.avg_response_time_hours.abs() < f64::EPSILON);
        assert_eq!(summarize_questions(&[]), QuestionSnapshot::zero());
    }

    #[tokio::test]
    async fn test_questions_paginated_through_engine() {
        let questions: Vec<Question> = (0..120)
            .map(|i| question(i, "2024-03-01T10:00:00.000-03:00", None))
            .collect();
        let engine = MetricsEngine::new(
            FakeApi {
                questions,
                ..FakeApi::default()
            },
            EngineOptions::new("98765", FixedOffset::west_opt(3 * 3600).unwrap()),
        );

        let report = engine.questions_metrics_report().await;

        assert_eq!(report.value.total_questions, 120);
        assert_eq!(report.value.pending, 120);
        assert_eq!(report.diagnostics, Diagnostics::default());
    }

    #[tokio::test]
    async fn test_inbox_filters_and_attaches_listings() {
        let mut api = FakeApi {
            questions: vec![
                question(1, "2024-03-02T10:00:00.000-03:00", None),
                question(
                    2,
                    "2024-03-01T10:00:00.000-03:00",
                    Some("2024-03-01T11:00:00.000-03:00"),
                ),
                question(3, "2024-03-01T09:00:00.000-03:00", None),
            ],
            ..FakeApi::default()
        };
        api.items.insert(
            meli_pulse_core::ItemId::new("MLA2"),
            product(json!({"id": "MLA2", "title": "Termo 1L", "seller_custom_field": "TERMO-1"})),
        );
        let engine = MetricsEngine::new(
            api,
            EngineOptions::new("98765", FixedOffset::west_opt(3 * 3600).unwrap()),
        );

        let report = engine.get_questions(Some(QuestionFilter::Unanswered)).await;
        let inbox = &report.value;

        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].question.id.as_str(), "1");
        assert_eq!(inbox[0].item_title.as_deref(), Some("Termo 1L"));
        assert_eq!(inbox[0].item_sku.as_deref(), Some("TERMO-1"));
        assert_eq!(inbox[1].item_title.as_deref(), Some("Termo 1L"));
        // MLA2 is fetched once for both questions
        assert_eq!(engine.api().item_calls.lock().unwrap().len(), 1);
        assert_eq!(report.diagnostics.failed_item_fetches, 0);

        let answered = engine.get_questions(Some(QuestionFilter::Answered)).await;
        assert_eq!(answered.value.len(), 1);
        assert_eq!(answered.value[0].item_title, None);
        assert_eq!(answered.diagnostics.failed_item_fetches, 1);
    }
}
