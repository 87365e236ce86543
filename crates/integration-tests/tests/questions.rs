//! Question engagement metrics and the question inbox through the metrics
//! engine.

use meli_pulse_core::QuestionFilter;
use meli_pulse_integration_tests::{FakeMarketplace, engine, product, question};
use serde_json::json;

#[tokio::test]
async fn test_response_time_averages_answered_questions() {
    let api = FakeMarketplace::new().with_questions([
        question(1, "2024-03-01T10:00:00.000-03:00", Some(90)),
        question(2, "2024-03-01T11:00:00.000-03:00", None),
    ]);
    let engine = engine(api, 50);

    let snapshot = engine.get_questions_metrics().await;

    assert_eq!(snapshot.total_questions, 2);
    assert_eq!(snapshot.answered, 1);
    assert_eq!(snapshot.pending, 1);
    assert!((snapshot.avg_response_time_hours - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_no_questions() {
    let engine = engine(FakeMarketplace::new(), 50);

    let report = engine.questions_metrics_report().await;

    assert_eq!(report.value.total_questions, 0);
    assert!(report.value.avg_response_time_hours.abs() < f64::EPSILON);
    assert!(!report.diagnostics.is_degraded());
}

#[tokio::test]
async fn test_questions_span_several_pages() {
    let questions: Vec<_> = (1..=25)
        .map(|i| question(i, "2024-03-01T10:00:00.000-03:00", (i % 5 == 0).then_some(30)))
        .collect();
    let engine = engine(FakeMarketplace::new().with_questions(questions), 10);

    let report = engine.get_questions(None).await;
    let snapshot = engine.get_questions_metrics().await;

    assert_eq!(report.value.len(), 25);
    assert_eq!(snapshot.answered, 5);
    assert!((snapshot.avg_response_time_hours - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_unanswered_inbox_carries_listing_title_and_sku() {
    let api = FakeMarketplace::new()
        .with_questions((1..=6).map(|i| {
            question(i, "2024-03-01T10:00:00.000-03:00", (i % 3 == 0).then_some(15))
        }))
        .with_item(product(json!({
            "id": "MLA100",
            "title": "Yerba mate 1kg",
            "attributes": [{"id": "SELLER_SKU", "value_name": "YERBA-1KG"}]
        })));
    let engine = engine(api, 2);

    let report = engine.get_questions(Some(QuestionFilter::Unanswered)).await;

    assert_eq!(report.value.len(), 4);
    assert!(report.value.iter().all(|q| !q.question.is_answered()));
    for inbox_question in &report.value {
        assert_eq!(inbox_question.item_title.as_deref(), Some("Yerba mate 1kg"));
        assert_eq!(inbox_question.item_sku.as_deref(), Some("YERBA-1KG"));
    }
    assert_eq!(engine.api().calls().items.len(), 1);
    assert!(!report.diagnostics.is_degraded());
}

#[tokio::test]
async fn test_inbox_keeps_questions_on_missing_listing() {
    let api = FakeMarketplace::new()
        .with_questions([question(1, "2024-03-01T10:00:00.000-03:00", Some(5))]);
    let engine = engine(api, 50);

    let report = engine.get_questions(Some(QuestionFilter::Answered)).await;

    assert_eq!(report.value.len(), 1);
    assert_eq!(report.value[0].item_title, None);
    assert_eq!(report.value[0].item_sku, None);
    assert_eq!(report.diagnostics.failed_item_fetches, 1);
}
