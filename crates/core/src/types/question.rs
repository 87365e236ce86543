//! Buyer questions on listings.

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};

use super::id::{ItemId, QuestionId};
use super::lenient;
use super::status::QuestionStatus;

/// A question received on one of the seller's listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question ID.
    pub id: QuestionId,
    /// Question text.
    #[serde(default, deserialize_with = "lenient::value")]
    pub text: String,
    /// When the question was asked.
    #[serde(default, deserialize_with = "lenient::value")]
    pub date_created: Option<DateTime<FixedOffset>>,
    /// Listing the question was asked on.
    #[serde(default, deserialize_with = "lenient::value")]
    pub item_id: Option<ItemId>,
    /// Status as reported by the marketplace.
    #[serde(default, deserialize_with = "lenient::value")]
    pub status: QuestionStatus,
    /// The seller's answer, if any.
    #[serde(default, deserialize_with = "lenient::value")]
    pub answer: Option<Answer>,
}

/// The seller's answer to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text.
    #[serde(default, deserialize_with = "lenient::value")]
    pub text: String,
    /// When the answer was posted.
    #[serde(default, deserialize_with = "lenient::value")]
    pub date_created: Option<DateTime<FixedOffset>>,
}

impl Question {
    /// Whether the question has an answer attached.
    #[must_use]
    pub const fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Time between the question and its answer.
    ///
    /// `None` when unanswered or when either timestamp is missing.
    #[must_use]
    pub fn response_time(&self) -> Option<TimeDelta> {
        let asked = self.date_created?;
        let answered = self.answer.as_ref()?.date_created?;
        Some(answered.signed_duration_since(asked))
    }
}

/// A question in the seller's inbox, with the listing it was asked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxQuestion {
    #[serde(flatten)]
    pub question: Question,
    /// Listing title; `None` when the listing could not be loaded.
    pub item_title: Option<String>,
    /// Resolved listing SKU; `None` when the listing could not be loaded.
    pub item_sku: Option<String>,
}
