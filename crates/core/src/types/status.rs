//! Status enums for marketplace entities.
//!
//! Every enum carries an `Unknown` catch-all so a status the marketplace adds
//! later never fails deserialization of the surrounding record.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status or option from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// What was being parsed (e.g., "order status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Order status.
///
/// Maps to the marketplace's `order.status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    PaymentRequired,
    PaymentInProcess,
    PartiallyPaid,
    Paid,
    Cancelled,
    Invalid,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// The value used in the `order.status` search filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::PaymentRequired => "payment_required",
            Self::PaymentInProcess => "payment_in_process",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Invalid => "invalid",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "payment_required" => Ok(Self::PaymentRequired),
            "payment_in_process" => Ok(Self::PaymentInProcess),
            "partially_paid" => Ok(Self::PartiallyPaid),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            "invalid" => Ok(Self::Invalid),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

/// Listing (item) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    Paused,
    Closed,
    UnderReview,
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Question status as reported by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    ClosedUnanswered,
    UnderReview,
    Banned,
    Deleted,
    Disabled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Status filter for the received-questions search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionFilter {
    Answered,
    Unanswered,
}

impl QuestionFilter {
    /// The value used in the `status` search filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "ANSWERED",
            Self::Unanswered => "UNANSWERED",
        }
    }
}

impl std::fmt::Display for QuestionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("answered") {
            Ok(Self::Answered)
        } else if s.eq_ignore_ascii_case("unanswered") {
            Ok(Self::Unanswered)
        } else {
            Err(ParseEnumError::new("question filter", s))
        }
    }
}
