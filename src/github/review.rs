use serde::{Deserialize, Serialize};
use std::fmt;

use super::comment::{ReviewCommentInput, User};

/// Review verdict sent when a review is created or submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
}

impl ReviewEvent {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "APPROVE" => Some(Self::Approve),
            "REQUEST_CHANGES" => Some(Self::RequestChanges),
            "COMMENT" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::RequestChanges => "REQUEST_CHANGES",
            Self::Comment => "COMMENT",
        }
    }

    /// Review `state` GitHub reports once a review is submitted with this event.
    pub fn submitted_state(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVED",
            Self::RequestChanges => "CHANGES_REQUESTED",
            Self::Comment => "COMMENTED",
        }
    }

    pub fn from_state(state: &str) -> Option<Self> {
        match state {
            "APPROVED" => Some(Self::Approve),
            "CHANGES_REQUESTED" => Some(Self::RequestChanges),
            "COMMENTED" => Some(Self::Comment),
            _ => None,
        }
    }

    /// Past-tense phrase for status lines ("approved PR #3").
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::RequestChanges => "requested changes on",
            Self::Comment => "commented on",
        }
    }
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub body: Option<String>,
    pub state: String,
    pub user: User,
    pub submitted_at: Option<String>,
}

impl Review {
    pub fn is_pending(&self) -> bool {
        self.state == "PENDING"
    }
}

/// First draft review on the PR, if any.
pub fn find_pending_review(reviews: &[Review]) -> Option<&Review> {
    reviews.iter().find(|r| r.is_pending())
}

/// Batch of line comments submitted together as one review.
///
/// Without an event the review is created as a pending draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<ReviewEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub comments: Vec<ReviewCommentInput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_json_snapshot;

    fn review(id: u64, state: &str) -> Review {
        Review {
            id,
            body: None,
            state: state.to_owned(),
            user: User {
                login: "me".to_owned(),
            },
            submitted_at: None,
        }
    }

    #[test]
    fn test_find_pending_review() {
        let reviews = vec![review(1, "APPROVED"), review(2, "PENDING"), review(3, "PENDING")];
        assert_eq!(find_pending_review(&reviews).map(|r| r.id), Some(2));
        assert!(find_pending_review(&reviews[..1]).is_none());
    }

    #[test]
    fn test_submitted_state_round_trips() {
        for event in [ReviewEvent::Approve, ReviewEvent::RequestChanges, ReviewEvent::Comment] {
            assert_eq!(ReviewEvent::from_state(event.submitted_state()), Some(event));
        }
        assert_eq!(ReviewEvent::from_state("PENDING"), None);
        assert_eq!(ReviewEvent::RequestChanges.past_tense(), "requested changes on");
    }

    #[test]
    fn test_review_input_serializes_event_in_api_form() {
        let input = ReviewInput {
            body: "Looks good overall".to_owned(),
            event: Some(ReviewEvent::RequestChanges),
            commit_id: None,
            comments: vec![ReviewCommentInput::new("src/lib.rs", 10, "typo")],
        };
        assert_json_snapshot!(input, @r#"
        {
          "body": "Looks good overall",
          "event": "REQUEST_CHANGES",
          "comments": [
            {
              "body": "typo",
              "path": "src/lib.rs",
              "line": 10,
              "side": "RIGHT"
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_review_input_without_event_is_draft() {
        let input = ReviewInput::default();
        assert_json_snapshot!(input, @r#"
        {
          "comments": []
        }
        "#);
    }
}
