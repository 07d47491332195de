use anyhow::Result;
use tracing::{debug, warn};

use super::api::GitHubApi;
use super::comment::CommentType;
use super::error::wrap_api_error;
use crate::validate::ValidationError;

/// What a lookup learned about a comment id. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInfo {
    pub id: u64,
    /// `None` when the id was in neither collection.
    pub kind: Option<CommentType>,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub found: bool,
}

impl CommentInfo {
    fn not_found(id: u64) -> Self {
        Self {
            id,
            kind: None,
            path: None,
            line: None,
            found: false,
        }
    }
}

/// Find out whether `comment_id` is an issue or a review comment on PR `pr`.
///
/// Scans the issue comments first, then the review comments. A collection
/// that fails to load is skipped (and logged) so the other one still gets
/// a chance. `found == false` only when both collections loaded; if the id
/// is missing and a listing failed, that failure is returned instead.
pub async fn detect_comment_type<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    comment_id: u64,
    pr: u32,
) -> Result<CommentInfo> {
    if pr == 0 {
        return Err(ValidationError::InvalidArgument(
            "PR number required for comment type detection".to_string(),
        )
        .into());
    }

    let mut listing_error = None;

    match api.list_issue_comments(owner, repo, pr).await {
        Ok(comments) => {
            if comments.iter().any(|c| c.id == comment_id) {
                debug!(comment_id, pr, "comment is an issue comment");
                return Ok(CommentInfo {
                    id: comment_id,
                    kind: Some(CommentType::Issue),
                    path: None,
                    line: None,
                    found: true,
                });
            }
        }
        Err(e) => {
            warn!("Failed to list issue comments while detecting type: {:#}", e);
            listing_error = Some(e);
        }
    }

    match api.list_review_comments(owner, repo, pr).await {
        Ok(comments) => {
            if let Some(comment) = comments.into_iter().find(|c| c.id == comment_id) {
                debug!(comment_id, pr, "comment is a review comment");
                return Ok(CommentInfo {
                    id: comment_id,
                    kind: Some(CommentType::Review),
                    path: comment.path,
                    line: comment.line,
                    found: true,
                });
            }
        }
        Err(e) => {
            warn!("Failed to list review comments while detecting type: {:#}", e);
            listing_error = Some(e);
        }
    }

    if let Some(e) = listing_error {
        return Err(wrap_api_error(
            e,
            format!("detect type of comment {}", comment_id),
        ));
    }

    debug!(comment_id, pr, "comment not found in either collection");
    Ok(CommentInfo::not_found(comment_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::error::{ApiError, ApiErrorKind};
    use crate::github::mock::MockClient;

    #[tokio::test]
    async fn test_detects_issue_comment() {
        let client = MockClient::new();
        let info = detect_comment_type(&client, "owner", "repo", 123456, 1)
            .await
            .unwrap();
        assert_eq!(
            info,
            CommentInfo {
                id: 123456,
                kind: Some(CommentType::Issue),
                path: None,
                line: None,
                found: true,
            }
        );
    }

    #[tokio::test]
    async fn test_detects_review_comment_with_location() {
        let client = MockClient::new();
        let info = detect_comment_type(&client, "owner", "repo", 654321, 1)
            .await
            .unwrap();
        assert_eq!(
            info,
            CommentInfo {
                id: 654321,
                kind: Some(CommentType::Review),
                path: Some("main.go".to_string()),
                line: Some(42),
                found: true,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let client = MockClient::new();
        let info = detect_comment_type(&client, "owner", "repo", 999, 1)
            .await
            .unwrap();
        assert!(!info.found);
        assert_eq!(info.kind, None);
    }

    #[tokio::test]
    async fn test_requires_pr_number() {
        let client = MockClient::new();
        let err = detect_comment_type(&client, "owner", "repo", 123456, 0)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PR number required for comment type detection"
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_lookups_are_identical_and_uncached() {
        let client = MockClient::new();
        let first = detect_comment_type(&client, "o", "r", 654321, 7).await.unwrap();
        let second = detect_comment_type(&client, "o", "r", 654321, 7).await.unwrap();
        assert_eq!(first, second);
        // both lookups hit both collections
        assert_eq!(
            client.calls(),
            vec![
                "list_issue_comments",
                "list_review_comments",
                "list_issue_comments",
                "list_review_comments",
            ]
        );
    }

    #[tokio::test]
    async fn test_issue_listing_failure_still_checks_review_comments() {
        let client = MockClient::new();
        client.fail("list_issue_comments", "HTTP 500: boom");
        let info = detect_comment_type(&client, "o", "r", 654321, 1).await.unwrap();
        assert_eq!(info.kind, Some(CommentType::Review));
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_reported_as_missing() {
        let client = MockClient::new();
        client.fail("list_review_comments", "HTTP 500: boom");
        let err = detect_comment_type(&client, "o", "r", 999, 1)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to detect type of comment 999: HTTP 500: boom"
        );
    }

    #[tokio::test]
    async fn test_both_listings_unauthorized() {
        let client = MockClient::new();
        client.fail("list_issue_comments", "HTTP 401: Bad credentials");
        client.fail("list_review_comments", "HTTP 401: Bad credentials");
        let err = detect_comment_type(&client, "o", "r", 123456, 1)
            .await
            .unwrap_err();
        let api_error = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_error.kind, ApiErrorKind::AuthFailure);
        assert_eq!(api_error.operation, "detect type of comment 123456");
    }
}
