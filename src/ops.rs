//! Public comment operations.
//!
//! Each operation validates its arguments, resolves the comment family
//! where it matters, makes its requests through a [`GitHubApi`] and hands
//! any failure to the error enhancer before returning it.

use anyhow::Result;
use tracing::debug;

use crate::filter::ListFilter;
use crate::github::{
    analyze_and_enhance_error, find_pending_review, route_comment, wrap_api_error, Comment,
    CommentTarget, CommentType, GitHubApi, Review, ReviewCommentInput, ReviewEvent, ReviewInput,
};
use crate::validate::{
    require_review_event, validate_body, validate_comment_id, validate_path, validate_positive,
    validate_pr_number, validate_reaction, validate_repo_params, validate_review_event,
    validate_review_id,
};

/// Context label plus scenario analysis for `command`.
fn enhance(err: anyhow::Error, operation: String, command: &str, comment_id: u64) -> anyhow::Error {
    analyze_and_enhance_error(err, command, comment_id)
        .map_original(|e| wrap_api_error(e, operation))
        .into()
}

/// Every comment on the PR, oldest first, each tagged with its type.
pub async fn list_comments<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
) -> Result<Vec<Comment>> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;

    let mut comments = api
        .list_issue_comments(owner, repo, pr)
        .await
        .map_err(|e| wrap_api_error(e, format!("list issue comments for PR #{}", pr)))?;
    let review_comments = api
        .list_review_comments(owner, repo, pr)
        .await
        .map_err(|e| wrap_api_error(e, format!("list review comments for PR #{}", pr)))?;

    comments.extend(review_comments);
    comments.sort_by_key(|c| c.created_at);
    debug!(pr, count = comments.len(), "listed comments");
    Ok(comments)
}

/// [`list_comments`] narrowed by `filter`, order preserved.
pub async fn list_comments_matching<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    filter: &ListFilter,
) -> Result<Vec<Comment>> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    filter.validate()?;

    let mut comments = list_comments(api, owner, repo, pr).await?;
    if !filter.is_empty() {
        comments.retain(|c| filter.matches(c));
        debug!(pr, kept = comments.len(), ?filter, "filtered comments");
    }
    Ok(comments)
}

pub async fn add_issue_comment<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    body: &str,
) -> Result<Comment> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_body("comment", body)?;

    api.create_issue_comment(owner, repo, pr, body)
        .await
        .map_err(|e| wrap_api_error(e, format!("add comment to PR #{}", pr)))
}

/// Line comment on the diff. An empty `commit_id` means the PR head.
pub async fn add_review_comment<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    mut input: ReviewCommentInput,
) -> Result<Comment> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_body("comment", &input.body)?;
    validate_path(&input.path)?;
    validate_positive("line", u64::from(input.line))?;

    if input.commit_id.is_empty() {
        input.commit_id = api
            .head_sha(owner, repo, pr)
            .await
            .map_err(|e| wrap_api_error(e, format!("fetch head commit of PR #{}", pr)))?;
    }

    api.create_review_comment(owner, repo, pr, &input)
        .await
        .map_err(|e| {
            wrap_api_error(
                e,
                format!("add review comment on {}:{}", input.path, input.line),
            )
        })
}

/// Threaded reply to a review comment.
///
/// Issue comments have no threads, so with an `Issue` hint the reply is
/// posted as a new conversation comment instead.
pub async fn reply_to_comment<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
    body: &str,
    hint: Option<CommentType>,
) -> Result<Comment> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_comment_id(comment_id)?;
    validate_body("reply", body)?;

    let reply = match hint {
        Some(CommentType::Issue) => api.create_issue_comment(owner, repo, pr, body).await,
        _ => {
            api.reply_to_review_comment(owner, repo, pr, comment_id, body)
                .await
        }
    };
    reply.map_err(|e| {
        enhance(
            e,
            format!("reply to comment {}", comment_id),
            "reply",
            comment_id,
        )
    })
}

pub async fn add_reaction<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
    reaction: &str,
    hint: Option<CommentType>,
) -> Result<CommentTarget> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_comment_id(comment_id)?;
    let reaction = validate_reaction(reaction)?;

    let target = route_comment(api, owner, repo, pr, comment_id, hint, "react").await?;
    api.add_reaction(owner, repo, target, reaction)
        .await
        .map_err(|e| {
            enhance(
                e,
                format!("add {} reaction to comment {}", reaction, comment_id),
                "react",
                comment_id,
            )
        })?;
    Ok(target)
}

pub async fn remove_reaction<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
    reaction: &str,
    hint: Option<CommentType>,
) -> Result<CommentTarget> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_comment_id(comment_id)?;
    let reaction = validate_reaction(reaction)?;

    let target = route_comment(api, owner, repo, pr, comment_id, hint, "react").await?;
    api.remove_reaction(owner, repo, target, reaction)
        .await
        .map_err(|e| {
            enhance(
                e,
                format!("remove {} reaction from comment {}", reaction, comment_id),
                "react",
                comment_id,
            )
        })?;
    Ok(target)
}

pub async fn edit_comment<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
    body: &str,
    hint: Option<CommentType>,
) -> Result<Comment> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_comment_id(comment_id)?;
    validate_body("comment", body)?;

    let target = route_comment(api, owner, repo, pr, comment_id, hint, "edit").await?;
    api.edit_comment(owner, repo, target, body)
        .await
        .map_err(|e| {
            enhance(
                e,
                format!("edit comment {}", comment_id),
                "edit",
                comment_id,
            )
        })
}

/// Create a review from a batch of line comments.
///
/// An empty `event` leaves the review pending.
pub async fn create_review<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    body: &str,
    event: &str,
    comments: Vec<ReviewCommentInput>,
) -> Result<Review> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    let event = validate_review_event(event)?;
    for comment in &comments {
        validate_body("comment", &comment.body)?;
        validate_path(&comment.path)?;
        validate_positive("line", u64::from(comment.line))?;
    }

    let input = ReviewInput {
        body: body.to_string(),
        event,
        commit_id: None,
        comments,
    };
    api.create_review(owner, repo, pr, &input)
        .await
        .map_err(|e| enhance(e, format!("create review on PR #{}", pr), "review", 0))
}

/// Publish the PR's pending review with `event`.
pub async fn submit_pending_review<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    body: &str,
    event: &str,
) -> Result<Review> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    let event = require_review_event(event)?;

    let hint = format!(
        "Start one with 'gh comment review {} --comment path:line:body' (leave --event off to keep it pending).",
        pr
    );
    submit_pending(api, owner, repo, pr, body, event, &hint).await
}

/// Submit a pending review started elsewhere, typically in the web UI.
///
/// An empty `event` means `COMMENT`.
pub async fn close_pending_review<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    body: &str,
    event: &str,
) -> Result<Review> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    let event = validate_review_event(event)?.unwrap_or(ReviewEvent::Comment);

    let hint = "Note: pending reviews are usually started in GitHub's web interface.\nUse 'gh comment review' to create and submit reviews from the command line.";
    submit_pending(api, owner, repo, pr, body, event, hint).await
}

async fn submit_pending<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    body: &str,
    event: ReviewEvent,
    no_pending_hint: &str,
) -> Result<Review> {
    let reviews = api
        .list_reviews(owner, repo, pr)
        .await
        .map_err(|e| wrap_api_error(e, format!("list reviews for PR #{}", pr)))?;
    let Some(pending) = find_pending_review(&reviews) else {
        anyhow::bail!("no pending review found on PR #{}\n\n{}", pr, no_pending_hint);
    };
    validate_review_id(pending.id)?;
    debug!(pr, review_id = pending.id, %event, "submitting pending review");

    api.submit_review(owner, repo, pr, pending.id, body, event)
        .await
        .map_err(|e| enhance(e, format!("submit review {}", pending.id), "review", 0))
}

/// Resolve the review thread holding `comment_id`; returns the thread id.
pub async fn resolve_thread<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
) -> Result<String> {
    validate_repo_params(owner, repo)?;
    validate_pr_number(pr)?;
    validate_comment_id(comment_id)?;

    let thread_id = api
        .find_review_thread(owner, repo, pr, comment_id)
        .await
        .map_err(|e| {
            wrap_api_error(e, format!("find review thread for comment {}", comment_id))
        })?;
    api.resolve_review_thread(&thread_id)
        .await
        .map_err(|e| wrap_api_error(e, format!("resolve review thread {}", thread_id)))?;
    Ok(thread_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::MockClient;

    #[tokio::test]
    async fn test_repo_checked_before_ids() {
        let client = MockClient::new();
        let err = add_reaction(&client, "a/b", "r", 0, 0, "thumbsup", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid repository format");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pr_checked_before_comment_id() {
        let client = MockClient::new();
        let err = edit_comment(&client, "o", "r", 0, 0, "", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid PR number 0: must be positive");
    }

    #[tokio::test]
    async fn test_comment_id_checked_before_body() {
        let client = MockClient::new();
        let err = edit_comment(&client, "o", "r", 1, 0, "", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid comment ID 0: must be positive");
    }

    #[tokio::test]
    async fn test_body_checked_before_reaction_lookup() {
        let client = MockClient::new();
        let err = reply_to_comment(&client, "o", "r", 1, 654321, "   ", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "reply body cannot be empty");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_reaction_never_reaches_network() {
        let client = MockClient::new();
        let err = remove_reaction(&client, "o", "r", 1, 123456, "thumbsup", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid reaction"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_filter_window_checked_before_listing() {
        use chrono::{TimeZone, Utc};

        let client = MockClient::new();
        let filter = ListFilter {
            since: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let err = list_comments_matching(&client, "o", "r", 1, &filter)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot be after until date"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_close_pending_review_rejects_unknown_event() {
        let client = MockClient::new();
        let err = close_pending_review(&client, "o", "r", 1, "", "LGTM")
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid review event 'LGTM'"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_review_line_must_be_positive() {
        let client = MockClient::new();
        let err = create_review(
            &client,
            "o",
            "r",
            1,
            "",
            "",
            vec![ReviewCommentInput::new("a.rs", 0, "x")],
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid line 0: must be positive");
    }
}
