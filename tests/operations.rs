use chrono::{TimeZone, Utc};
use gh_comment::filter::ListFilter;
use gh_comment::github::{
    detect_comment_type, ApiError, ApiErrorKind, CommentType, EnhancedError, MockClient, Reaction,
    ReviewCommentInput,
};
use gh_comment::ops;

const OWNER: &str = "octocat";
const REPO: &str = "hello-world";

#[tokio::test]
async fn test_list_merges_both_types_oldest_first() {
    let client = MockClient::new();
    let comments = ops::list_comments(&client, OWNER, REPO, 1).await.unwrap();

    let summary: Vec<(u64, CommentType, Option<String>)> = comments
        .iter()
        .map(|c| (c.id, c.kind, c.location()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (123456, CommentType::Issue, None),
            (654321, CommentType::Review, Some("main.go:42".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_classify_review_comment() {
    let client = MockClient::new();
    let info = detect_comment_type(&client, OWNER, REPO, 654321, 1)
        .await
        .unwrap();
    assert!(info.found);
    assert_eq!(info.kind, Some(CommentType::Review));
    assert_eq!(info.path.as_deref(), Some("main.go"));
    assert_eq!(info.line, Some(42));
}

#[tokio::test]
async fn test_classification_is_stable() {
    let client = MockClient::new();
    let first = detect_comment_type(&client, OWNER, REPO, 123456, 1)
        .await
        .unwrap();
    let second = detect_comment_type(&client, OWNER, REPO, 123456, 1)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.kind, Some(CommentType::Issue));
}

#[tokio::test]
async fn test_react_routes_to_detected_family() {
    let client = MockClient::new();
    let target = ops::add_reaction(&client, OWNER, REPO, 1, 654321, "rocket", None)
        .await
        .unwrap();
    assert_eq!(target.kind, CommentType::Review);
    assert_eq!(client.reactions(), vec![(target, Reaction::Rocket)]);
    assert_eq!(
        client.calls(),
        vec!["list_issue_comments", "list_review_comments", "add_reaction"]
    );
}

#[tokio::test]
async fn test_react_then_remove() {
    let client = MockClient::new();
    ops::add_reaction(&client, OWNER, REPO, 1, 123456, "+1", None)
        .await
        .unwrap();
    ops::remove_reaction(&client, OWNER, REPO, 1, 123456, "+1", Some(CommentType::Issue))
        .await
        .unwrap();
    assert!(client.reactions().is_empty());
}

#[tokio::test]
async fn test_thumbsup_is_rejected_before_any_request() {
    let client = MockClient::new();
    let err = ops::add_reaction(&client, OWNER, REPO, 1, 654321, "thumbsup", None)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("invalid reaction 'thumbsup'"));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_pr_zero_is_rejected() {
    let client = MockClient::new();
    let err = ops::list_comments(&client, OWNER, REPO, 0).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid PR number 0: must be positive");
}

#[tokio::test]
async fn test_owner_with_slash_is_rejected() {
    let client = MockClient::new();
    let err = ops::add_issue_comment(&client, "octo/cat", REPO, 1, "hi")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid repository format"));
}

#[tokio::test]
async fn test_edit_unknown_comment_suggests_listing() {
    let client = MockClient::new();
    let err = ops::edit_comment(&client, OWNER, REPO, 1, 999, "new body", None)
        .await
        .unwrap_err();
    let enhanced = err.downcast_ref::<EnhancedError>().unwrap();
    assert_eq!(
        enhanced.auto_fix.as_deref(),
        Some("gh comment list <PR>  # see all comments and their IDs")
    );
    assert!(!client.calls().contains(&"edit_comment"));
}

#[tokio::test]
async fn test_edit_with_wrong_type_hint_suggests_other_type() {
    let client = MockClient::new();
    let err = ops::edit_comment(
        &client,
        OWNER,
        REPO,
        1,
        123456,
        "new body",
        Some(CommentType::Review),
    )
    .await
    .unwrap_err();

    let enhanced = err.downcast_ref::<EnhancedError>().unwrap();
    assert_eq!(
        enhanced.auto_fix.as_deref(),
        Some("gh comment edit 123456 \"<body>\" --type issue")
    );
    let rendered = enhanced.to_string();
    assert!(rendered.starts_with("Error: resource not found while trying to edit comment 123456"));
    assert!(rendered.contains("Intelligent Analysis:"));
    assert!(rendered.contains("See 'gh comment edit --help'"));
}

#[tokio::test]
async fn test_edit_review_comment_keeps_location() {
    let client = MockClient::new();
    let edited = ops::edit_comment(&client, OWNER, REPO, 1, 654321, "renamed", None)
        .await
        .unwrap();
    assert_eq!(edited.body, "renamed");
    assert_eq!(edited.location().as_deref(), Some("main.go:42"));
}

#[tokio::test]
async fn test_reply_to_issue_comment_is_enhanced() {
    let client = MockClient::new();
    let err = ops::reply_to_comment(&client, OWNER, REPO, 1, 123456, "thanks", None)
        .await
        .unwrap_err();
    let enhanced = err.downcast_ref::<EnhancedError>().unwrap();
    assert_eq!(enhanced.command, "reply");
    assert!(enhanced
        .suggestions
        .iter()
        .any(|s| s.starts_with("Reply alternatives")));
    assert_eq!(
        enhanced.auto_fix.as_deref(),
        Some("gh comment reply 123456 \"<body>\" --type issue")
    );
}

#[tokio::test]
async fn test_reply_to_issue_comment_with_type_posts_to_conversation() {
    let client = MockClient::new();
    let reply = ops::reply_to_comment(
        &client,
        OWNER,
        REPO,
        1,
        123456,
        "thanks",
        Some(CommentType::Issue),
    )
    .await
    .unwrap();
    assert_eq!(reply.kind, CommentType::Issue);
    assert_eq!(client.calls(), vec!["create_issue_comment"]);
}

#[tokio::test]
async fn test_add_line_comment_anchors_to_head() {
    let client = MockClient::new();
    let comment = ops::add_review_comment(
        &client,
        OWNER,
        REPO,
        1,
        ReviewCommentInput::new("src/lib.rs", 10, "nit"),
    )
    .await
    .unwrap();
    assert_eq!(comment.kind, CommentType::Review);
    assert_eq!(comment.location().as_deref(), Some("src/lib.rs:10"));
    assert_eq!(client.calls(), vec!["head_sha", "create_review_comment"]);
}

#[tokio::test]
async fn test_add_line_comment_on_stale_commit_is_validation_error() {
    let client = MockClient::new();
    let mut input = ReviewCommentInput::new("src/lib.rs", 10, "nit");
    input.commit_id = "deadbeef".to_string();
    let err = ops::add_review_comment(&client, OWNER, REPO, 1, input)
        .await
        .unwrap_err();
    let api_error = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api_error.kind, ApiErrorKind::Validation);
}

#[tokio::test]
async fn test_pending_review_then_submit() {
    let client = MockClient::new();
    let review = ops::create_review(
        &client,
        OWNER,
        REPO,
        1,
        "",
        "",
        vec![ReviewCommentInput::new("main.go", 7, "typo")],
    )
    .await
    .unwrap();
    assert!(review.is_pending());

    let submitted = ops::submit_pending_review(&client, OWNER, REPO, 1, "ship it", "APPROVE")
        .await
        .unwrap();
    assert_eq!(submitted.id, review.id);
    assert_eq!(submitted.state, "APPROVED");
}

#[tokio::test]
async fn test_submit_without_pending_review() {
    let client = MockClient::new();
    let err = ops::submit_pending_review(&client, OWNER, REPO, 1, "", "COMMENT")
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("no pending review found on PR #1"));
    assert!(!client.calls().contains(&"submit_review"));
}

#[tokio::test]
async fn test_resolve_review_thread() {
    let client = MockClient::new();
    let thread = ops::resolve_thread(&client, OWNER, REPO, 1, 654321)
        .await
        .unwrap();
    assert_eq!(thread, "RT_654321");
    assert_eq!(client.resolved_threads(), vec!["RT_654321"]);
}

#[tokio::test]
async fn test_list_failure_is_labelled() {
    let client = MockClient::new();
    client.fail("list_review_comments", "HTTP 401: Bad credentials");
    let err = ops::list_comments(&client, OWNER, REPO, 1).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("authentication failed while trying to list review comments for PR #1"));
    assert!(msg.contains("gh auth login"));
}

#[tokio::test]
async fn test_unreadable_listings_are_not_reported_as_missing_comment() {
    let client = MockClient::new();
    client.fail("list_issue_comments", "HTTP 401: Bad credentials");
    client.fail("list_review_comments", "HTTP 401: Bad credentials");

    let err = ops::edit_comment(&client, OWNER, REPO, 1, 123456, "new body", None)
        .await
        .unwrap_err();
    let api_error = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api_error.kind, ApiErrorKind::AuthFailure);
    assert!(err.to_string().contains("gh auth login"));
    assert!(!client.calls().contains(&"edit_comment"));
}

#[tokio::test]
async fn test_list_filtered_by_type() {
    let client = MockClient::new();
    let filter = ListFilter {
        kind: Some(CommentType::Review),
        ..Default::default()
    };
    let comments = ops::list_comments_matching(&client, OWNER, REPO, 1, &filter)
        .await
        .unwrap();
    assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![654321]);
}

#[tokio::test]
async fn test_list_filtered_by_author_and_time() {
    let client = MockClient::new();
    let everyone_after_noon = ListFilter {
        since: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()),
        ..Default::default()
    };
    let comments = ops::list_comments_matching(&client, OWNER, REPO, 1, &everyone_after_noon)
        .await
        .unwrap();
    assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![654321]);

    let nobody = ListFilter {
        author: Some("no-such-user*".to_owned()),
        ..Default::default()
    };
    let comments = ops::list_comments_matching(&client, OWNER, REPO, 1, &nobody)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_close_pending_review_defaults_to_comment() {
    let client = MockClient::new();
    ops::create_review(
        &client,
        OWNER,
        REPO,
        1,
        "",
        "",
        vec![ReviewCommentInput::new("main.go", 7, "typo")],
    )
    .await
    .unwrap();

    let closed = ops::close_pending_review(&client, OWNER, REPO, 1, "", "")
        .await
        .unwrap();
    assert_eq!(closed.state, "COMMENTED");
}

#[tokio::test]
async fn test_close_without_pending_review_points_at_web_ui() {
    let client = MockClient::new();
    let err = ops::close_pending_review(&client, OWNER, REPO, 1, "", "APPROVE")
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("no pending review found on PR #1"));
    assert!(msg.contains("web interface"));
    assert_eq!(client.calls(), vec!["list_reviews"]);
}
