use anyhow::Result;
use async_trait::async_trait;

use super::comment::{Comment, Reaction, ReviewCommentInput};
use super::review::{Review, ReviewEvent, ReviewInput};
use super::route::CommentTarget;

/// Everything the tool needs from GitHub.
///
/// Implemented by [`RestClient`](super::RestClient) (real network, or a
/// scripted transport in tests) and by [`MockClient`](super::MockClient).
/// Implementations do no argument validation; that happens in
/// [`crate::ops`] before any of these are called.
///
/// NOTE: async-trait keeps the trait dyn-compatible so the binary can pick
/// an implementation at runtime.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn list_issue_comments(&self, owner: &str, repo: &str, pr: u32) -> Result<Vec<Comment>>;

    async fn list_review_comments(&self, owner: &str, repo: &str, pr: u32)
        -> Result<Vec<Comment>>;

    async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        body: &str,
    ) -> Result<Comment>;

    async fn create_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewCommentInput,
    ) -> Result<Comment>;

    async fn reply_to_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        comment_id: u64,
        body: &str,
    ) -> Result<Comment>;

    async fn add_reaction(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()>;

    /// Removes the authenticated user's `reaction` from the comment.
    async fn remove_reaction(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()>;

    async fn edit_comment(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        body: &str,
    ) -> Result<Comment>;

    /// SHA of the PR head, used when a line comment has no commit id.
    async fn head_sha(&self, owner: &str, repo: &str, pr: u32) -> Result<String>;

    async fn list_reviews(&self, owner: &str, repo: &str, pr: u32) -> Result<Vec<Review>>;

    async fn create_review(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewInput,
    ) -> Result<Review>;

    async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        review_id: u64,
        body: &str,
        event: ReviewEvent,
    ) -> Result<Review>;

    /// GraphQL node id of the review thread containing `comment_id`.
    async fn find_review_thread(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        comment_id: u64,
    ) -> Result<String>;

    async fn resolve_review_thread(&self, thread_id: &str) -> Result<()>;
}
