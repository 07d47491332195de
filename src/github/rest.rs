use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::api::GitHubApi;
use super::client::{GhCli, Method, Transport};
use super::comment::{Comment, CommentType, Reaction, ReactionRecord, ReviewCommentInput, User};
use super::review::{Review, ReviewEvent, ReviewInput};
use super::route::{self, CommentTarget};
use super::thread;

pub const DEFAULT_PER_PAGE: u32 = 100;

/// [`GitHubApi`] over the REST and GraphQL endpoints.
#[derive(Debug)]
pub struct RestClient<T = GhCli> {
    transport: T,
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct PullHead {
    head: HeadRef,
}

#[derive(Debug, Deserialize)]
struct HeadRef {
    sha: String,
}

impl<T: Transport> RestClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, 100);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch_and_parse<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        error_context: &'static str,
    ) -> Result<R> {
        let json = self.transport.rest(Method::Get, endpoint, None).await?;
        serde_json::from_value(json).context(error_context)
    }

    async fn fetch_all<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        error_context: &'static str,
    ) -> Result<Vec<R>> {
        let endpoint = format!("{}?per_page={}", endpoint, self.per_page);
        let json = self.transport.get_all(&endpoint).await?;
        serde_json::from_value(json).context(error_context)
    }

    async fn send<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &Value,
        error_context: &'static str,
    ) -> Result<R> {
        let json = self.transport.rest(method, endpoint, Some(body)).await?;
        serde_json::from_value(json).context(error_context)
    }

    async fn list_comments(
        &self,
        endpoint: &str,
        kind: CommentType,
        error_context: &'static str,
    ) -> Result<Vec<Comment>> {
        let comments: Vec<Comment> = self.fetch_all(endpoint, error_context).await?;
        Ok(comments.into_iter().map(|c| c.tagged(kind)).collect())
    }

    async fn current_user(&self) -> Result<String> {
        let user: User = self
            .fetch_and_parse("user", "Failed to parse current user response")
            .await?;
        Ok(user.login)
    }
}

#[async_trait]
impl<T: Transport> GitHubApi for RestClient<T> {
    async fn list_issue_comments(&self, owner: &str, repo: &str, pr: u32) -> Result<Vec<Comment>> {
        self.list_comments(
            &route::issue_comments_path(owner, repo, pr),
            CommentType::Issue,
            "Failed to parse issue comments response",
        )
        .await
    }

    async fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
    ) -> Result<Vec<Comment>> {
        self.list_comments(
            &route::review_comments_path(owner, repo, pr),
            CommentType::Review,
            "Failed to parse review comments response",
        )
        .await
    }

    async fn create_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        body: &str,
    ) -> Result<Comment> {
        let comment: Comment = self
            .send(
                Method::Post,
                &route::issue_comments_path(owner, repo, pr),
                &json!({ "body": body }),
                "Failed to parse created comment response",
            )
            .await?;
        Ok(comment.tagged(CommentType::Issue))
    }

    async fn create_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewCommentInput,
    ) -> Result<Comment> {
        let body = serde_json::to_value(input).context("Failed to encode review comment")?;
        let comment: Comment = self
            .send(
                Method::Post,
                &route::review_comments_path(owner, repo, pr),
                &body,
                "Failed to parse created comment response",
            )
            .await?;
        Ok(comment.tagged(CommentType::Review))
    }

    async fn reply_to_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        comment_id: u64,
        body: &str,
    ) -> Result<Comment> {
        let comment: Comment = self
            .send(
                Method::Post,
                &route::reply_path(owner, repo, pr, comment_id),
                &json!({ "body": body }),
                "Failed to parse reply comment response",
            )
            .await?;
        Ok(comment.tagged(CommentType::Review))
    }

    async fn add_reaction(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()> {
        let endpoint = target.reactions_path(owner, repo);
        debug!(%endpoint, %reaction, "adding reaction");
        self.transport
            .rest(
                Method::Post,
                &endpoint,
                Some(&json!({ "content": reaction.as_str() })),
            )
            .await?;
        Ok(())
    }

    async fn remove_reaction(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()> {
        let reactions: Vec<ReactionRecord> = self
            .fetch_all(
                &target.reactions_path(owner, repo),
                "Failed to parse reactions response",
            )
            .await?;
        let login = self.current_user().await?;

        let Some(existing) = reactions
            .iter()
            .find(|r| r.content == reaction.as_str() && r.user.login == login)
        else {
            anyhow::bail!(
                "reaction not found: {} has no '{}' reaction on comment {}",
                login,
                reaction,
                target.id
            );
        };

        let endpoint = target.reaction_path(owner, repo, existing.id);
        debug!(%endpoint, "removing reaction");
        self.transport.rest(Method::Delete, &endpoint, None).await?;
        Ok(())
    }

    async fn edit_comment(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        body: &str,
    ) -> Result<Comment> {
        let endpoint = target.comment_path(owner, repo);
        debug!(%endpoint, "editing comment");
        let comment: Comment = self
            .send(
                Method::Patch,
                &endpoint,
                &json!({ "body": body }),
                "Failed to parse edited comment response",
            )
            .await?;
        Ok(comment.tagged(target.kind))
    }

    async fn head_sha(&self, owner: &str, repo: &str, pr: u32) -> Result<String> {
        let pull: PullHead = self
            .fetch_and_parse(&route::pull_path(owner, repo, pr), "Failed to parse PR response")
            .await?;
        Ok(pull.head.sha)
    }

    async fn list_reviews(&self, owner: &str, repo: &str, pr: u32) -> Result<Vec<Review>> {
        self.fetch_all(
            &route::reviews_path(owner, repo, pr),
            "Failed to parse reviews response",
        )
        .await
    }

    async fn create_review(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewInput,
    ) -> Result<Review> {
        let body = serde_json::to_value(input).context("Failed to encode review")?;
        self.send(
            Method::Post,
            &route::reviews_path(owner, repo, pr),
            &body,
            "Failed to parse created review response",
        )
        .await
    }

    async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        review_id: u64,
        body: &str,
        event: ReviewEvent,
    ) -> Result<Review> {
        self.send(
            Method::Post,
            &route::review_events_path(owner, repo, pr, review_id),
            &json!({ "body": body, "event": event }),
            "Failed to parse submitted review response",
        )
        .await
    }

    async fn find_review_thread(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        comment_id: u64,
    ) -> Result<String> {
        let data = self
            .transport
            .graphql(
                thread::REVIEW_THREADS_QUERY,
                &thread::review_threads_variables(owner, repo, pr),
            )
            .await?;
        thread::find_thread_id(data, comment_id)?
            .ok_or_else(|| anyhow::anyhow!("thread not found for comment {}", comment_id))
    }

    async fn resolve_review_thread(&self, thread_id: &str) -> Result<()> {
        self.transport
            .graphql(
                thread::RESOLVE_THREAD_MUTATION,
                &thread::resolve_thread_variables(thread_id),
            )
            .await?;
        Ok(())
    }
}
