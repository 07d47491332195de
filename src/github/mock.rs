use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::api::GitHubApi;
use super::client::{HttpError, Method};
use super::comment::{Comment, CommentType, Reaction, ReviewCommentInput, User};
use super::review::{Review, ReviewEvent, ReviewInput};
use super::route::{self, CommentTarget};
use super::scripted::lock;

pub const MOCK_HEAD_SHA: &str = "abc123def4567890";

#[derive(Debug)]
struct MockState {
    issue_comments: Vec<Comment>,
    review_comments: Vec<Comment>,
    reviews: Vec<Review>,
    reactions: Vec<(CommentTarget, Reaction)>,
    resolved_threads: Vec<String>,
    failures: HashMap<&'static str, String>,
    calls: Vec<&'static str>,
    next_id: u64,
}

/// In-memory [`GitHubApi`], seeded with one comment of each type.
#[derive(Debug)]
pub struct MockClient {
    state: Mutex<MockState>,
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

fn user(login: &str) -> User {
    User {
        login: login.to_string(),
    }
}

fn not_found(method: Method, endpoint: String) -> anyhow::Error {
    HttpError {
        status: 404,
        method,
        endpoint,
        message: "Not Found".to_string(),
    }
    .into()
}

fn unprocessable(method: Method, endpoint: String, message: &str) -> anyhow::Error {
    HttpError {
        status: 422,
        method,
        endpoint,
        message: message.to_string(),
    }
    .into()
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        let client = Self::empty();
        client.push_comment(Comment {
            id: 123456,
            body: "LGTM! Great work on this PR.".to_string(),
            user: user("reviewer1"),
            created_at: at(12),
            updated_at: at(12),
            path: None,
            line: None,
            kind: CommentType::Issue,
        });
        client.push_comment(Comment {
            id: 654321,
            body: "Consider using a more descriptive variable name here.".to_string(),
            user: user("reviewer2"),
            created_at: at(13),
            updated_at: at(13),
            path: Some("main.go".to_string()),
            line: Some(42),
            kind: CommentType::Review,
        });
        client
    }

    pub fn empty() -> Self {
        Self {
            state: Mutex::new(MockState {
                issue_comments: Vec::new(),
                review_comments: Vec::new(),
                reviews: Vec::new(),
                reactions: Vec::new(),
                resolved_threads: Vec::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
                next_id: 789012,
            }),
        }
    }

    /// Seed a comment into the collection matching its `kind`.
    pub fn push_comment(&self, comment: Comment) {
        let mut state = lock(&self.state);
        match comment.kind {
            CommentType::Issue => state.issue_comments.push(comment),
            CommentType::Review => state.review_comments.push(comment),
        }
    }

    pub fn push_review(&self, review: Review) {
        lock(&self.state).reviews.push(review);
    }

    /// Make `operation` (a trait method name) fail with `message`.
    pub fn fail(&self, operation: &'static str, message: &str) {
        lock(&self.state)
            .failures
            .insert(operation, message.to_string());
    }

    /// Trait methods invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    pub fn reactions(&self) -> Vec<(CommentTarget, Reaction)> {
        lock(&self.state).reactions.clone()
    }

    pub fn resolved_threads(&self) -> Vec<String> {
        lock(&self.state).resolved_threads.clone()
    }

    pub fn comments(&self, kind: CommentType) -> Vec<Comment> {
        let state = lock(&self.state);
        match kind {
            CommentType::Issue => state.issue_comments.clone(),
            CommentType::Review => state.review_comments.clone(),
        }
    }

    pub fn reviews(&self) -> Vec<Review> {
        lock(&self.state).reviews.clone()
    }

    /// Record the call and return the injected failure, if any.
    fn enter(&self, operation: &'static str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(operation);
        match state.failures.get(operation) {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

impl MockState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn collection_mut(&mut self, kind: CommentType) -> &mut Vec<Comment> {
        match kind {
            CommentType::Issue => &mut self.issue_comments,
            CommentType::Review => &mut self.review_comments,
        }
    }

    fn new_comment(&mut self, body: &str, kind: CommentType) -> Comment {
        let now = Utc::now();
        Comment {
            id: self.next_id(),
            body: body.to_string(),
            user: user("testuser"),
            created_at: now,
            updated_at: now,
            path: None,
            line: None,
            kind,
        }
    }
}

#[async_trait]
impl GitHubApi for MockClient {
    async fn list_issue_comments(&self, _owner: &str, _repo: &str, _pr: u32) -> Result<Vec<Comment>> {
        self.enter("list_issue_comments")?;
        Ok(self.comments(CommentType::Issue))
    }

    async fn list_review_comments(
        &self,
        _owner: &str,
        _repo: &str,
        _pr: u32,
    ) -> Result<Vec<Comment>> {
        self.enter("list_review_comments")?;
        Ok(self.comments(CommentType::Review))
    }

    async fn create_issue_comment(
        &self,
        _owner: &str,
        _repo: &str,
        _pr: u32,
        body: &str,
    ) -> Result<Comment> {
        self.enter("create_issue_comment")?;
        let mut state = lock(&self.state);
        let comment = state.new_comment(body, CommentType::Issue);
        state.issue_comments.push(comment.clone());
        Ok(comment)
    }

    async fn create_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewCommentInput,
    ) -> Result<Comment> {
        self.enter("create_review_comment")?;
        if input.commit_id != MOCK_HEAD_SHA {
            return Err(unprocessable(
                Method::Post,
                route::review_comments_path(owner, repo, pr),
                "commitId is not part of the pull request",
            ));
        }
        let mut state = lock(&self.state);
        let mut comment = state.new_comment(&input.body, CommentType::Review);
        comment.path = Some(input.path.clone());
        comment.line = Some(input.line);
        state.review_comments.push(comment.clone());
        Ok(comment)
    }

    async fn reply_to_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        comment_id: u64,
        body: &str,
    ) -> Result<Comment> {
        self.enter("reply_to_review_comment")?;
        let mut state = lock(&self.state);
        let Some(parent) = state
            .review_comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
        else {
            return Err(not_found(
                Method::Post,
                route::reply_path(owner, repo, pr, comment_id),
            ));
        };
        let mut reply = state.new_comment(body, CommentType::Review);
        reply.path = parent.path;
        reply.line = parent.line;
        state.review_comments.push(reply.clone());
        Ok(reply)
    }

    async fn add_reaction(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()> {
        self.enter("add_reaction")?;
        let mut state = lock(&self.state);
        if !state
            .collection_mut(target.kind)
            .iter()
            .any(|c| c.id == target.id)
        {
            return Err(not_found(Method::Post, target.reactions_path(owner, repo)));
        }
        if !state.reactions.contains(&(target, reaction)) {
            state.reactions.push((target, reaction));
        }
        Ok(())
    }

    async fn remove_reaction(
        &self,
        _owner: &str,
        _repo: &str,
        target: CommentTarget,
        reaction: Reaction,
    ) -> Result<()> {
        self.enter("remove_reaction")?;
        let mut state = lock(&self.state);
        let before = state.reactions.len();
        state.reactions.retain(|entry| entry != &(target, reaction));
        if state.reactions.len() == before {
            anyhow::bail!(
                "reaction not found: no '{}' reaction on comment {}",
                reaction,
                target.id
            );
        }
        Ok(())
    }

    async fn edit_comment(
        &self,
        owner: &str,
        repo: &str,
        target: CommentTarget,
        body: &str,
    ) -> Result<Comment> {
        self.enter("edit_comment")?;
        let mut state = lock(&self.state);
        let Some(comment) = state
            .collection_mut(target.kind)
            .iter_mut()
            .find(|c| c.id == target.id)
        else {
            return Err(not_found(Method::Patch, target.comment_path(owner, repo)));
        };
        comment.body = body.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn head_sha(&self, _owner: &str, _repo: &str, _pr: u32) -> Result<String> {
        self.enter("head_sha")?;
        Ok(MOCK_HEAD_SHA.to_string())
    }

    async fn list_reviews(&self, _owner: &str, _repo: &str, _pr: u32) -> Result<Vec<Review>> {
        self.enter("list_reviews")?;
        Ok(self.reviews())
    }

    async fn create_review(
        &self,
        owner: &str,
        repo: &str,
        pr: u32,
        input: &ReviewInput,
    ) -> Result<Review> {
        self.enter("create_review")?;
        if input.commit_id.as_deref().is_some_and(|sha| sha != MOCK_HEAD_SHA) {
            return Err(unprocessable(
                Method::Post,
                route::reviews_path(owner, repo, pr),
                "commitId is not part of the pull request",
            ));
        }
        let mut state = lock(&self.state);
        for draft in &input.comments {
            let mut comment = state.new_comment(&draft.body, CommentType::Review);
            comment.path = Some(draft.path.clone());
            comment.line = Some(draft.line);
            state.review_comments.push(comment);
        }
        let review = Review {
            id: state.next_id(),
            body: Some(input.body.clone()),
            state: review_state(input.event).to_string(),
            user: user("testuser"),
            submitted_at: input.event.map(|_| Utc::now().to_rfc3339()),
        };
        state.reviews.push(review.clone());
        Ok(review)
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
        self.enter("submit_review")?;
        let mut state = lock(&self.state);
        let Some(review) = state
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id && r.is_pending())
        else {
            return Err(not_found(
                Method::Post,
                route::review_events_path(owner, repo, pr, review_id),
            ));
        };
        review.body = Some(body.to_string());
        review.state = review_state(Some(event)).to_string();
        review.submitted_at = Some(Utc::now().to_rfc3339());
        Ok(review.clone())
    }

    async fn find_review_thread(
        &self,
        _owner: &str,
        _repo: &str,
        _pr: u32,
        comment_id: u64,
    ) -> Result<String> {
        self.enter("find_review_thread")?;
        if self
            .comments(CommentType::Review)
            .iter()
            .any(|c| c.id == comment_id)
        {
            Ok(format!("RT_{}", comment_id))
        } else {
            anyhow::bail!("thread not found for comment {}", comment_id)
        }
    }

    async fn resolve_review_thread(&self, thread_id: &str) -> Result<()> {
        self.enter("resolve_review_thread")?;
        lock(&self.state)
            .resolved_threads
            .push(thread_id.to_string());
        Ok(())
    }
}

fn review_state(event: Option<ReviewEvent>) -> &'static str {
    event.map_or("PENDING", |event| event.submitted_state())
}
