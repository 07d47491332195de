//! REST path templates and the choice between the two comment families.

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use super::api::GitHubApi;
use super::comment::CommentType;
use super::detect::detect_comment_type;
use super::error::analyze_and_enhance_error;

pub fn issue_comments_path(owner: &str, repo: &str, pr: u32) -> String {
    format!("repos/{}/{}/issues/{}/comments", owner, repo, pr)
}

pub fn review_comments_path(owner: &str, repo: &str, pr: u32) -> String {
    format!("repos/{}/{}/pulls/{}/comments", owner, repo, pr)
}

pub fn reply_path(owner: &str, repo: &str, pr: u32, comment_id: u64) -> String {
    format!(
        "repos/{}/{}/pulls/{}/comments/{}/replies",
        owner, repo, pr, comment_id
    )
}

pub fn pull_path(owner: &str, repo: &str, pr: u32) -> String {
    format!("repos/{}/{}/pulls/{}", owner, repo, pr)
}

pub fn reviews_path(owner: &str, repo: &str, pr: u32) -> String {
    format!("repos/{}/{}/pulls/{}/reviews", owner, repo, pr)
}

pub fn review_events_path(owner: &str, repo: &str, pr: u32, review_id: u64) -> String {
    format!(
        "repos/{}/{}/pulls/{}/reviews/{}/events",
        owner, repo, pr, review_id
    )
}

/// A comment id whose family is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentTarget {
    pub id: u64,
    pub kind: CommentType,
}

impl CommentTarget {
    pub fn new(id: u64, kind: CommentType) -> Self {
        Self { id, kind }
    }

    fn family(&self) -> &'static str {
        match self.kind {
            CommentType::Review => "pulls",
            CommentType::Issue => "issues",
        }
    }

    /// Edit endpoint.
    pub fn comment_path(&self, owner: &str, repo: &str) -> String {
        format!(
            "repos/{}/{}/{}/comments/{}",
            owner,
            repo,
            self.family(),
            self.id
        )
    }

    pub fn reactions_path(&self, owner: &str, repo: &str) -> String {
        format!("{}/reactions", self.comment_path(owner, repo))
    }

    pub fn reaction_path(&self, owner: &str, repo: &str, reaction_id: u64) -> String {
        format!("{}/{}", self.reactions_path(owner, repo), reaction_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("comment {comment_id} not found on PR #{pr}: resource not found in issue or review comments")]
pub struct CommentNotFound {
    pub comment_id: u64,
    pub pr: u32,
}

/// Work out which family `comment_id` belongs to.
///
/// With a `hint` no lookup happens. Otherwise the comment is classified,
/// and an unknown id becomes an enhanced not-found error for `command`
/// instead of a guessed endpoint.
pub async fn route_comment<A: GitHubApi + ?Sized>(
    api: &A,
    owner: &str,
    repo: &str,
    pr: u32,
    comment_id: u64,
    hint: Option<CommentType>,
    command: &str,
) -> Result<CommentTarget> {
    if let Some(kind) = hint {
        debug!(comment_id, %kind, "comment type given explicitly");
        return Ok(CommentTarget::new(comment_id, kind));
    }

    let info = detect_comment_type(api, owner, repo, comment_id, pr).await?;
    match info.kind {
        Some(kind) if info.found => Ok(CommentTarget::new(comment_id, kind)),
        _ => Err(analyze_and_enhance_error(
            CommentNotFound { comment_id, pr }.into(),
            command,
            comment_id,
        )
        .into()),
    }
}
