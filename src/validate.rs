//! Pre-flight argument checks.
//!
//! Every public operation runs these before touching the network. Guards
//! are applied in a fixed order (repository, positive ids, body, then
//! domain checks) and the first failure wins, so callers always see the
//! same message for the same bad input.

use thiserror::Error;

use crate::github::{Reaction, ReviewEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidArgument(String),
}

impl ValidationError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub fn validate_repo_params(owner: &str, repo: &str) -> Result<(), ValidationError> {
    if owner.is_empty() {
        return Err(ValidationError::invalid("repository owner cannot be empty"));
    }
    if repo.is_empty() {
        return Err(ValidationError::invalid("repository name cannot be empty"));
    }
    if has_path_separator(owner) || has_path_separator(repo) {
        return Err(ValidationError::invalid("invalid repository format"));
    }
    Ok(())
}

/// Split `owner/repo` and validate both halves.
pub fn split_repo(full_name: &str) -> Result<(&str, &str), ValidationError> {
    let (owner, repo) = full_name.split_once('/').ok_or_else(|| {
        ValidationError::invalid(format!(
            "invalid repository format: {} (expected owner/repo)",
            full_name
        ))
    })?;
    validate_repo_params(owner, repo)?;
    Ok((owner, repo))
}

fn has_path_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}

/// `name` is the human label used in the message, e.g. "PR number".
pub fn validate_positive(name: &str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::invalid(format!(
            "invalid {} {}: must be positive",
            name, value
        )));
    }
    Ok(())
}

pub fn validate_pr_number(pr_number: u32) -> Result<(), ValidationError> {
    validate_positive("PR number", u64::from(pr_number))
}

pub fn validate_comment_id(comment_id: u64) -> Result<(), ValidationError> {
    validate_positive("comment ID", comment_id)
}

pub fn validate_review_id(review_id: u64) -> Result<(), ValidationError> {
    validate_positive("review ID", review_id)
}

/// `kind` names the body in the message ("comment", "reply", "review").
pub fn validate_body(kind: &str, body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::invalid(format!(
            "{} body cannot be empty",
            kind
        )));
    }
    Ok(())
}

pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if path.trim().is_empty() {
        return Err(ValidationError::invalid("file path cannot be empty"));
    }
    Ok(())
}

pub fn validate_reaction(reaction: &str) -> Result<Reaction, ValidationError> {
    Reaction::from_token(reaction).ok_or_else(|| {
        ValidationError::invalid(format!(
            "invalid reaction '{}': must be one of {}",
            reaction,
            Reaction::TOKENS.join(", ")
        ))
    })
}

/// An empty event means "no event" and yields `None`.
pub fn validate_review_event(event: &str) -> Result<Option<ReviewEvent>, ValidationError> {
    if event.is_empty() {
        return Ok(None);
    }
    ReviewEvent::from_token(event).map(Some).ok_or_else(|| {
        ValidationError::invalid(format!(
            "invalid review event '{}': must be APPROVE, REQUEST_CHANGES, or COMMENT",
            event
        ))
    })
}

/// Like [`validate_review_event`] but an event must be present.
pub fn require_review_event(event: &str) -> Result<ReviewEvent, ValidationError> {
    validate_review_event(event)?
        .ok_or_else(|| ValidationError::invalid("review event cannot be empty"))
}
