//! Turns opaque API failures into actionable diagnostics.
//!
//! Two layers, both driven by the error text:
//!
//! * [`wrap_api_error`] labels a failure with the operation that caused it
//!   and a category tip (rate limit, not found, ...).
//! * [`analyze_and_enhance_error`] recognises specific failure shapes and
//!   builds an [`EnhancedError`] with suggestions and an optional
//!   ready-to-run corrected command.

use std::fmt;
use thiserror::Error;

use super::client::HttpError;

/// How the tool is invoked in suggestions.
pub const CLI_NAME: &str = "gh comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    RateLimit,
    NotFound,
    AuthFailure,
    Validation,
    SecondaryRateLimit,
    Generic,
}

impl ApiErrorKind {
    fn label(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate limit exceeded while trying to",
            Self::NotFound => "resource not found while trying to",
            Self::AuthFailure => "authentication failed while trying to",
            Self::Validation => "validation failed while trying to",
            Self::SecondaryRateLimit => "secondary rate limit triggered while trying to",
            Self::Generic => "failed to",
        }
    }

    pub fn tip(&self) -> Option<&'static str> {
        match self {
            Self::RateLimit => Some(
                "Check your rate limit status with 'gh api rate_limit' and wait for the reset before retrying",
            ),
            Self::NotFound => Some(
                "Verify the repository exists, you have access to it, and the PR or comment ID is correct",
            ),
            Self::AuthFailure => {
                Some("Re-authenticate with 'gh auth login' or check your token scopes")
            }
            Self::Validation => Some(
                "Check your input: review comments must target lines that are part of the PR diff",
            ),
            Self::SecondaryRateLimit => {
                Some("Wait about 60 seconds before making more requests")
            }
            Self::Generic => None,
        }
    }
}

/// Substring classification, first match wins.
pub fn classify(message: &str) -> ApiErrorKind {
    if message.contains("rate limit") || message.contains("403") {
        ApiErrorKind::RateLimit
    } else if message.contains("404") {
        ApiErrorKind::NotFound
    } else if message.contains("401") {
        ApiErrorKind::AuthFailure
    } else if message.contains("422") {
        ApiErrorKind::Validation
    } else if message.contains("abuse") || message.contains("secondary") {
        ApiErrorKind::SecondaryRateLimit
    } else {
        ApiErrorKind::Generic
    }
}

fn classify_status(status: u16) -> Option<ApiErrorKind> {
    match status {
        403 | 429 => Some(ApiErrorKind::RateLimit),
        404 => Some(ApiErrorKind::NotFound),
        401 => Some(ApiErrorKind::AuthFailure),
        422 => Some(ApiErrorKind::Validation),
        _ => None,
    }
}

/// Uses the HTTP status when the chain carries one, otherwise the text.
///
/// For an [`HttpError`] with an unmapped status only the server message is
/// searched; the endpoint holds PR and comment numbers and never counts.
pub fn classify_error(err: &anyhow::Error) -> ApiErrorKind {
    match err
        .chain()
        .find_map(|cause| cause.downcast_ref::<HttpError>())
    {
        Some(http) => classify_status(http.status).unwrap_or_else(|| classify(&http.message)),
        None => classify(&err.to_string()),
    }
}

/// A transport failure labelled with the operation it interrupted.
#[derive(Debug, Error)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub operation: String,
    #[source]
    pub source: anyhow::Error,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind.label(), self.operation, self.source)?;
        if let Some(tip) = self.kind.tip() {
            write!(f, "\nTip: {}", tip)?;
        }
        Ok(())
    }
}

/// Label `err` with `operation` ("list comments for PR #3").
///
/// The original error stays reachable through `chain()`/`downcast_ref`.
pub fn wrap_api_error(err: anyhow::Error, operation: impl Into<String>) -> anyhow::Error {
    let kind = classify_error(&err);
    ApiError {
        kind,
        operation: operation.into(),
        source: err,
    }
    .into()
}

/// A failure plus the guidance worked out for it.
#[derive(Debug, Error)]
pub struct EnhancedError {
    #[source]
    pub original: anyhow::Error,
    pub command: String,
    pub comment_id: u64,
    pub suggestions: Vec<String>,
    pub auto_fix: Option<String>,
}

impl EnhancedError {
    /// Swap the displayed error while keeping the analysis.
    pub fn map_original(self, f: impl FnOnce(anyhow::Error) -> anyhow::Error) -> Self {
        Self {
            original: f(self.original),
            ..self
        }
    }

    fn suggest(&mut self, suggestions: &[&str]) {
        self.suggestions
            .extend(suggestions.iter().map(|s| s.to_string()));
    }
}

impl fmt::Display for EnhancedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.original)?;
        writeln!(f)?;
        writeln!(f, "Intelligent Analysis:")?;
        for suggestion in &self.suggestions {
            writeln!(f, "  • {}", suggestion)?;
        }
        if let Some(auto_fix) = &self.auto_fix {
            writeln!(f)?;
            writeln!(f, "Auto-correction suggestion:")?;
            writeln!(f, "  {}", auto_fix)?;
        }
        Ok(())
    }
}

/// `command` re-run against the other comment family, with placeholders
/// for the positional arguments the command still needs.
fn rerun_with_type(command: &str, comment_id: u64, kind: &str) -> String {
    let rest = match command {
        "react" => " <reaction>",
        "edit" | "reply" => " \"<body>\"",
        _ => "",
    };
    format!(
        "{} {} {}{} --type {}",
        CLI_NAME, command, comment_id, rest, kind
    )
}

/// Match known failure shapes and attach suggestions.
///
/// Rules are additive. Each matching rule overwrites `auto_fix`, so when
/// several match the last one evaluated is what the user sees.
pub fn analyze_and_enhance_error(
    err: anyhow::Error,
    command: &str,
    comment_id: u64,
) -> EnhancedError {
    let message = err.to_string();
    let mut enhanced = EnhancedError {
        original: err,
        command: command.to_string(),
        comment_id,
        suggestions: Vec::new(),
        auto_fix: None,
    };

    // Replies are the one review-comment route shaped pulls/{pr}/comments/{id}/replies
    let review_route = message.contains("pulls/comments") || message.contains("/replies");
    if message.contains("404") && review_route {
        enhanced.suggest(&[
            "Comment ID might be for an issue comment (general PR comment), not a review comment",
            "Issue comments appear in the main conversation tab, not 'Files changed'",
            "Run 'gh comment list <PR>' to see all comment types with their IDs",
        ]);
        enhanced.auto_fix = Some(rerun_with_type(command, comment_id, "issue"));
    }

    if message.contains("404") && message.contains("issues/comments") {
        enhanced.suggest(&[
            "Comment ID might be for a review comment (line-specific), not an issue comment",
            "Review comments show a file location such as 'src/main.rs:42' in list output",
            "Issue comments have no file location and appear in the main conversation",
        ]);
        enhanced.auto_fix = Some(rerun_with_type(command, comment_id, "review"));
    }

    if message.contains("in_reply_to_id") && message.contains("not permitted") {
        enhanced.suggest(&[
            "Threaded replies are not permitted for this comment",
            "Use reactions for quick feedback: +1, -1, laugh, confused, heart, hooray, rocket, eyes",
            "For longer responses, create a new comment: 'gh comment add-line <PR> <file> <line> \"response\"'",
        ]);
        enhanced.auto_fix = Some(format!(
            "{} react {} +1  # quick acknowledgement",
            CLI_NAME, comment_id
        ));
    }

    if message.contains("422") && message.contains("commitId") {
        enhanced.suggest(&[
            "Review creation needs a valid commit ID for each comment",
            "The PR might have new commits since the review was started",
            "Use individual 'gh comment add-line' commands instead of bulk review creation",
        ]);
        enhanced.auto_fix = Some(format!(
            "{} add-line <PR> <file> <line> \"comment\"  # targets the current head commit",
            CLI_NAME
        ));
    }

    if message.contains("resource not found") {
        enhanced.suggest(&[
            "Comment ID doesn't exist or you lack repository access",
            "Use 'gh comment list <PR>' to see all available comments with IDs",
            "Comment IDs are the numbers shown next to each comment in the list output",
        ]);
        enhanced.auto_fix = Some(format!(
            "{} list <PR>  # see all comments and their IDs",
            CLI_NAME
        ));
    }

    match command {
        "reply" => enhanced.suggest(&[
            "Reply alternatives from 'gh comment reply --help':",
            "  - react instead: gh comment react <ID> heart",
            "  - resolve the conversation: gh comment resolve <ID>",
            "  - propose code: \"[SUGGEST: improved code]\" becomes a suggestion block",
        ]),
        "edit" => enhanced.suggest(&[
            "Edit works on both issue and review comments",
            "  - pass --type issue or --type review to skip type detection",
        ]),
        "review" => enhanced.suggest(&[
            "Review alternatives from 'gh comment review --help':",
            "  - try individual comments: 'gh comment add-line <PR> <file> <line> \"comment\"'",
            "  - leave --event off to keep the review as a pending draft",
        ]),
        _ => {}
    }

    enhanced.suggestions.push(format!(
        "See '{} {} --help' for detailed examples and usage",
        CLI_NAME, command
    ));

    enhanced
}
