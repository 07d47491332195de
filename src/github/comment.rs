use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which REST resource family a comment lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentType {
    /// General PR conversation comment (`issues/comments`)
    #[default]
    Issue,
    /// Line-anchored diff comment (`pulls/comments`)
    Review,
}

impl CommentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Review => "review",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "issue" => Some(Self::Issue),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A PR comment of either type.
///
/// `path` and `line` are only meaningful for review comments; a review
/// comment always carries a path, `line` is `None` once the comment is
/// outdated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Not part of the API payload; set by whoever fetched the comment.
    #[serde(rename = "type", default)]
    pub kind: CommentType,
}

impl Comment {
    pub fn tagged(mut self, kind: CommentType) -> Self {
        self.kind = kind;
        self
    }

    /// `path:line` for review comments, `None` for issue comments.
    pub fn location(&self) -> Option<String> {
        match (self.kind, &self.path) {
            (CommentType::Review, Some(path)) => Some(match self.line {
                Some(line) => format!("{}:{}", path, line),
                None => path.clone(),
            }),
            _ => None,
        }
    }
}

/// The fixed set of reactions GitHub accepts on comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    #[serde(rename = "+1")]
    PlusOne,
    #[serde(rename = "-1")]
    MinusOne,
    #[serde(rename = "laugh")]
    Laugh,
    #[serde(rename = "hooray")]
    Hooray,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "heart")]
    Heart,
    #[serde(rename = "rocket")]
    Rocket,
    #[serde(rename = "eyes")]
    Eyes,
}

impl Reaction {
    pub const TOKENS: [&'static str; 8] = [
        "+1", "-1", "laugh", "hooray", "confused", "heart", "rocket", "eyes",
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+1" => Some(Self::PlusOne),
            "-1" => Some(Self::MinusOne),
            "laugh" => Some(Self::Laugh),
            "hooray" => Some(Self::Hooray),
            "confused" => Some(Self::Confused),
            "heart" => Some(Self::Heart),
            "rocket" => Some(Self::Rocket),
            "eyes" => Some(Self::Eyes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlusOne => "+1",
            Self::MinusOne => "-1",
            Self::Laugh => "laugh",
            Self::Hooray => "hooray",
            Self::Confused => "confused",
            Self::Heart => "heart",
            Self::Rocket => "rocket",
            Self::Eyes => "eyes",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reaction as returned by the reactions endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub id: u64,
    pub content: String,
    pub user: User,
}

/// Payload for a single line comment, standalone or inside a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCommentInput {
    pub body: String,
    pub path: String,
    pub line: u32,
    #[serde(default = "default_side")]
    pub side: String,
    /// Left empty inside a review batch; filled with the PR head otherwise.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit_id: String,
}

fn default_side() -> String {
    "RIGHT".to_owned()
}

impl ReviewCommentInput {
    pub fn new(path: impl Into<String>, line: u32, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            path: path.into(),
            line,
            side: default_side(),
            commit_id: String::new(),
        }
    }

    /// Parse the `path:line:body` shorthand used on the command line.
    pub fn parse_flag(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, ':');
        let path = parts.next()?;
        let line = parts.next()?.trim().parse().ok()?;
        let body = parts.next()?;
        Some(Self::new(path, line, body))
    }
}

/// Plain-language explanation of the two comment types.
pub fn comment_type_help() -> &'static str {
    r#"Issue comments (general PR comments)
  - appear in the main conversation tab
  - are not tied to a line of code
  - add one with: gh comment add "message" --pr <PR>

Review comments (line-specific comments)
  - appear in the "Files changed" tab
  - are anchored to a file and line of the diff
  - add one with: gh comment add-line <file> <line> "message" --pr <PR>

Both kinds share one id space as far as this tool is concerned:
react, edit and resolve look the id up and pick the right endpoint.
Use `gh comment list <PR>` to see every comment with its type."#
}
