mod api;
mod client;
pub mod comment;
mod detect;
pub mod error;
pub mod mock;
mod rest;
pub mod review;
mod route;
pub mod scripted;
pub mod thread;

// Explicit re-exports - only export what is actually used
pub use api::GitHubApi;
pub use client::{
    detect_pr, detect_repo, parse_http_status, DetectRepoError, GhCli, HttpError, Method,
    Transport,
};
pub use comment::{comment_type_help, Comment, CommentType, Reaction, ReviewCommentInput, User};
pub use detect::{detect_comment_type, CommentInfo};
pub use error::{
    analyze_and_enhance_error, classify, classify_error, wrap_api_error, ApiError, ApiErrorKind,
    EnhancedError,
};
pub use mock::MockClient;
pub use rest::{RestClient, DEFAULT_PER_PAGE};
pub use review::{find_pending_review, Review, ReviewEvent, ReviewInput};
pub use route::{route_comment, CommentNotFound, CommentTarget};
pub use scripted::{RecordedCall, ScriptedTransport};
