use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use gh_comment::config::Config;
use gh_comment::filter::{parse_time, ListFilter};
use gh_comment::github::{
    self, comment_type_help, ApiError, Comment, CommentType, EnhancedError, GhCli, GitHubApi,
    MockClient, RestClient, Review, ReviewCommentInput, ReviewEvent,
};
use gh_comment::ops;
use gh_comment::suggest::expand_suggestions;
use gh_comment::validate::split_repo;

/// Set to use the in-memory client instead of the network.
const MOCK_ENV: &str = "GH_COMMENT_MOCK";

#[derive(Parser, Debug)]
#[command(name = "gh-comment")]
#[command(about = "Manage GitHub PR comments without caring whether they are issue or review comments")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Repository name (e.g., "owner/repo")
    #[arg(short, long, global = true)]
    repo: Option<String>,

    /// Pull request number
    #[arg(short, long, global = true)]
    pr: Option<u32>,

    /// Post [SUGGEST: ...] and <<<SUGGEST blocks verbatim
    #[arg(long, global = true, default_value = "false")]
    no_expand_suggestions: bool,

    /// Log routing and classification decisions to stderr
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Explain issue comments versus review comments
    Types,
    #[command(flatten)]
    Pr(PrCommand),
}

/// Commands that act on one pull request.
#[derive(Subcommand, Debug)]
enum PrCommand {
    /// List every comment on the PR with its type
    List {
        /// Pull request number (same as --pr)
        #[arg(value_name = "PR")]
        number: Option<u32>,
        /// Only issue or only review comments
        #[arg(long = "type", value_parser = parse_comment_type)]
        kind: Option<CommentType>,
        /// Author login; supports wildcards ('alice*', '*@company.com')
        #[arg(long)]
        author: Option<String>,
        /// Created at or after (RFC 3339, YYYY-MM-DD, 'today', '3 days ago')
        #[arg(long, value_parser = parse_when)]
        since: Option<DateTime<Utc>>,
        /// Created at or before (same formats as --since)
        #[arg(long, value_parser = parse_when)]
        until: Option<DateTime<Utc>>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Print only comment ids, one per line
        #[arg(long, default_value = "false", conflicts_with = "format")]
        ids_only: bool,
    },
    /// Add a general comment to the PR conversation
    Add { body: String },
    /// Add a comment on a specific line of the diff
    AddLine {
        path: String,
        line: u32,
        body: String,
        /// Commit to anchor to (default: PR head)
        #[arg(long, default_value = "")]
        commit: String,
    },
    /// Reply in the thread of a review comment
    Reply {
        comment_id: u64,
        body: String,
        /// 'issue' posts a new conversation comment instead of a thread reply
        #[arg(long = "type", value_parser = parse_comment_type)]
        kind: Option<CommentType>,
    },
    /// Add a reaction to a comment of either type
    React {
        comment_id: u64,
        /// One of +1, -1, laugh, hooray, confused, heart, rocket, eyes
        reaction: String,
        /// Remove the reaction instead of adding it
        #[arg(long, default_value = "false")]
        remove: bool,
        /// Skip type detection (issue or review)
        #[arg(long = "type", value_parser = parse_comment_type)]
        kind: Option<CommentType>,
    },
    /// Replace the body of a comment of either type
    Edit {
        comment_id: u64,
        body: String,
        /// Skip type detection (issue or review)
        #[arg(long = "type", value_parser = parse_comment_type)]
        kind: Option<CommentType>,
    },
    /// Create a review from line comments
    Review {
        /// APPROVE, REQUEST_CHANGES or COMMENT (omit to leave it pending)
        #[arg(long, default_value = "")]
        event: String,
        /// Review summary
        #[arg(short, long, default_value = "")]
        body: String,
        /// Line comment as path:line:body (repeatable)
        #[arg(long = "comment", value_parser = parse_review_comment)]
        comments: Vec<ReviewCommentInput>,
    },
    /// Submit the PR's pending review
    SubmitReview {
        /// APPROVE, REQUEST_CHANGES or COMMENT (default from config)
        #[arg(long)]
        event: Option<String>,
        /// Review summary
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Submit a pending review started in GitHub's web interface
    ClosePendingReview {
        /// Review summary
        #[arg(value_name = "BODY", default_value = "")]
        body: String,
        /// APPROVE, REQUEST_CHANGES or COMMENT
        #[arg(long, default_value = "COMMENT")]
        event: String,
    },
    /// Resolve the review thread containing a comment
    Resolve { comment_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Default,
    Json,
}

/// `list --format json` document.
#[derive(Serialize)]
struct ListOutput<'a> {
    pr: u32,
    total: usize,
    comments: &'a [Comment],
}

fn parse_comment_type(s: &str) -> std::result::Result<CommentType, String> {
    CommentType::from_token(s).ok_or_else(|| format!("expected 'issue' or 'review', got '{}'", s))
}

fn parse_review_comment(s: &str) -> std::result::Result<ReviewCommentInput, String> {
    ReviewCommentInput::parse_flag(s).ok_or_else(|| format!("expected path:line:body, got '{}'", s))
}

fn parse_when(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_time(s, Utc::now()).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_client(config: &Config) -> Box<dyn GitHubApi> {
    if std::env::var_os(MOCK_ENV).is_some() {
        Box::new(MockClient::new())
    } else {
        Box::new(RestClient::new(GhCli::new()).with_per_page(config.api.per_page))
    }
}

async fn resolve_repo(arg: Option<String>, config: &Config) -> Result<String> {
    match arg.or_else(|| config.defaults.repo.clone()) {
        Some(repo) => Ok(repo),
        None => Ok(github::detect_repo().await?),
    }
}

async fn resolve_pr(arg: Option<u32>, config: &Config, repo: &str) -> Result<u32> {
    match arg.or(config.defaults.pr) {
        Some(pr) => Ok(pr),
        None => github::detect_pr(repo)
            .await
            .context("failed to detect PR number (try specifying --pr)"),
    }
}

fn format_comment(comment: &Comment) -> String {
    let location = comment
        .location()
        .map(|l| format!("  {}", l))
        .unwrap_or_default();
    let body: Vec<String> = comment
        .body
        .lines()
        .map(|line| format!("    {}", line))
        .collect();
    format!(
        "[{}] {:<6} @{}  {}{}\n{}",
        comment.id,
        comment.kind.as_str(),
        comment.user.login,
        comment.created_at.format("%Y-%m-%d %H:%M"),
        location,
        body.join("\n")
    )
}

/// Enhanced and labelled errors already carry their cause in the message.
fn render_error(err: &anyhow::Error) -> String {
    if err.downcast_ref::<EnhancedError>().is_some() || err.downcast_ref::<ApiError>().is_some() {
        err.to_string()
    } else {
        format!("Error: {:#}", err)
    }
}

fn submitted_line(review: &Review, pr: u32) -> String {
    match ReviewEvent::from_state(&review.state) {
        Some(event) => format!(
            "Submitted review #{} and {} PR #{}",
            review.id,
            event.past_tense(),
            pr
        ),
        None => format!("Submitted review #{} on PR #{} ({})", review.id, pr, review.state),
    }
}

fn print_comments(
    comments: &[Comment],
    pr: u32,
    format: Option<OutputFormat>,
    ids_only: bool,
) -> Result<()> {
    if ids_only {
        for comment in comments {
            println!("{}", comment.id);
        }
        return Ok(());
    }
    if format == Some(OutputFormat::Json) {
        let output = ListOutput {
            pr,
            total: comments.len(),
            comments,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("failed to encode JSON output")?
        );
        return Ok(());
    }
    if comments.is_empty() {
        println!("No comments on PR #{}", pr);
    }
    for comment in comments {
        println!("{}\n", format_comment(comment));
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let Args {
        command,
        repo,
        pr,
        no_expand_suggestions,
        verbose: _,
    } = args;

    match command {
        Commands::Types => {
            println!("{}", comment_type_help());
            Ok(())
        }
        Commands::Pr(command) => run_on_pr(command, repo, pr, !no_expand_suggestions).await,
    }
}

async fn run_on_pr(
    command: PrCommand,
    repo_arg: Option<String>,
    pr_arg: Option<u32>,
    expand: bool,
) -> Result<()> {
    let config = Config::load()?;
    let full_repo = resolve_repo(repo_arg, &config).await?;
    let (owner, repo) = split_repo(&full_repo)?;
    let pr_arg = match command {
        PrCommand::List {
            number: Some(number),
            ..
        } => Some(number),
        _ => pr_arg,
    };
    let pr = resolve_pr(pr_arg, &config, &full_repo).await?;
    let client = build_client(&config);
    let api = client.as_ref();
    let body_text = |body: String| if expand { expand_suggestions(&body) } else { body };

    match command {
        PrCommand::List {
            kind,
            author,
            since,
            until,
            format,
            ids_only,
            ..
        } => {
            let filter = ListFilter {
                kind,
                author,
                since,
                until,
            };
            let comments = ops::list_comments_matching(api, owner, repo, pr, &filter).await?;
            print_comments(&comments, pr, format, ids_only)?;
        }
        PrCommand::Add { body } => {
            let comment = ops::add_issue_comment(api, owner, repo, pr, &body_text(body)).await?;
            println!("Added comment #{} to PR #{}", comment.id, pr);
        }
        PrCommand::AddLine {
            path,
            line,
            body,
            commit,
        } => {
            let mut input = ReviewCommentInput::new(path, line, body_text(body));
            input.commit_id = commit;
            let comment = ops::add_review_comment(api, owner, repo, pr, input).await?;
            println!(
                "Added review comment #{} on {}",
                comment.id,
                comment.location().unwrap_or_default()
            );
        }
        PrCommand::Reply {
            comment_id,
            body,
            kind,
        } => {
            let reply =
                ops::reply_to_comment(api, owner, repo, pr, comment_id, &body_text(body), kind)
                    .await?;
            match reply.kind {
                CommentType::Issue => println!(
                    "Added issue comment #{} in reply to #{}",
                    reply.id, comment_id
                ),
                CommentType::Review => {
                    println!("Replied to comment #{} with #{}", comment_id, reply.id)
                }
            }
        }
        PrCommand::React {
            comment_id,
            reaction,
            remove,
            kind,
        } => {
            if remove {
                let target =
                    ops::remove_reaction(api, owner, repo, pr, comment_id, &reaction, kind).await?;
                println!(
                    "Removed {} reaction from {} comment #{}",
                    reaction, target.kind, comment_id
                );
            } else {
                let target =
                    ops::add_reaction(api, owner, repo, pr, comment_id, &reaction, kind).await?;
                println!(
                    "Added {} reaction to {} comment #{}",
                    reaction, target.kind, comment_id
                );
            }
        }
        PrCommand::Edit {
            comment_id,
            body,
            kind,
        } => {
            let comment = ops::edit_comment(api, owner, repo, pr, comment_id, &body, kind).await?;
            println!("Updated {} comment #{}", comment.kind, comment.id);
        }
        PrCommand::Review {
            event,
            body,
            comments,
        } => {
            let count = comments.len();
            let comments: Vec<ReviewCommentInput> = comments
                .into_iter()
                .map(|mut c| {
                    c.body = body_text(c.body);
                    c
                })
                .collect();
            let review =
                ops::create_review(api, owner, repo, pr, &body_text(body), &event, comments)
                    .await?;
            if review.is_pending() {
                println!(
                    "Created pending review #{} with {} comment(s); submit it with 'gh comment submit-review'",
                    review.id, count
                );
            } else {
                println!("Created review #{} with {} comment(s)", review.id, count);
            }
        }
        PrCommand::SubmitReview { event, body } => {
            let event = event.unwrap_or_else(|| config.review.event.clone());
            let review = ops::submit_pending_review(api, owner, repo, pr, &body, &event).await?;
            println!("{}", submitted_line(&review, pr));
        }
        PrCommand::ClosePendingReview { body, event } => {
            let review = ops::close_pending_review(api, owner, repo, pr, &body, &event).await?;
            println!("{}", submitted_line(&review, pr));
        }
        PrCommand::Resolve { comment_id } => {
            let thread = ops::resolve_thread(api, owner, repo, pr, comment_id).await?;
            println!("Resolved thread {} containing comment #{}", thread, comment_id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}
