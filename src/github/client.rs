use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DetectRepoError {
    #[error("Not a git repository. Use --repo to specify.")]
    NotGitRepo,
    #[error("No GitHub remote found. Use --repo to specify.")]
    NoGitHubRemote,
    #[error("No pull request found for the current branch. Use --pr to specify.")]
    NoPullRequest,
    #[error("gh CLI error: {0}")]
    GhError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-2xx answer from the API, with the status preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {message} ({endpoint})")]
pub struct HttpError {
    pub status: u16,
    pub method: Method,
    pub endpoint: String,
    pub message: String,
}

/// Authenticated access to the REST and GraphQL APIs.
///
/// One request per call; no retries. Timeouts and cancellation belong to
/// the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one REST request. A 204 comes back as `Value::Null`.
    async fn rest(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value>;

    /// GET every page of an array endpoint, merged into one array.
    async fn get_all(&self, endpoint: &str) -> Result<Value> {
        self.rest(Method::Get, endpoint, None).await
    }

    /// Run a GraphQL document and return its `data` object.
    async fn graphql(&self, query: &str, variables: &Value) -> Result<Value>;
}

/// Detect the repository name from the current directory using `gh repo view`
pub async fn detect_repo() -> std::result::Result<String, DetectRepoError> {
    let output = run_gh_query(&[
        "repo",
        "view",
        "--json",
        "nameWithOwner",
        "-q",
        ".nameWithOwner",
    ])
    .await?;

    match output {
        Ok(repo) if repo.is_empty() => Err(DetectRepoError::NoGitHubRemote),
        Ok(repo) => Ok(repo),
        Err(stderr) => {
            if stderr.contains("not a git repository") {
                Err(DetectRepoError::NotGitRepo)
            } else if stderr.contains("no git remotes") || stderr.contains("could not determine")
            {
                Err(DetectRepoError::NoGitHubRemote)
            } else {
                Err(DetectRepoError::GhError(stderr))
            }
        }
    }
}

/// Detect the PR number for the checked-out branch using `gh pr view`
pub async fn detect_pr(repo: &str) -> std::result::Result<u32, DetectRepoError> {
    match run_gh_query(&["pr", "view", "-R", repo, "--json", "number", "-q", ".number"]).await? {
        Ok(number) => number
            .parse()
            .map_err(|_| DetectRepoError::NoPullRequest),
        Err(stderr) if stderr.contains("no pull requests found") => {
            Err(DetectRepoError::NoPullRequest)
        }
        Err(stderr) => Err(DetectRepoError::GhError(stderr)),
    }
}

/// Runs a read-only gh query; the inner `Err` carries trimmed stderr.
async fn run_gh_query(
    args: &[&str],
) -> std::result::Result<std::result::Result<String, String>, DetectRepoError> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let result = tokio::task::spawn_blocking(move || Command::new("gh").args(&args).output()).await;

    match result {
        Ok(Ok(output)) if output.status.success() => {
            Ok(Ok(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        }
        Ok(Ok(output)) => Ok(Err(String::from_utf8_lossy(&output.stderr).trim().to_string())),
        Ok(Err(e)) => Err(DetectRepoError::GhError(format!(
            "Failed to execute gh CLI: {}",
            e
        ))),
        Err(e) => Err(DetectRepoError::GhError(format!(
            "spawn_blocking task panicked: {}",
            e
        ))),
    }
}

/// Field type for gh api command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// String field (-f)
    String(String),
    /// Raw/typed field (-F) - for integers, booleans, null
    Raw(String),
}

impl FieldValue {
    /// GraphQL variables: strings go through -f, everything else through -F.
    fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::String(s.clone()),
            other => Self::Raw(other.to_string()),
        }
    }

    fn push_args(&self, key: &str, args: &mut Vec<String>) {
        let (flag, value) = match self {
            Self::String(v) => ("-f", v),
            Self::Raw(v) => ("-F", v),
        };
        args.push(flag.to_string());
        args.push(format!("{}={}", key, value));
    }
}

/// Pull the status out of gh's "... (HTTP 404)" stderr suffix.
pub fn parse_http_status(stderr: &str) -> Option<u16> {
    let start = stderr.rfind("(HTTP ")? + "(HTTP ".len();
    let digits: String = stderr[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Production transport: shells out to the authenticated `gh` CLI.
#[derive(Debug, Clone, Default)]
pub struct GhCli;

impl GhCli {
    pub fn new() -> Self {
        Self
    }

    /// Execute gh CLI command and return stdout
    /// Uses spawn_blocking to avoid blocking the tokio runtime
    async fn gh_command(
        &self,
        args: Vec<String>,
        stdin: Option<String>,
        request: Option<(Method, String)>,
    ) -> Result<String> {
        tokio::task::spawn_blocking(move || {
            let mut child = Command::new("gh")
                .args(&args)
                .stdin(if stdin.is_some() {
                    Stdio::piped()
                } else {
                    Stdio::null()
                })
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .context("Failed to execute gh CLI - is it installed?")?;

            if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(input.as_bytes())
                    .context("Failed to write request body to gh")?;
            }

            let output = child
                .wait_with_output()
                .context("Failed to wait for gh CLI")?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if let (Some(status), Some((method, endpoint))) =
                    (parse_http_status(&stderr), request)
                {
                    return Err(HttpError {
                        status,
                        method,
                        endpoint,
                        message: stderr,
                    }
                    .into());
                }
                anyhow::bail!("gh command failed: {}", stderr);
            }

            String::from_utf8(output.stdout).context("gh output contains invalid UTF-8")
        })
        .await
        .context("spawn_blocking task panicked")?
    }
}

fn parse_json_output(output: &str) -> Result<Value> {
    if output.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(output).context("Failed to parse gh api response as JSON")
}

#[async_trait]
impl Transport for GhCli {
    async fn rest(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        debug!(%method, endpoint, "gh api request");
        let mut args = vec![
            "api".to_string(),
            "--method".to_string(),
            method.as_str().to_string(),
            endpoint.to_string(),
        ];
        let stdin = match body {
            Some(body) => {
                args.push("--input".to_string());
                args.push("-".to_string());
                Some(serde_json::to_string(body).context("Failed to encode request body")?)
            }
            None => None,
        };
        let output = self
            .gh_command(args, stdin, Some((method, endpoint.to_string())))
            .await?;
        parse_json_output(&output)
    }

    /// Execute gh api command with automatic pagination for array endpoints.
    /// Caller should include `per_page=100` in endpoint if desired.
    async fn get_all(&self, endpoint: &str) -> Result<Value> {
        debug!(endpoint, "gh api paginated request");
        let args = vec![
            "api".to_string(),
            "--paginate".to_string(),
            "--slurp".to_string(),
            endpoint.to_string(),
        ];
        let output = self
            .gh_command(args, None, Some((Method::Get, endpoint.to_string())))
            .await?;
        let pages: Vec<Value> =
            serde_json::from_str(&output).context("Failed to parse gh api paginated response")?;
        let mut result = Vec::new();
        for page in pages {
            if let Value::Array(items) = page {
                result.extend(items);
            }
        }
        Ok(Value::Array(result))
    }

    async fn graphql(&self, query: &str, variables: &Value) -> Result<Value> {
        let mut args = vec!["api".to_string(), "graphql".to_string()];
        FieldValue::String(query.to_string()).push_args("query", &mut args);
        if let Value::Object(vars) = variables {
            for (key, value) in vars {
                FieldValue::from_json(value).push_args(key, &mut args);
            }
        }
        let output = self
            .gh_command(args, None, Some((Method::Post, "graphql".to_string())))
            .await?;
        let mut response = parse_json_output(&output)?;
        Ok(response
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}
