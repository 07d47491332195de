use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

pub const REVIEW_THREADS_QUERY: &str = r#"query($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      reviewThreads(first: 100) {
        nodes {
          id
          isResolved
          comments(first: 100) {
            nodes {
              databaseId
            }
          }
        }
      }
    }
  }
}"#;

pub const RESOLVE_THREAD_MUTATION: &str = r#"mutation($threadId: ID!) {
  resolveReviewThread(input: {threadId: $threadId}) {
    thread {
      id
      isResolved
    }
  }
}"#;

pub fn review_threads_variables(owner: &str, repo: &str, pr: u32) -> Value {
    json!({
        "owner": owner,
        "name": repo,
        "number": pr,
    })
}

pub fn resolve_thread_variables(thread_id: &str) -> Value {
    json!({ "threadId": thread_id })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThreadsData {
    repository: Repository,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repository {
    pull_request: PullRequestThreads,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestThreads {
    review_threads: Nodes<ReviewThread>,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThread {
    id: String,
    comments: Nodes<ThreadComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadComment {
    database_id: Option<u64>,
}

/// Node id of the thread whose comments include `comment_id`.
pub fn find_thread_id(data: Value, comment_id: u64) -> Result<Option<String>> {
    let data: ReviewThreadsData =
        serde_json::from_value(data).context("Failed to parse review threads response")?;
    Ok(data
        .repository
        .pull_request
        .review_threads
        .nodes
        .into_iter()
        .find(|thread| {
            thread
                .comments
                .nodes
                .iter()
                .any(|c| c.database_id == Some(comment_id))
        })
        .map(|thread| thread.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threads() -> Value {
        json!({
            "repository": {
                "pullRequest": {
                    "reviewThreads": {
                        "nodes": [
                            {
                                "id": "RT_1",
                                "isResolved": false,
                                "comments": {"nodes": [{"databaseId": 10}, {"databaseId": 11}]}
                            },
                            {
                                "id": "RT_2",
                                "isResolved": true,
                                "comments": {"nodes": [{"databaseId": 654321}]}
                            }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_find_thread_id() {
        assert_eq!(find_thread_id(threads(), 11).unwrap().as_deref(), Some("RT_1"));
        assert_eq!(
            find_thread_id(threads(), 654321).unwrap().as_deref(),
            Some("RT_2")
        );
        assert_eq!(find_thread_id(threads(), 1).unwrap(), None);
    }

    #[test]
    fn test_find_thread_id_rejects_malformed_data() {
        assert!(find_thread_id(json!({"repository": null}), 1).is_err());
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            review_threads_variables("o", "r", 7),
            json!({"owner": "o", "name": "r", "number": 7})
        );
        assert_eq!(resolve_thread_variables("RT_1"), json!({"threadId": "RT_1"}));
    }
}
