//! In-process stand-in for the HTTP API.
//!
//! Each test builds its own [`ScriptedTransport`] with the responses it
//! needs and inspects the recorded calls afterwards; nothing is shared
//! between tests.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::client::{HttpError, Method, Transport};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
    status: u16,
    body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    /// Endpoint with any query string removed.
    pub path: String,
    pub body: Option<Value>,
}

impl fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    graphql: Mutex<VecDeque<std::result::Result<Value, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn strip_query(endpoint: &str) -> &str {
    endpoint.split('?').next().unwrap_or(endpoint)
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `status` and `body`. Earlier routes win.
    pub fn respond(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        lock(&self.routes).push(Route {
            method,
            path: path.to_string(),
            status,
            body,
        });
        self
    }

    /// Queue the `data` object for the next GraphQL request.
    pub fn graphql_data(self, data: Value) -> Self {
        lock(&self.graphql).push_back(Ok(data));
        self
    }

    /// Queue a failure for the next GraphQL request.
    pub fn graphql_error(self, message: &str) -> Self {
        lock(&self.graphql).push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Calls as `"METHOD path"` lines.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    fn record(&self, method: Method, path: &str, body: Option<&Value>) {
        lock(&self.calls).push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn rest(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        let path = strip_query(endpoint);
        self.record(method, path, body);

        let route = lock(&self.routes)
            .iter()
            .find(|r| r.method == method && r.path == path)
            .cloned();

        match route {
            Some(route) if (200..300).contains(&route.status) => Ok(route.body),
            Some(route) => Err(HttpError {
                status: route.status,
                method,
                endpoint: path.to_string(),
                message: route
                    .body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("HTTP error")
                    .to_string(),
            }
            .into()),
            None => Err(HttpError {
                status: 404,
                method,
                endpoint: path.to_string(),
                message: "Not Found".to_string(),
            }
            .into()),
        }
    }

    async fn graphql(&self, _query: &str, variables: &Value) -> Result<Value> {
        self.record(Method::Post, "graphql", Some(variables));
        match lock(&self.graphql).pop_front() {
            Some(Ok(data)) => Ok(data),
            Some(Err(message)) => anyhow::bail!("gh command failed: {}", message),
            None => anyhow::bail!("no scripted GraphQL response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_and_records_calls() {
        let transport = ScriptedTransport::new().respond(
            Method::Get,
            "repos/o/r/issues/1/comments",
            200,
            json!([]),
        );

        let ok = transport
            .rest(Method::Get, "repos/o/r/issues/1/comments?per_page=100", None)
            .await
            .unwrap();
        assert_eq!(ok, json!([]));

        let err = transport
            .rest(Method::Patch, "repos/o/r/issues/comments/5", Some(&json!({"body": "x"})))
            .await
            .unwrap_err();
        let http = err.downcast_ref::<HttpError>().unwrap();
        assert_eq!(http.status, 404);

        assert_eq!(
            transport.call_lines(),
            vec![
                "GET repos/o/r/issues/1/comments",
                "PATCH repos/o/r/issues/comments/5"
            ]
        );
        assert_eq!(transport.calls()[1].body, Some(json!({"body": "x"})));
    }

    #[tokio::test]
    async fn test_error_status_uses_message() {
        let transport = ScriptedTransport::new().respond(
            Method::Post,
            "repos/o/r/pulls/1/reviews",
            422,
            json!({"message": "Validation Failed"}),
        );
        let err = transport
            .rest(Method::Post, "repos/o/r/pulls/1/reviews", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP 422: Validation Failed (repos/o/r/pulls/1/reviews)"
        );
    }

    #[tokio::test]
    async fn test_graphql_queue() {
        let transport = ScriptedTransport::new()
            .graphql_data(json!({"a": 1}))
            .graphql_error("HTTP 401");
        assert_eq!(
            transport.graphql("q", &json!({})).await.unwrap(),
            json!({"a": 1})
        );
        assert!(transport.graphql("q", &json!({})).await.is_err());
        assert!(transport.graphql("q", &json!({})).await.is_err());
    }
}
