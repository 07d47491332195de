//! Narrowing a PR's comment list by type, author and creation time.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::github::{Comment, CommentType};
use crate::validate::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub kind: Option<CommentType>,
    /// Exact login, `*` wildcard pattern, or case-insensitive substring
    pub author: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// An inverted time window can never match anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.since, self.until) {
            (Some(since), Some(until)) if since > until => Err(ValidationError::InvalidArgument(
                format!(
                    "since date ({}) cannot be after until date ({})",
                    since.to_rfc3339(),
                    until.to_rfc3339()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Both time bounds are inclusive.
    pub fn matches(&self, comment: &Comment) -> bool {
        if self.kind.is_some_and(|kind| kind != comment.kind) {
            return false;
        }
        if let Some(pattern) = &self.author {
            if !author_matches(&comment.user.login, pattern) {
                return false;
            }
        }
        if self.since.is_some_and(|since| comment.created_at < since) {
            return false;
        }
        !self.until.is_some_and(|until| comment.created_at > until)
    }
}

pub fn author_matches(login: &str, pattern: &str) -> bool {
    if login == pattern {
        return true;
    }
    if pattern.contains('*') && wildcard_matches(login, pattern) {
        return true;
    }
    login.to_lowercase().contains(&pattern.to_lowercase())
}

/// `*` matches any run of characters; everything else is literal.
fn wildcard_matches(text: &str, pattern: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    let mut parts: Vec<&str> = parts.collect();
    let last = parts.pop().unwrap_or_default();
    for part in parts {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// Accepts RFC 3339, `YYYY-MM-DD` (midnight UTC), `today`, `yesterday`
/// and `N <unit>s ago` for minutes, hours, days and weeks.
pub fn parse_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
    let input = input.trim();
    let invalid = || {
        ValidationError::InvalidArgument(format!(
            "invalid date '{}': expected RFC 3339, YYYY-MM-DD or 'N days ago'",
            input
        ))
    };

    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc());
    }

    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(invalid)?
        .and_utc();
    let lower = input.to_lowercase();
    match lower.as_str() {
        "today" => return Ok(midnight),
        "yesterday" => return Ok(midnight - Duration::days(1)),
        _ => {}
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    let [count, unit, "ago"] = words.as_slice() else {
        return Err(invalid());
    };
    let count: i64 = count.parse().map_err(|_| invalid())?;
    let span = match unit.trim_end_matches('s') {
        "minute" => Duration::try_minutes(count),
        "hour" => Duration::try_hours(count),
        "day" => Duration::try_days(count),
        "week" => Duration::try_weeks(count),
        _ => None,
    };
    span.and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(invalid)
}
