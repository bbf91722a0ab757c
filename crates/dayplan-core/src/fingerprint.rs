//! Deterministic request fingerprints and time normalization.
//!
//! A fingerprint is `hex(sha256("{scope}::{kind}::{content}"))` with scope
//! `global` when absent. When a request ignores time, clock-dependent
//! fragments of the content's header block (everything before the first
//! blank line) are replaced with fixed placeholders first, so two prompts
//! that differ only in "now" share a fingerprint. Text after the header is
//! user-supplied and always hashed verbatim.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use dayplan_db::models::RequestKind;

const GLOBAL_SCOPE: &str = "global";

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?",
    )
    .expect("ISO date pattern is valid")
});

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\b\.?)?")
        .expect("clock time pattern is valid")
});

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("weekday pattern is valid")
});

static HOURS_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\b(?:remaining|available)\s+hours\b[^:\n]*:\s*~?)\d+(?:\.\d+)?")
        .expect("hours pattern is valid")
});

/// Replace dates, clock times, weekday names and remaining/available hour
/// counts with placeholders.
pub fn normalize_time(content: &str) -> String {
    let out = ISO_DATE.replace_all(content, "<DATE>");
    let out = CLOCK_TIME.replace_all(&out, "<TIME>");
    let out = WEEKDAY.replace_all(&out, "<WEEKDAY>");
    let out = HOURS_VALUE.replace_all(&out, "${1}<HOURS>");
    out.into_owned()
}

/// Normalize the header block of `content` and keep the rest verbatim.
///
/// The header ends at the first blank line. Content without one is all
/// header.
pub fn normalize_header(content: &str) -> String {
    match content.find("\n\n") {
        Some(end) => {
            let (header, body) = content.split_at(end);
            format!("{}{body}", normalize_time(header))
        }
        None => normalize_time(content),
    }
}

/// Fingerprint `content` as-is.
pub fn fingerprint(scope: Option<&str>, kind: RequestKind, content: &str) -> String {
    let scope = scope.unwrap_or(GLOBAL_SCOPE);
    let digest = Sha256::digest(format!("{scope}::{kind}::{content}").as_bytes());
    hex::encode(digest)
}

/// Fingerprint `content`, normalizing its header first when `ignore_time`
/// is set.
pub fn fingerprint_content(
    scope: Option<&str>,
    kind: RequestKind,
    content: &str,
    ignore_time: bool,
) -> String {
    if ignore_time {
        fingerprint(scope, kind, &normalize_header(content))
    } else {
        fingerprint(scope, kind, content)
    }
}
