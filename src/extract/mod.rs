//! Recovery of structured calls from free-text model output.
//!
//! The matched container is parsed strictly first. When its markup is
//! malformed (typically an unescaped `&` or `<` inside a JSON payload) the
//! whole response is scanned for `<functioncall>` tags instead.

mod markup;

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::types::ExtractedCall;

pub const SINGLE_CONTAINER: &str = "singlefunction";
pub const MULTIPLE_CONTAINER: &str = "multiplefunctions";
pub const CALL_TAG: &str = "functioncall";

static SINGLE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static MULTIPLE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static CALL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn single_pattern() -> Option<&'static Regex> {
    SINGLE_PATTERN
        .get_or_init(|| Regex::new(r"(?s)<singlefunction>.*?</singlefunction>").ok())
        .as_ref()
}

fn multiple_pattern() -> Option<&'static Regex> {
    MULTIPLE_PATTERN
        .get_or_init(|| Regex::new(r"(?s)<multiplefunctions>.*?</multiplefunctions>").ok())
        .as_ref()
}

fn call_pattern() -> Option<&'static Regex> {
    CALL_PATTERN
        .get_or_init(|| Regex::new(r"(?s)<functioncall>\s*(.*?)\s*</functioncall>").ok())
        .as_ref()
}

/// Calls inside the first `<singlefunction>` container.
///
/// `None` means the response holds no container at all.
pub fn extract_single(text: &str) -> Option<Vec<ExtractedCall>> {
    extract_container(text, SINGLE_CONTAINER, single_pattern())
}

/// Calls inside the first `<multiplefunctions>` container.
///
/// `None` means the response holds no container at all.
pub fn extract_multiple(text: &str) -> Option<Vec<ExtractedCall>> {
    extract_container(text, MULTIPLE_CONTAINER, multiple_pattern())
}

/// Every decodable `<functioncall>{json}</functioncall>` in `text`,
/// regardless of any enclosing container. Never fails.
pub fn extract_with_regex(text: &str) -> Vec<ExtractedCall> {
    let Some(pattern) = call_pattern() else {
        return Vec::new();
    };

    decode_payloads(
        pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|payload| payload.as_str()),
    )
}

fn extract_container(
    text: &str,
    container: &str,
    pattern: Option<&Regex>,
) -> Option<Vec<ExtractedCall>> {
    let fragment = pattern?.find(text)?.as_str();
    debug!(target: "claude_tools::extract", container, fragment, "container matched");

    match markup::call_payloads(fragment, container) {
        Ok(payloads) => Some(decode_payloads(payloads.iter().map(String::as_str))),
        Err(err) => {
            debug!(
                target: "claude_tools::extract",
                container,
                error = %err,
                "falling back to call tag scan"
            );
            Some(extract_with_regex(text))
        }
    }
}

fn decode_payloads<'a>(payloads: impl Iterator<Item = &'a str>) -> Vec<ExtractedCall> {
    payloads
        .filter_map(|payload| match ExtractedCall::from_payload(payload) {
            Ok(call) => Some(call),
            Err(err) => {
                warn!(
                    target: "claude_tools::extract",
                    error = %err,
                    payload,
                    "skipping undecodable function call payload"
                );
                None
            }
        })
        .collect()
}
