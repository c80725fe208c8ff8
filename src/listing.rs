//! Scraping of the releases site's generated directory indexes.
//!
//! The index pages are plain `<ul>` lists of anchors, one per release,
//! sorted newest first, with a `../` parent entry on top. Nothing here does
//! any ordering of its own; it trusts the upstream sort.

use std::sync::LazyLock;
use regex::Regex;
use crate::tool::Tool;
use crate::version::is_safe_version;

/// Oldest release of every tool; walking a listing stops once it is seen.
pub const FLOOR_VERSION: &str = "0.1.0";

const PARENT_ENTRY: &str = "../";

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a\s*>").expect("anchor pattern is valid"));
static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

/// Visible text of every anchor in document order, inner markup removed.
pub fn anchor_texts(html: &str) -> Vec<String> {
    ANCHOR
        .captures_iter(html)
        .map(|cap| INNER_TAG.replace_all(&cap[1], "").trim().to_string())
        .collect()
}

fn strip_tool_prefix(text: &str, tool: Tool) -> String {
    let prefix = format!("{}_", tool.name());
    text.strip_prefix(&prefix).unwrap_or(text).to_string()
}

/// The first non-parent anchor, with the `<tool>_` prefix removed.
pub fn latest_from_listing(html: &str, tool: Tool) -> Option<String> {
    anchor_texts(html)
        .into_iter()
        .find(|text| text != PARENT_ENTRY && !text.is_empty())
        .map(|text| strip_tool_prefix(&text, tool))
}

/// Every version listed before (and including) `floor`.
///
/// Hitting the end of the document without seeing `floor` is not an error;
/// whatever was collected so far is returned. Entries that cannot name a
/// version directory (`..`, anything with a path separator) are skipped.
pub fn versions_from_listing(html: &str, tool: Tool, floor: &str) -> Vec<String> {
    let mut versions = Vec::new();
    for text in anchor_texts(html) {
        if text == PARENT_ENTRY || text.is_empty() {
            continue;
        }
        let version = strip_tool_prefix(&text, tool);
        if !is_safe_version(&version) {
            continue;
        }
        let reached_floor = version == floor;
        versions.push(version);
        if reached_floor {
            break;
        }
    }
    versions
}
