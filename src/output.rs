//! CLI output formatting.
//!
//! Each result has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Dry run
//!
//! ```text
//! cube → http://fotocrib.com/fototools.php?s=http%3A%2F%2Fx%2Flion.jpg&q=cube&r=255&g=255&b=255
//!     s: http://x/lion.jpg
//!     q: cube
//!     r: 255
//!     g: 255
//!     b: 255
//! ```
//!
//! ## Saved
//!
//! ```text
//! cube → ./lion.png
//!     Size: 48213 bytes
//!     Format: jpg → png (re-encoded)
//! ```
//!
//! `--json` swaps both for a single JSON object.

use crate::codec::SaveOutcome;
use crate::operation::Operation;
use reqwest::Url;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line shared by every result: operation name and target.
fn header(operation: &Operation, target: &str) -> String {
    format!("{} → {}", operation.name(), target)
}

/// Format a dry run: the full URL, then each decoded query parameter.
pub fn format_plan(operation: &Operation, url: &Url) -> Vec<String> {
    let mut lines = vec![header(operation, url.as_str())];
    for (key, value) in url.query_pairs() {
        lines.push(format!("{}{}: {}", indent(1), key, value));
    }
    lines
}

/// Dry run as a JSON object of query parameters, in request order.
pub fn format_plan_json(url: &Url) -> String {
    let map: serde_json::Map<String, serde_json::Value> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
        .collect();
    serde_json::Value::Object(map).to_string()
}

pub fn format_saved(operation: &Operation, outcome: &SaveOutcome) -> Vec<String> {
    let conversion = if outcome.reencoded {
        format!(
            "{} → {} (re-encoded)",
            outcome.source_format, outcome.output_format
        )
    } else {
        format!("{} (as returned)", outcome.output_format)
    };
    vec![
        header(operation, &outcome.path.display().to_string()),
        format!("{}Size: {} bytes", indent(1), outcome.bytes_written),
        format!("{}Format: {}", indent(1), conversion),
    ]
}

pub fn format_saved_json(outcome: &SaveOutcome) -> String {
    serde_json::to_string(outcome).unwrap_or_default()
}

pub fn print_plan(operation: &Operation, url: &Url, json: bool) {
    if json {
        println!("{}", format_plan_json(url));
    } else {
        for line in format_plan(operation, url) {
            println!("{}", line);
        }
    }
}

pub fn print_saved(operation: &Operation, outcome: &SaveOutcome, json: bool) {
    if json {
        println!("{}", format_saved_json(outcome));
    } else {
        for line in format_saved(operation, outcome) {
            println!("{}", line);
        }
    }
}
