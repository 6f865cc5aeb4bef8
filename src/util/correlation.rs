use std::sync::OnceLock;

use regex::Regex;

fn marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\[src#([0-9]+)\]").unwrap())
}

/// Appends the `[src#<id>]` marker that links a destination comment to its source entry.
pub fn embed(text: &str, source_id: u64) -> String {
    format!("{text} [src#{source_id}]")
}

/// Finds the source id embedded in a destination comment.
pub fn extract(text: Option<&str>) -> Option<u64> {
    let caps = marker().captures(text?)?;
    caps.get(1)?.as_str().parse().ok()
}
