//! Small free-standing helpers shared across stages.
//!
//! `slugify` uses precompiled `Lazy<Regex>` statics doing
//! camelCase-splitting and character-class replacement rather than a
//! hand-rolled character loop.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static DUPLICATE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Turn a free-form name into a directory-safe slug, e.g. `"Northbound &
/// Co."` -> `"northbound-co"`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = DISALLOWED_CHARS.replace_all(&lowered, "-");
    let collapsed = DUPLICATE_DASH.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}
