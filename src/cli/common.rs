//! Common utilities shared across CLI commands.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Parse `--locals` JSON. Must be an object.
pub fn parse_locals(json: Option<&str>) -> Result<Map<String, Value>> {
    let Some(json) = json else {
        return Ok(Map::new());
    };
    match serde_json::from_str(json).context("`--locals` is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("`--locals` must be a JSON object, got `{other}`"),
    }
}

/// Query string pairs as string locals. Later duplicates win.
pub fn query_locals(url: &str) -> Map<String, Value> {
    let Some((_, query)) = url.split_once('?') else {
        return Map::new();
    };
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// `1 page`, `3 pages`
pub fn plural_count(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}
