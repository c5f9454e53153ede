use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::catalog::{Card, CardSet, SERIES};

/// Write one set's ordered card list to `<cards_dir>/<set-id>.json`.
pub fn write_set_cards(cards_dir: &Path, set_id: &str, cards: &[Card]) -> Result<PathBuf> {
    fs::create_dir_all(cards_dir)
        .with_context(|| format!("failed to create {}", cards_dir.display()))?;
    let path = cards_dir.join(format!("{set_id}.json"));
    let rendered = serde_json::to_string_pretty(cards).context("failed to serialize card list")?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Merge freshly generated sets over a base catalog.
///
/// Any base entry from this tool's own series is replaced by the new data;
/// everything else is kept untouched. The result is sorted by release date,
/// with the set id as tiebreaker.
pub fn merge_base_sets(mut base: Vec<Value>, sets: &[CardSet]) -> Result<Vec<Value>> {
    base.retain(|entry| entry.get("series").and_then(Value::as_str) != Some(SERIES));
    for set in sets {
        base.push(serde_json::to_value(set).context("failed to serialize set")?);
    }
    base.sort_by_key(sort_key);
    Ok(base)
}

fn sort_key(entry: &Value) -> (String, String) {
    let release_date = entry
        .get("releaseDate")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    (release_date, id)
}

/// Write the aggregate sets index to `<sets_dir>/en.json`.
pub fn write_sets_index(sets_dir: &Path, entries: &[Value]) -> Result<PathBuf> {
    fs::create_dir_all(sets_dir)
        .with_context(|| format!("failed to create {}", sets_dir.display()))?;
    let path = sets_dir.join("en.json");
    let rendered =
        serde_json::to_string_pretty(entries).context("failed to serialize sets index")?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
