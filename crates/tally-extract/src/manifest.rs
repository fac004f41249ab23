//! Embedded transfer manifests.
//!
//! Container transfers append a JSON array of `{label, count}` objects to
//! the log text. The array is located with a generic "array of objects"
//! bracket scan; a payload that fails to parse as JSON contributes nothing.

use regex::Regex;
use serde_json::Value;

/// Locate and parse the first embedded object array in `text`.
///
/// Returns `(label, count)` pairs for every element with a non-empty label
/// (`label` or `name`, lower-cased) and a strictly positive count; anything
/// else in the array is skipped silently.
pub fn scan(text: &str) -> Vec<(String, u32)> {
  // (?s) lets the scan cross line boundaries inside the array.
  static PATTERN: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").unwrap()
  });

  let Some(found) = PATTERN.find(text) else {
    return Vec::new();
  };
  let Ok(Value::Array(elements)) = serde_json::from_str(found.as_str()) else {
    return Vec::new();
  };

  elements
    .iter()
    .filter_map(|element| {
      let label = element
        .get("label")
        .or_else(|| element.get("name"))?
        .as_str()?
        .trim()
        .to_lowercase();
      let count = count_of(element.get("count")?)?;
      (!label.is_empty() && count > 0).then_some((label, count))
    })
    .collect()
}

/// Counts arrive as JSON numbers or as numeric strings, depending on the
/// game build that produced the log.
fn count_of(value: &Value) -> Option<u32> {
  match value {
    Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::scan;

  #[test]
  fn parses_label_and_count() {
    let text = r#"moved stuff [{"label":"Iron Ore","count":3}] done"#;
    assert_eq!(scan(text), vec![("iron ore".to_string(), 3)]);
  }

  #[test]
  fn name_is_an_alias_for_label() {
    let text = r#"[{"name":"Copper Wire","count":"12"}]"#;
    assert_eq!(scan(text), vec![("copper wire".to_string(), 12)]);
  }

  #[test]
  fn zero_count_and_empty_label_are_skipped() {
    let text = r#"[{"label":"Scrap","count":0},{"label":"  ","count":4},{"label":"Nails","count":2}]"#;
    assert_eq!(scan(text), vec![("nails".to_string(), 2)]);
  }

  #[test]
  fn malformed_json_yields_nothing() {
    assert!(scan(r#"[{"label": broken]"#).is_empty());
  }

  #[test]
  fn no_array_yields_nothing() {
    assert!(scan("just words").is_empty());
  }

  #[test]
  fn array_spanning_lines() {
    let text = "[\n  {\"label\": \"Plank\", \"count\": 8}\n]";
    assert_eq!(scan(text), vec![("plank".to_string(), 8)]);
  }
}
