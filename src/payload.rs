//! Tolerant parsing of mission definition documents.
//!
//! Mission JSON files are authored by hand and every field is optional, so
//! this module turns an opaque document into an explicit resolved shape
//! ([`MissionPayload`]) with documented fallbacks, instead of scattering
//! null-coalescing over the reconciler.
//!
//! Field precedence is a fixed convention carried over from the existing
//! catalogs; changing it would silently re-rank missions:
//! - order: `order` > `order_no` > `orderNo` > `index` > numeric filename stem
//! - identity: `mission_uid` > `missionUid` > `uid` > computed title

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

const ORDER_FIELDS: [&str; 4] = ["order", "order_no", "orderNo", "index"];
const UID_FIELDS: [&str; 3] = ["mission_uid", "missionUid", "uid"];

/// The resolved view of one mission definition file.
#[derive(Debug, Clone)]
pub struct MissionPayload {
    /// Primary order candidate: first finite number found in precedence
    /// order, the numeric filename stem included.
    pub order_hint: Option<f64>,
    /// Declared title, or the filename stem when absent or empty.
    pub title: String,
    /// Slugified identity. Never empty: an empty slug is replaced with a
    /// unique `mission-<uuid>` fallback.
    pub slug: String,
    /// The full parsed document, embedded into inserted records.
    pub raw: Value,
}

impl MissionPayload {
    /// Parses `bytes` as JSON and resolves order, title and identity for the
    /// object at `path`. Parse failures are returned to the caller; all
    /// missing fields fall back as documented above.
    pub fn resolve(path: &str, bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_slice(bytes)?;
        let stem = file_stem(path);

        let order_hint = primary_order(&raw, stem);

        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| stem.to_string());

        let identity = UID_FIELDS
            .iter()
            .find_map(|field| raw.get(*field).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .unwrap_or(title.as_str());

        let mut slug = slugify(identity);
        if slug.is_empty() {
            slug = format!("mission-{}", uuid::Uuid::new_v4());
        }

        Ok(Self {
            order_hint,
            title,
            slug,
            raw,
        })
    }
}

/// First finite number among the order-like fields, scanning in precedence
/// order and ending with the numeric value of the filename stem.
fn primary_order(raw: &Value, stem: &str) -> Option<f64> {
    ORDER_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field).and_then(Value::as_f64))
        .chain(stem.parse::<f64>().ok())
        .find(|n| n.is_finite())
}

/// Filename of `path` without its extension: `"a/b/7.json"` -> `"7"`.
fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-z0-9]+").expect("static pattern"))
}

/// Lowercases `input`, collapses runs of non-alphanumeric characters to a
/// single hyphen and trims leading/trailing hyphens.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    non_alphanumeric()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Asset folder prefix for a mission uid: uppercase the slug, prepend `M`
/// unless it already starts with one, append `/`.
pub fn assets_prefix(mission_uid: &str) -> String {
    let upper = mission_uid.to_uppercase();
    if upper.starts_with('M') {
        format!("{upper}/")
    } else {
        format!("M{upper}/")
    }
}
