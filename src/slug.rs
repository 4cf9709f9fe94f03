//! Deep-link slugs: `<normalized-name>-<feed-id>`.
//!
//! Slugs are not injective and the trailing id cannot be split back out
//! reliably (names and ids both contain hyphens), so resolution always
//! regenerates a candidate's slug and compares whole normalized strings.

/// Lowercase ASCII, collapse every run of characters outside `[a-z0-9]` into
/// one hyphen, trim hyphens from both ends. Idempotent.
pub fn normalize(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_hyphen = true; // Start true to trim leading hyphens.

    for c in name.chars().map(|c| return c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            result.push(c);
            prev_hyphen = false;
            continue;
        }
        if prev_hyphen {
            continue;
        }
        result.push('-');
        prev_hyphen = true;
    }

    if result.ends_with('-') {
        result.pop();
    }
    return result;
}

/// Build a slug from a display name and the feed's opaque id.
/// Falls back to the lowercased id alone when the name normalizes to nothing.
pub fn make_slug(name: &str, id: &str) -> String {
    let base = normalize(name);
    if base.is_empty() {
        return id.to_lowercase();
    }
    return format!("{base}-{id}");
}

/// Slug for an event detail page, from its title (or venue) and id.
pub fn event_slug(title: &str, event_id: &str) -> String {
    return make_slug(title, event_id);
}

/// Slug for an inspector detail page, from its location name and id.
pub fn inspector_slug(location_name: &str, inspector_id: &str) -> String {
    return make_slug(location_name, inspector_id);
}

/// Slug for a road disruption detail page, from its road name and disruption id.
pub fn road_disruption_slug(road_name: &str, disruption_id: &str) -> String {
    return make_slug(road_name, disruption_id);
}

/// Last hyphen-delimited token of a slug.
///
/// Lossy: for `lambeth-bridge-TIMS-204461` this is `204461`, not the feed id.
/// Only diagnostics use it, to suggest near-miss candidates.
pub fn trailing_id(slug: &str) -> &str {
    return slug.rsplit_once('-').map_or(slug, |(_, tail)| return tail);
}

/// Slug for a transport disruption detail page, from its station name and id.
pub fn transport_disruption_slug(common_name: &str, disruption_id: &str) -> String {
    return make_slug(common_name, disruption_id);
}
