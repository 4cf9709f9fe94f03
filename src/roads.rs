//! Road-code parsing: bracketed `[A302]`/`[M25]` codes and plain street names
//! pulled out of free-text road descriptions, plus their display ordering.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{RoadKind, RoadReference};

/// A bare `A302`-style token with no brackets, which is not a street name.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static BARE_CODE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^[AM]\d+[A-Z]*$").expect("valid regex"));

/// A bracketed road code; group 1 is the class letter, group 2 the number.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static BRACKETED_CODE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\[([AM])(\d+[A-Z]*)\]").expect("valid regex"));

/// A parenthesized aside such as a postcode district, `(SE11)`.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\([^)]*\)").expect("valid regex"));

/// Compare two road codes with digit runs taken by value, so `9` < `10`.
/// Codes equal under that rule (`09` vs `9`) fall back to plain lexical order.
fn compare_codes(left: &str, right: &str) -> Ordering {
    let mut lhs = left.chars().peekable();
    let mut rhs = right.chars().peekable();

    loop {
        let next_left = lhs.peek().copied();
        let next_right = rhs.peek().copied();
        let (Some(l), Some(r)) = (next_left, next_right) else {
            return next_left
                .is_some()
                .cmp(&next_right.is_some())
                .then_with(|| return left.cmp(right));
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let ordering = compare_digit_runs(&take_digit_run(&mut lhs), &take_digit_run(&mut rhs));
            if ordering != Ordering::Equal {
                return ordering;
            }
            continue;
        }

        if l != r {
            return l.cmp(&r);
        }
        lhs.next();
        rhs.next();
    }
}

/// Compare two runs of ASCII digits by numeric value without parsing,
/// so arbitrarily long runs cannot overflow.
fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    return left.len().cmp(&right.len()).then_with(|| return left.cmp(right));
}

/// Drop adjacent duplicates. Run after `sort_roads` so repeated mentions collapse.
pub fn dedup_roads(roads: &mut Vec<RoadReference>) {
    roads.dedup();
}

/// Every road reference in a description: bracketed codes first, then street names.
/// Extraction order carries no meaning; sort before display.
pub fn parse_road_description(text: &str) -> Vec<RoadReference> {
    let mut roads = road_codes(text);
    roads.extend(street_names(text));
    return roads;
}

/// The road a disruption is filed under: the first bracketed code in the
/// description, else the first in the comments.
pub fn primary_road(description: &str, comments: &str) -> Option<RoadReference> {
    return road_codes(description)
        .into_iter()
        .next()
        .or_else(|| return road_codes(comments).into_iter().next());
}

/// All bracketed `[A…]`/`[M…]` codes, in order of appearance.
pub fn road_codes(text: &str) -> Vec<RoadReference> {
    return BRACKETED_CODE
        .captures_iter(text)
        .filter_map(|cap| {
            let kind = RoadKind::from_letter(cap.get(1)?.as_str())?;
            let code = cap.get(2)?.as_str().to_string();
            return Some(RoadReference { code, kind });
        })
        .collect();
}

/// The road name written after `road`'s bracketed code in free-text comments,
/// up to the first parenthesis. `None` if the code is absent or nothing follows it.
pub fn road_name_from_comments(comments: &str, road: &RoadReference) -> Option<String> {
    let marker = format!("[{road}]");
    let (_, after) = comments.split_once(&marker)?;
    let name = after.split('(').next().unwrap_or("").trim();
    if name.is_empty() {
        return None;
    }
    return Some(name.to_string());
}

/// Order roads for display: motorways, A-roads, then streets; numeric-aware
/// within a kind. Stable, so repeated mentions keep their relative order.
pub fn sort_roads(roads: &mut [RoadReference]) {
    roads.sort_by(|a, b| {
        return a
            .kind
            .rank()
            .cmp(&b.kind.rank())
            .then_with(|| return compare_codes(&a.code, &b.code));
    });
}

/// Plain street names: strip bracketed codes and parenthesized asides, then
/// split on commas and semicolons. Bare code tokens like `A40` are dropped.
pub fn street_names(text: &str) -> Vec<RoadReference> {
    let without_codes = BRACKETED_CODE.replace_all(text, "");
    let cleaned = PARENTHESIZED.replace_all(&without_codes, "");

    return cleaned
        .trim()
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| return !part.is_empty() && !BARE_CODE.is_match(part))
        .map(RoadReference::street)
        .collect();
}

/// Consume a run of ASCII digits from the front of `chars`.
fn take_digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    return run;
}
