use std::fmt::Write as _;
use std::process::ExitCode;

use crate::error::Error;
use crate::types::Category;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Process exit code for an error: 1 when a slug matched nothing, 2 otherwise.
pub fn exit_code(e: &Error) -> ExitCode {
    return match e {
        Error::NotFound { .. } => ExitCode::from(1),
        _ => ExitCode::from(2),
    };
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { reason } => render_config_invalid(reason),
        Error::FixtureNotFound { path } => render_fixture_not_found(&path.display().to_string()),
        Error::InvalidOrigin { lat, lon } => render_invalid_origin(*lat, *lon),
        Error::Network { category, reason } => render_network(*category, reason),
        Error::NotFound {
            category,
            considered,
            feed_malformed,
            slug,
            suggestions,
        } => render_not_found(*category, slug, considered, *feed_malformed, suggestions),
        Error::Io(_) | Error::Json(_) | Error::TomlDe(_) => render_generic(e),
    };
}

fn render_config_invalid(reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Config

{reason}

## Fix

Correct the value in `.cityslug.toml`, or delete the key to use its default.
"
    );
}

fn render_fixture_not_found(path: &str) -> String {
    return format!(
        "\
# Error: Fixture Not Found

`{path}` does not exist.

## Fix

Add the file, or remove `fixtures` from `.cityslug.toml` to query the live feed.
"
    );
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: Invalid JSON

{e}
"
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Check `.cityslug.toml` for typos and unknown keys.
"
        ),
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

fn render_invalid_origin(lat: f64, lon: f64) -> String {
    return format!(
        "\
# Error: Invalid Origin

Latitude {lat} / longitude {lon} is not a position on the globe.

## Fix

Latitude must be within -90..90 and longitude within -180..180.
"
    );
}

fn render_network(category: Category, reason: &str) -> String {
    return format!(
        "\
# Error: Feed Unavailable

The {category} feed could not be read: {reason}

## Fix

Check connectivity and `base_url` in `.cityslug.toml`, then retry.
"
    );
}

fn render_not_found(
    category: Category,
    slug: &str,
    considered: &[String],
    feed_malformed: bool,
    suggestions: &[String],
) -> String {
    let mut out = format!(
        "\
# Error: Not Found

No {category} near the search origin has the slug `{slug}`.
"
    );

    if feed_malformed {
        out.push_str("\nThe feed response had no `features` array, so there was nothing to compare.\n");
    } else if considered.is_empty() {
        out.push_str("\nThe feed returned no usable features.\n");
    } else {
        out.push_str("\n## Compared against\n\n");
        for candidate in considered {
            let _ = writeln!(out, "- `{candidate}`");
        }
    }

    if let Some(suggestion) = suggestions.first() {
        let _ = write!(out, "\n## Did you mean `{suggestion}`?\n\n");
        let _ = writeln!(out, "    cityslug resolve {category} {suggestion}");
    } else {
        out.push_str(
            "\
\n## Fix

The item may have cleared. List what the feed has now:

",
        );
        let _ = writeln!(out, "    cityslug list {category}");
    }

    return out;
}
