//! CLI commands for cityslug: slug, resolve, roads, list.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics;
use crate::entity::Entity;
use crate::error::Error;
use crate::freshness::Freshness;
use crate::listing::{self, ListingItem};
use crate::resolver;
use crate::roads;
use crate::slug;
use crate::types::{Category, Origin};

/// One category in the output of `list --json`.
#[derive(Serialize)]
struct ListReport {
    /// Listed category.
    category: Category,
    /// Items in feed order.
    items: Vec<ListingItem>,
}

/// JSON shape printed by `resolve --json`.
#[derive(Serialize)]
struct ResolveReport<'a> {
    /// The hydrated entity, tagged by category.
    entity: &'a Entity,
    /// Live badge and age label.
    freshness: Freshness,
    /// Detail-page path.
    path: String,
    /// Canonical slug regenerated from the entity.
    slug: String,
}

/// Category-specific summary lines for the human-readable `resolve` output.
fn details(entity: &Entity) -> Vec<(&'static str, String)> {
    return match entity {
        Entity::Event(e) => vec![
            ("venue", e.venue_name.clone().unwrap_or_default()),
            ("starts", e.start.clone().unwrap_or_default()),
            ("about", e.description.clone()),
        ],
        Entity::Inspector(i) => vec![
            ("type", i.check_type.clone().unwrap_or_default()),
            ("address", i.formatted_address.clone().unwrap_or_default()),
            ("report", i.original_message.clone().unwrap_or_default()),
        ],
        Entity::RoadDisruption(r) => {
            let affected: Vec<String> = r.affected_roads.iter().map(ToString::to_string).collect();
            vec![
                ("severity", r.severity.clone()),
                ("roads", affected.join(", ")),
                ("update", r.current_update.clone()),
            ]
        },
        Entity::TransportDisruption(t) => vec![
            ("service", t.service.clone()),
            ("status", t.status.clone()),
            ("lines", t.affected_lines.join(", ")),
            ("about", t.description.clone()),
        ],
    };
}

/// List linkable items for one category, or all four when none is given.
/// Returns exit code 2 if any category's feed failed; the other categories
/// are still printed.
///
/// # Errors
///
/// Returns errors from config loading, the feed failure for a single
/// category, or JSON encoding errors.
pub async fn list(
    category: Option<Category>,
    limit: usize,
    origin: Option<Origin>,
    json: bool,
) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let feed = config.feed(&root)?;
    let origin = Some(origin.unwrap_or(config.origin));

    let sections = match category {
        None => listing::list_all(feed.as_ref(), origin, limit).await,
        Some(category) => vec![listing::Section {
            category,
            items: Ok(listing::list(feed.as_ref(), category, origin, limit).await?),
        }],
    };

    let mut failed = false;
    let mut reports = Vec::new();
    for section in sections {
        match section.items {
            Err(e) => {
                failed = true;
                diagnostics::print_error(&e);
            },
            Ok(items) => reports.push(ListReport {
                category: section.category,
                items,
            }),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if let [single] = reports.as_slice()
        && category.is_some()
    {
        print_items(&single.items);
    } else {
        for report in &reports {
            println!("# {}", report.category);
            print_items(&report.items);
            println!();
        }
    }

    if failed {
        return Ok(ExitCode::from(2));
    }
    return Ok(ExitCode::SUCCESS);
}

/// One line per item: path, then title and description.
fn print_items(items: &[ListingItem]) {
    for item in items {
        println!("{}\t{}\t{}", item.path, item.title, item.description);
    }
}

/// Resolve a slug and print the entity.
///
/// # Errors
///
/// Returns `Error::NotFound` if nothing matched, `Error::Network` if the feed
/// failed, and config or JSON errors.
pub async fn resolve(category: Category, slug: &str, origin: Option<Origin>, json: bool) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let feed = config.feed(&root)?;
    let origin = Some(origin.unwrap_or(config.origin));

    let entity = resolver::resolve_entity(feed.as_ref(), category, slug, origin).await?;
    let canonical = entity.slug();
    let path = category.route_path(&canonical);
    let freshness = Freshness::assess(entity.last_updated(), chrono::Utc::now());

    if json {
        let report = ResolveReport {
            entity: &entity,
            freshness,
            path,
            slug: canonical,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", entity.display_name());
    println!("  id: {}", entity.id());
    println!("  path: {path}");
    let position = entity.coordinates();
    println!("  position: {}, {}", position.lat, position.lon);
    if let Some(age) = &freshness.age {
        let badge = if freshness.live { " (live)" } else { "" };
        println!("  updated: {age}{badge}");
    }
    for (label, value) in details(&entity) {
        if !value.is_empty() {
            println!("  {label}: {value}");
        }
    }
    return Ok(());
}

/// Parse a road description and print each distinct reference in display order.
pub fn roads(description: &str) {
    let mut parsed = roads::parse_road_description(description);
    roads::sort_roads(&mut parsed);
    roads::dedup_roads(&mut parsed);
    for road in &parsed {
        println!("{road}");
    }
}

/// Print the detail-page slug for a name and feed id.
pub fn slug(category: Category, name: &str, id: &str) {
    let slug = match category {
        Category::Event => slug::event_slug(name, id),
        Category::Inspector => slug::inspector_slug(name, id),
        Category::RoadDisruption => slug::road_disruption_slug(name, id),
        Category::TransportDisruption => slug::transport_disruption_slug(name, id),
    };
    println!("{slug}");
}
