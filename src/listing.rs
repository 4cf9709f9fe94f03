//! List views: the linkable items of each category near an origin.
//!
//! Items are built from the same candidates the resolver scans, so every
//! listed slug resolves back to its entity.

use serde::Serialize;

use crate::entity::{Entity, Event, Inspector, Resolvable, RoadDisruption, TransportDisruption};
use crate::error::Error;
use crate::feed::{Feed, FeedQuery};
use crate::resolver;
use crate::types::{Category, Origin};

/// One category's list, or the reason it could not be fetched.
pub struct Section {
    /// Which category this section lists.
    pub category: Category,
    /// Items in feed order, or the fetch failure.
    pub items: Result<Vec<ListingItem>, Error>,
}

/// One row of a list view.
#[derive(Debug, Clone, Serialize)]
pub struct ListingItem {
    /// Category of the linked entity.
    pub category: Category,
    /// Secondary line.
    pub description: String,
    /// Timestamp shown as the item's age.
    pub last_updated: Option<String>,
    /// Detail-page path, `/routes/<prefix>/<slug>`.
    pub path: String,
    /// Detail-page slug.
    pub slug: String,
    /// Primary line.
    pub title: String,
}

impl ListingItem {
    /// Build the list row for a hydrated entity.
    pub fn from_entity(entity: &Entity) -> Self {
        let (title, description) = match entity {
            Entity::Event(e) => {
                let venue = e.venue_name.as_deref().unwrap_or("Unknown venue");
                (e.display_name.clone(), format!("{} at {venue}", e.category))
            },
            Entity::Inspector(i) => {
                let kind = i.check_type.as_deref().unwrap_or("Unknown");
                let place = i
                    .formatted_address
                    .as_deref()
                    .and_then(|a| return a.split(',').next())
                    .map(str::trim)
                    .filter(|p| return !p.is_empty())
                    .unwrap_or("Unknown location");
                (format!("{kind} check at {place}"), i.original_message.clone().unwrap_or_default())
            },
            Entity::RoadDisruption(r) => {
                (format!("{} on {}", r.severity, r.display_name), r.current_update.clone())
            },
            Entity::TransportDisruption(t) => (
                format!("{} on {}", t.status, t.service),
                format!("{} at {}", t.service, t.common_name),
            ),
        };
        let slug = entity.slug();
        return Self {
            category: entity.category(),
            description,
            last_updated: entity.last_updated().map(str::to_string),
            path: entity.category().route_path(&slug),
            slug,
            title,
        };
    }
}

/// Up to `limit` items of one category around `origin`, in feed order.
///
/// # Errors
///
/// Returns `Error::InvalidOrigin` for an off-globe origin and propagates feed failures.
pub async fn list(
    feed: &dyn Feed,
    category: Category,
    origin: Option<Origin>,
    limit: usize,
) -> Result<Vec<ListingItem>, Error> {
    return match category {
        Category::Event => list_as::<Event>(feed, origin, limit).await,
        Category::Inspector => list_as::<Inspector>(feed, origin, limit).await,
        Category::RoadDisruption => list_as::<RoadDisruption>(feed, origin, limit).await,
        Category::TransportDisruption => list_as::<TransportDisruption>(feed, origin, limit).await,
    };
}

/// Every category's list, fetched concurrently. One failing feed does not
/// hide the others.
pub async fn list_all(feed: &dyn Feed, origin: Option<Origin>, limit: usize) -> Vec<Section> {
    let (roads, inspectors, events, transport) = tokio::join!(
        list(feed, Category::RoadDisruption, origin, limit),
        list(feed, Category::Inspector, origin, limit),
        list(feed, Category::Event, origin, limit),
        list(feed, Category::TransportDisruption, origin, limit),
    );
    return Category::ALL
        .into_iter()
        .zip([roads, inspectors, events, transport])
        .map(|(category, items)| return Section { category, items })
        .collect();
}

/// Fetch once and hydrate the first `limit` readable candidates as `T`.
///
/// # Errors
///
/// Same as `list`.
async fn list_as<T>(feed: &dyn Feed, origin: Option<Origin>, limit: usize) -> Result<Vec<ListingItem>, Error>
where
    T: Resolvable + Into<Entity>,
{
    let origin = origin.unwrap_or_default().validate()?;
    let collection = feed.fetch(&FeedQuery { category: T::CATEGORY, origin }).await?;
    return Ok(resolver::candidates::<T>(collection)
        .into_iter()
        .take(limit)
        .map(|c| return ListingItem::from_entity(&T::hydrate(c.properties, c.coordinates).into()))
        .collect());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::feed::FeatureCollection;

    /// Answers each category from its own body; inspectors are unreachable.
    struct CityFeed;

    #[async_trait]
    impl Feed for CityFeed {
        async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error> {
            let body: Value = match query.category {
                Category::Event => json!({ "features": [{
                    "geometry": { "coordinates": [-0.0, 51.5] },
                    "properties": { "id": "e1", "title": "Summer Fair", "category": "festivals", "venue_name": "Hyde Park" }
                }] }),
                Category::Inspector => {
                    return Err(Error::Network { category: query.category, reason: "timed out".to_string() });
                },
                Category::RoadDisruption => json!({ "features": [
                    { "geometry": { "coordinates": [-0.1, 51.5] },
                      "properties": { "disruption_id": "TIMS-1", "road_name": "Strand", "severity": "Serious",
                                      "current_update": "Lane closed", "last_updated": "2025-06-10T11:00:00Z" } },
                    { "geometry": { "coordinates": [-0.1, 51.5] },
                      "properties": { "disruption_id": "TIMS-2", "road_name": "Aldwych" } },
                    { "geometry": { "coordinates": [-0.1, 51.5] },
                      "properties": { "disruption_id": "TIMS-3", "road_name": "Kingsway" } }
                ] }),
                Category::TransportDisruption => json!({ "features": [{
                    "properties": { "id": "t1", "service": "tube", "commonName": "Bank", "lat": 51.513, "long": -0.089,
                                    "disruptions": { "dlr": { "type": "Closure" } } }
                }] }),
            };
            return Ok(FeatureCollection::from_value(query.category, body));
        }
    }

    #[tokio::test]
    async fn road_items_follow_navigation_wording() {
        let items = list(&CityFeed, Category::RoadDisruption, None, 2).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Serious on Strand");
        assert_eq!(items[0].description, "Lane closed");
        assert_eq!(items[0].path, "/routes/road-disruption/strand-TIMS-1");
        assert_eq!(items[0].last_updated.as_deref(), Some("2025-06-10T11:00:00Z"));
        assert_eq!(items[1].title, "Moderate on Aldwych");
    }

    #[tokio::test]
    async fn listed_slugs_resolve() {
        for category in [Category::RoadDisruption, Category::Event, Category::TransportDisruption] {
            for item in list(&CityFeed, category, None, 10).await.unwrap() {
                let entity = resolver::resolve_entity(&CityFeed, category, &item.slug, None).await.unwrap();
                assert_eq!(entity.slug(), item.slug);
            }
        }
    }

    #[tokio::test]
    async fn list_all_keeps_going_past_a_failed_feed() {
        let sections = list_all(&CityFeed, None, 5).await;
        let categories: Vec<Category> = sections.iter().map(|s| s.category).collect();
        assert_eq!(categories, Category::ALL.to_vec());
        assert!(matches!(sections[1].items, Err(Error::Network { .. })));

        let events = sections[2].items.as_ref().unwrap();
        assert_eq!(events[0].title, "Summer Fair");
        assert_eq!(events[0].description, "festivals at Hyde Park");

        let transport = sections[3].items.as_ref().unwrap();
        assert_eq!(transport[0].title, "Closure on tube");
        assert_eq!(transport[0].description, "tube at Bank");
    }

    #[test]
    fn inspector_title_uses_first_address_part() {
        let properties = serde_json::from_value(json!({
            "id": "ins-4",
            "data": { "type": "tfl", "formattedAddress": "Waterloo Road, London SE1", "originalMessage": "ticket checks" }
        }))
        .unwrap();
        let entity: Entity = Inspector::hydrate(properties, crate::types::Coordinates { lat: 51.5, lon: -0.11 }).into();
        let item = ListingItem::from_entity(&entity);
        assert_eq!(item.title, "tfl check at Waterloo Road");
        assert_eq!(item.description, "ticket checks");
        assert_eq!(item.slug, "ins-4-ins-4");
    }
}
