//! Slug resolution: fetch one category's feed around an origin and find the
//! feature whose regenerated slug equals the requested one.
//!
//! One generic routine serves all four categories; each category only
//! supplies its property reader and naming rule through `Resolvable`.

use serde_json::Value;

use crate::entity::{Entity, Event, Inspector, Resolvable, RoadDisruption, TransportDisruption};
use crate::error::Error;
use crate::feed::{FeatureCollection, Feed, FeedQuery};
use crate::slug;
use crate::types::{Category, Coordinates, Origin};

/// How many compared slugs a not-found error reports.
const CONSIDERED_LIMIT: usize = 5;

/// How many near-miss slugs a not-found error suggests.
const SUGGESTION_LIMIT: usize = 3;

/// A feature that could be read as a `T`, with its regenerated slug.
pub struct Candidate<T: Resolvable> {
    /// Geometry position, else the category's property fallback.
    pub coordinates: Coordinates,
    /// Slug as the list views link to it.
    pub link: String,
    /// `link` after normalization; this is what gets compared.
    pub normalized: String,
    /// Typed feature properties.
    pub properties: T::Properties,
}

/// Read every usable candidate from a collection, in feed order.
/// Features whose properties don't fit `T` or that have no position are skipped.
pub fn candidates<T: Resolvable>(collection: FeatureCollection) -> Vec<Candidate<T>> {
    let category = T::CATEGORY;
    return collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let properties = match serde_json::from_value::<T::Properties>(properties_object(feature.properties)) {
                Err(e) => {
                    tracing::debug!(%category, index, error = %e, "skipping unreadable feature");
                    return None;
                },
                Ok(p) => p,
            };
            let Some(coordinates) = feature.coordinates.or_else(|| return T::fallback_coordinates(&properties))
            else {
                tracing::debug!(%category, index, "skipping feature without a position");
                return None;
            };
            let link = T::link_slug(&properties);
            let normalized = slug::normalize(&link);
            return Some(Candidate {
                coordinates,
                link,
                normalized,
                properties,
            });
        })
        .collect();
}

/// `null` properties read as an empty object so every field takes its default.
fn properties_object(properties: Value) -> Value {
    if properties.is_null() {
        return Value::Object(serde_json::Map::new());
    }
    return properties;
}

/// Resolve `slug` to a `T` using one fetch of `T`'s feed around `origin`
/// (central London when `None`).
///
/// The first candidate in feed order whose normalized slug equals the
/// normalized request wins; later duplicates are never seen.
///
/// # Errors
///
/// Returns `Error::NotFound` when the feed answered but nothing matched
/// (including an empty or malformed feed), and propagates `Error::Network`
/// and other fetch failures unchanged.
pub async fn resolve<T: Resolvable>(feed: &dyn Feed, slug: &str, origin: Option<Origin>) -> Result<T, Error> {
    let category = T::CATEGORY;
    let origin = origin.unwrap_or_default().validate()?;
    let wanted = slug::normalize(slug);

    let collection = feed.fetch(&FeedQuery { category, origin }).await?;
    let malformed = collection.malformed;
    let mut candidates = candidates::<T>(collection);

    let Some(index) = candidates.iter().position(|c| return c.normalized == wanted) else {
        return Err(not_found(category, slug, &candidates, malformed));
    };

    let duplicates = candidates
        .iter()
        .skip(index.saturating_add(1))
        .filter(|c| return c.normalized == wanted)
        .count();
    if duplicates > 0 {
        tracing::debug!(%category, slug, duplicates, "slug is shared by later features; first wins");
    }

    let candidate = candidates.swap_remove(index);
    tracing::info!(%category, slug = %candidate.link, "resolved");
    return Ok(T::hydrate(candidate.properties, candidate.coordinates));
}

/// Resolve a slug of any category into an `Entity`.
///
/// # Errors
///
/// Same as `resolve`.
pub async fn resolve_entity(
    feed: &dyn Feed,
    category: Category,
    slug: &str,
    origin: Option<Origin>,
) -> Result<Entity, Error> {
    return match category {
        Category::Event => resolve_event(feed, slug, origin).await.map(Entity::from),
        Category::Inspector => resolve_inspector(feed, slug, origin).await.map(Entity::from),
        Category::RoadDisruption => resolve_road_disruption(feed, slug, origin).await.map(Entity::from),
        Category::TransportDisruption => resolve_transport_disruption(feed, slug, origin).await.map(Entity::from),
    };
}

/// Resolve an `/routes/event/<slug>` page.
///
/// # Errors
///
/// Same as `resolve`.
pub async fn resolve_event(feed: &dyn Feed, slug: &str, origin: Option<Origin>) -> Result<Event, Error> {
    return resolve::<Event>(feed, slug, origin).await;
}

/// Resolve an `/routes/inspector/<slug>` page.
///
/// # Errors
///
/// Same as `resolve`.
pub async fn resolve_inspector(feed: &dyn Feed, slug: &str, origin: Option<Origin>) -> Result<Inspector, Error> {
    return resolve::<Inspector>(feed, slug, origin).await;
}

/// Resolve an `/routes/road-disruption/<slug>` page.
///
/// # Errors
///
/// Same as `resolve`.
pub async fn resolve_road_disruption(
    feed: &dyn Feed,
    slug: &str,
    origin: Option<Origin>,
) -> Result<RoadDisruption, Error> {
    return resolve::<RoadDisruption>(feed, slug, origin).await;
}

/// Resolve an `/routes/transport-disruption/<slug>` page.
///
/// # Errors
///
/// Same as `resolve`.
pub async fn resolve_transport_disruption(
    feed: &dyn Feed,
    slug: &str,
    origin: Option<Origin>,
) -> Result<TransportDisruption, Error> {
    return resolve::<TransportDisruption>(feed, slug, origin).await;
}

/// Build and log the not-found error: a sample of compared slugs, plus
/// candidates whose trailing token matches the request's.
fn not_found<T: Resolvable>(category: Category, slug: &str, candidates: &[Candidate<T>], malformed: bool) -> Error {
    let considered: Vec<String> = candidates
        .iter()
        .take(CONSIDERED_LIMIT)
        .map(|c| return c.normalized.clone())
        .collect();
    tracing::warn!(
        %category,
        slug,
        candidates = candidates.len(),
        ?considered,
        malformed,
        "no feature matches slug"
    );

    let wanted_tail = slug::trailing_id(slug).to_lowercase();
    let suggestions = candidates
        .iter()
        .filter(|c| return !wanted_tail.is_empty() && slug::trailing_id(&c.normalized) == wanted_tail)
        .take(SUGGESTION_LIMIT)
        .map(|c| return c.link.clone())
        .collect();

    return Error::NotFound {
        category,
        considered,
        feed_malformed: malformed,
        slug: slug.to_string(),
        suggestions,
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    /// Serves one fixed body for every query and records the queries.
    struct StaticFeed {
        body: Value,
        queries: Mutex<Vec<FeedQuery>>,
    }

    impl StaticFeed {
        fn new(body: Value) -> Self {
            return Self { body, queries: Mutex::new(Vec::new()) };
        }

        fn queries(&self) -> Vec<FeedQuery> {
            return self.queries.lock().unwrap().clone();
        }
    }

    #[async_trait]
    impl Feed for StaticFeed {
        async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error> {
            self.queries.lock().unwrap().push(*query);
            return Ok(FeatureCollection::from_value(query.category, self.body.clone()));
        }
    }

    /// Always fails the way an unreachable feed does.
    struct FailingFeed;

    #[async_trait]
    impl Feed for FailingFeed {
        async fn fetch(&self, query: &FeedQuery) -> Result<FeatureCollection, Error> {
            return Err(Error::Network { category: query.category, reason: "connection refused".to_string() });
        }
    }

    fn roads_body() -> Value {
        return json!({
            "features": [
                {
                    "geometry": { "coordinates": [-0.1221, 51.4946] },
                    "properties": {
                        "disruption_id": "TIMS-204461",
                        "road_description": "[A3036] Lambeth Bridge (SE1), Millbank",
                        "comments": "[A3036] Lambeth Bridge (SE1) Lane closures",
                        "severity": "Serious"
                    }
                },
                {
                    "geometry": { "coordinates": [-0.1419, 51.5154] },
                    "properties": { "disruption_id": "TIMS-12345", "road_name": "Oxford Street" }
                },
                {
                    "geometry": { "coordinates": [0.0, 0.0] },
                    "properties": { "disruption_id": "TIMS-12345", "road_name": "Oxford Street", "severity": "Minimal" }
                },
                { "properties": { "disruption_id": "TIMS-999", "road_name": "No Geometry Road" } }
            ]
        });
    }

    #[tokio::test]
    async fn list_slug_round_trips() {
        let feed = StaticFeed::new(roads_body());
        let link = slug::road_disruption_slug("Oxford Street", "TIMS-12345");
        let road = resolve_road_disruption(&feed, &link, None).await.unwrap();
        assert_eq!(road.id, "TIMS-12345");
        assert_eq!(road.display_name, "Oxford Street");
    }

    #[tokio::test]
    async fn lookup_ignores_slug_case_and_punctuation() {
        let feed = StaticFeed::new(roads_body());
        let road = resolve_road_disruption(&feed, "Lambeth--Bridge_tims-204461", None).await.unwrap();
        assert_eq!(road.id, "TIMS-204461");
        assert_eq!(road.severity, "Serious");
    }

    #[tokio::test]
    async fn first_match_in_feed_order_wins() {
        let feed = StaticFeed::new(roads_body());
        let road = resolve_road_disruption(&feed, "oxford-street-TIMS-12345", None).await.unwrap();
        assert_eq!(road.severity, "Moderate");
        assert_eq!(road.coordinates, Coordinates { lat: 51.5154, lon: -0.1419 });
    }

    #[tokio::test]
    async fn resolution_is_repeatable() {
        let feed = StaticFeed::new(roads_body());
        let first = resolve_road_disruption(&feed, "lambeth-bridge-TIMS-204461", None).await.unwrap();
        let second = resolve_road_disruption(&feed, "lambeth-bridge-TIMS-204461", None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.coordinates, second.coordinates);
    }

    #[tokio::test]
    async fn fetches_once_from_default_origin() {
        let feed = StaticFeed::new(roads_body());
        let _ = resolve_road_disruption(&feed, "missing-1", None).await;
        let queries = feed.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], FeedQuery { category: Category::RoadDisruption, origin: Origin::LONDON });
    }

    #[tokio::test]
    async fn caller_origin_is_forwarded_not_used_as_position() {
        let feed = StaticFeed::new(roads_body());
        let origin = Origin { lat: 53.48, lon: -2.24 };
        let road = resolve_road_disruption(&feed, "lambeth-bridge-TIMS-204461", Some(origin)).await.unwrap();
        assert_eq!(feed.queries()[0].origin, origin);
        assert_eq!(road.coordinates, Coordinates { lat: 51.4946, lon: -0.1221 });
    }

    #[tokio::test]
    async fn feature_without_geometry_cannot_match() {
        let feed = StaticFeed::new(roads_body());
        let err = resolve_road_disruption(&feed, "no-geometry-road-TIMS-999", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn not_found_reports_candidates_and_suggestions() {
        let feed = StaticFeed::new(roads_body());
        let err = resolve_road_disruption(&feed, "westminster-bridge-TIMS-204461", None).await.unwrap_err();
        let Error::NotFound { considered, feed_malformed, suggestions, .. } = err else {
            panic!("expected NotFound, got {err:?}");
        };
        assert_eq!(considered.len(), 3);
        assert!(!feed_malformed);
        assert_eq!(suggestions, vec!["lambeth-bridge-TIMS-204461"]);
    }

    /// Shared buffer the test subscriber writes log lines into.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn text(&self) -> String {
            return String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned();
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            return Ok(buf.len());
        }

        fn flush(&mut self) -> std::io::Result<()> {
            return Ok(());
        }
    }

    #[tokio::test]
    async fn not_found_logs_compared_slugs() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || return writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let feed = StaticFeed::new(roads_body());
        let err = resolve_road_disruption(&feed, "westminster-bridge-TIMS-1", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let text = log.text();
        assert!(text.contains("no feature matches slug"), "log: {text}");
        assert!(text.contains("lambeth-bridge-tims-204461"), "log: {text}");
        assert!(text.contains("oxford-street-tims-12345"), "log: {text}");
    }

    #[tokio::test]
    async fn odd_optional_fields_do_not_hide_a_match() {
        let feed = StaticFeed::new(json!({
            "features": [{
                "geometry": { "coordinates": [-0.1774, 51.5010] },
                "properties": { "id": "e1", "title": "BBC Proms", "attendance": 5000.0, "venue_name": null }
            }]
        }));
        let event = resolve_event(&feed, "bbc-proms-e1", None).await.unwrap();
        assert_eq!(event.id, "e1");

        let feed = StaticFeed::new(json!({
            "features": [{ "properties": { "id": "t1", "commonName": "Bank", "lat": 51.513, "long": -0.089, "disruptions": null } }]
        }));
        let transport = resolve_transport_disruption(&feed, "bank-t1", None).await.unwrap();
        assert_eq!(transport.status, "Disruption");
    }

    #[tokio::test]
    async fn position_with_altitude_resolves() {
        let feed = StaticFeed::new(json!({
            "features": [{
                "geometry": { "coordinates": [-0.12, 51.5, 12.0] },
                "properties": { "disruption_id": "TIMS-1", "road_name": "Strand" }
            }]
        }));
        let road = resolve_road_disruption(&feed, "strand-TIMS-1", None).await.unwrap();
        assert_eq!(road.coordinates, Coordinates { lat: 51.5, lon: -0.12 });
    }

    #[tokio::test]
    async fn network_failure_is_not_not_found() {
        let err = resolve_event(&FailingFeed, "anything-1", None).await.unwrap_err();
        assert!(matches!(err, Error::Network { category: Category::Event, .. }));
    }

    #[tokio::test]
    async fn malformed_feed_is_not_found() {
        let feed = StaticFeed::new(json!({ "type": "FeatureCollection" }));
        let err = resolve_inspector(&feed, "ins-1-ins-1", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { feed_malformed: true, .. }));
    }

    #[tokio::test]
    async fn invalid_origin_is_rejected_before_fetching() {
        let feed = StaticFeed::new(roads_body());
        let origin = Origin { lat: 0.0, lon: 200.0 };
        let err = resolve_road_disruption(&feed, "x-1", Some(origin)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOrigin { .. }));
        assert!(feed.queries().is_empty());
    }

    #[tokio::test]
    async fn transport_falls_back_to_property_position() {
        let feed = StaticFeed::new(json!({
            "features": [{
                "properties": {
                    "id": "940GZZLUOXC",
                    "service": "tube",
                    "commonName": "Oxford Circus",
                    "lat": 51.5152,
                    "long": -0.1415,
                    "disruptions": { "central": { "type": "Suspension", "description": "Part suspended" } }
                }
            }]
        }));
        let entity = resolve_entity(&feed, Category::TransportDisruption, "oxford-circus-940GZZLUOXC", None)
            .await
            .unwrap();
        assert_eq!(entity.coordinates(), Coordinates { lat: 51.5152, lon: -0.1415 });
        let Entity::TransportDisruption(transport) = entity else {
            panic!("wrong entity kind");
        };
        assert_eq!(transport.status, "Suspension");
    }

    #[tokio::test]
    async fn numeric_event_ids_resolve() {
        let feed = StaticFeed::new(json!({
            "features": [{
                "geometry": { "coordinates": [-0.1774, 51.5010] },
                "properties": { "id": 8812, "title": "BBC Proms", "venue_name": "Royal Albert Hall" }
            }]
        }));
        let event = resolve_event(&feed, "bbc-proms-8812", None).await.unwrap();
        assert_eq!(event.id, "8812");
        assert_eq!(feed.queries()[0].category, Category::Event);
    }
}
