//! Detail entities hydrated from feed features, one per category.
//!
//! Each category decides three things: how its feature properties are read,
//! which field names it (first non-empty wins), and which field is its feed id.
//! The resolver and the list views share those rules through `Resolvable`,
//! so every slug a list view links to resolves again.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::roads;
use crate::slug;
use crate::types::{Category, Coordinates, RoadKind, RoadReference};

/// Category-specific reading of a feed feature.
pub trait Resolvable: Sized {
    /// Feed and route category.
    const CATEGORY: Category;

    /// Typed view of a feature's `properties`.
    type Properties: serde::de::DeserializeOwned;

    /// The display name slugs are built from.
    fn canonical_name(properties: &Self::Properties) -> String;

    /// Position to use when the feature has no geometry.
    fn fallback_coordinates(_properties: &Self::Properties) -> Option<Coordinates> {
        return None;
    }

    /// The feed's opaque id for the feature.
    fn feed_id(properties: &Self::Properties) -> &str;

    /// Build the detail entity from a matched feature.
    fn hydrate(properties: Self::Properties, coordinates: Coordinates) -> Self;

    /// The detail-page slug for the feature.
    fn link_slug(properties: &Self::Properties) -> String;
}

/// Any detail entity, tagged by category for JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Entity {
    /// A scheduled event.
    Event(Event),
    /// An enforcement check.
    Inspector(Inspector),
    /// A road disruption.
    RoadDisruption(RoadDisruption),
    /// A transport service disruption.
    TransportDisruption(TransportDisruption),
}

impl Entity {
    /// Category of the wrapped entity.
    pub const fn category(&self) -> Category {
        return match self {
            Self::Event(_) => Category::Event,
            Self::Inspector(_) => Category::Inspector,
            Self::RoadDisruption(_) => Category::RoadDisruption,
            Self::TransportDisruption(_) => Category::TransportDisruption,
        };
    }

    /// The feature's own position.
    pub const fn coordinates(&self) -> Coordinates {
        return match self {
            Self::Event(e) => e.coordinates,
            Self::Inspector(i) => i.coordinates,
            Self::RoadDisruption(r) => r.coordinates,
            Self::TransportDisruption(t) => t.coordinates,
        };
    }

    /// Name shown on the detail page and used for the slug.
    pub fn display_name(&self) -> &str {
        return match self {
            Self::Event(e) => &e.display_name,
            Self::Inspector(i) => &i.display_name,
            Self::RoadDisruption(r) => &r.display_name,
            Self::TransportDisruption(t) => &t.display_name,
        };
    }

    /// Feed id.
    pub fn id(&self) -> &str {
        return match self {
            Self::Event(e) => &e.id,
            Self::Inspector(i) => &i.id,
            Self::RoadDisruption(r) => &r.id,
            Self::TransportDisruption(t) => &t.id,
        };
    }

    /// Timestamp the live badge and relative age are computed from.
    pub fn last_updated(&self) -> Option<&str> {
        return match self {
            Self::Event(e) => e.start.as_deref(),
            Self::Inspector(i) => i.time.as_deref(),
            Self::RoadDisruption(r) => r.last_updated.as_deref(),
            Self::TransportDisruption(t) => t.from_date.as_deref(),
        };
    }

    /// Detail-page slug, regenerated with the category's slug rule.
    pub fn slug(&self) -> String {
        return match self {
            Self::Event(e) => slug::event_slug(&e.display_name, &e.id),
            Self::Inspector(i) => slug::inspector_slug(&i.display_name, &i.id),
            Self::RoadDisruption(r) => slug::road_disruption_slug(&r.display_name, &r.id),
            Self::TransportDisruption(t) => slug::transport_disruption_slug(&t.display_name, &t.id),
        };
    }
}

impl From<Event> for Entity {
    fn from(entity: Event) -> Self {
        return Self::Event(entity);
    }
}

impl From<Inspector> for Entity {
    fn from(entity: Inspector) -> Self {
        return Self::Inspector(entity);
    }
}

impl From<RoadDisruption> for Entity {
    fn from(entity: RoadDisruption) -> Self {
        return Self::RoadDisruption(entity);
    }
}

impl From<TransportDisruption> for Entity {
    fn from(entity: TransportDisruption) -> Self {
        return Self::TransportDisruption(entity);
    }
}

// ── Events ─────────────────────────────────────────────────────────────

/// A scheduled event near the search origin.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Expected attendance, when the feed knows it.
    pub attendance: Option<f64>,
    /// Event category such as `sports` or `concerts`.
    pub category: String,
    /// Free-text note from the feed.
    pub comment: Option<String>,
    /// Feature position.
    pub coordinates: Coordinates,
    /// Comment, else `"<category> event"`.
    pub description: String,
    /// Title, else venue name.
    pub display_name: String,
    /// Local end time.
    pub end: Option<String>,
    /// Feed id.
    pub id: String,
    /// Venue postcode.
    pub postcode: Option<String>,
    /// Size band such as `major` or `local`.
    pub size: Option<String>,
    /// Local start time.
    pub start: Option<String>,
    /// Venue street address.
    pub venue_address: Option<String>,
    /// Venue name.
    pub venue_name: Option<String>,
}

/// Feed properties of an event feature.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventProperties {
    /// Expected attendance.
    #[serde(deserialize_with = "lenient")]
    attendance: Option<f64>,
    /// Event category.
    #[serde(deserialize_with = "lenient")]
    category: Option<String>,
    /// Free-text note.
    #[serde(deserialize_with = "lenient")]
    comment: Option<String>,
    /// Feed id.
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    /// Venue postcode.
    #[serde(deserialize_with = "lenient")]
    postcode: Option<String>,
    /// Size band.
    #[serde(deserialize_with = "lenient")]
    size: Option<String>,
    /// Local start time.
    #[serde(deserialize_with = "lenient")]
    start_local: Option<String>,
    /// Event title.
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    /// Local end time.
    #[serde(deserialize_with = "lenient")]
    true_end: Option<String>,
    /// Venue street address.
    #[serde(deserialize_with = "lenient")]
    venue_formatted_address: Option<String>,
    /// Venue name.
    #[serde(deserialize_with = "lenient")]
    venue_name: Option<String>,
}

impl Resolvable for Event {
    const CATEGORY: Category = Category::Event;
    type Properties = EventProperties;

    fn canonical_name(properties: &EventProperties) -> String {
        return first_non_empty([properties.title.as_deref(), properties.venue_name.as_deref()])
            .unwrap_or_default()
            .to_string();
    }

    fn feed_id(properties: &EventProperties) -> &str {
        return properties.id.as_deref().unwrap_or_default();
    }

    fn hydrate(properties: EventProperties, coordinates: Coordinates) -> Self {
        let display_name = Self::canonical_name(&properties);
        let id = Self::feed_id(&properties).to_string();
        let category = non_empty(properties.category).unwrap_or_else(|| return "event".to_string());
        let comment = non_empty(properties.comment);
        let description = comment.clone().unwrap_or_else(|| return format!("{category} event"));
        return Self {
            attendance: properties.attendance,
            category,
            comment,
            coordinates,
            description,
            display_name,
            end: non_empty(properties.true_end),
            id,
            postcode: non_empty(properties.postcode),
            size: non_empty(properties.size),
            start: non_empty(properties.start_local),
            venue_address: non_empty(properties.venue_formatted_address),
            venue_name: non_empty(properties.venue_name),
        };
    }

    fn link_slug(properties: &EventProperties) -> String {
        return slug::event_slug(&Self::canonical_name(properties), Self::feed_id(properties));
    }
}

// ── Inspectors ─────────────────────────────────────────────────────────

/// An enforcement check reported at a location.
#[derive(Debug, Clone, Serialize)]
pub struct Inspector {
    /// Check type: `tfl`, `police-check`, or `clear`.
    #[serde(deserialize_with = "lenient")]
    pub check_type: Option<String>,
    /// Feature position.
    pub coordinates: Coordinates,
    /// Id, else formatted address, else name.
    pub display_name: String,
    /// Geocoded address of the report.
    #[serde(deserialize_with = "lenient")]
    pub formatted_address: Option<String>,
    /// Feed id.
    pub id: String,
    /// `Fixed` or `Loose`.
    #[serde(deserialize_with = "lenient")]
    pub location_type: Option<String>,
    /// How the location was geocoded.
    #[serde(deserialize_with = "lenient")]
    pub match_type: Option<String>,
    /// The report as originally posted.
    #[serde(deserialize_with = "lenient")]
    pub original_message: Option<String>,
    /// When the report was made.
    #[serde(deserialize_with = "lenient")]
    pub time: Option<String>,
}

/// Nested `data` object of an inspector feature.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorData {
    /// Geocoded address.
    #[serde(deserialize_with = "lenient")]
    formatted_address: Option<String>,
    /// `Fixed` or `Loose`.
    #[serde(deserialize_with = "lenient")]
    location_type: Option<String>,
    /// Geocoding method.
    #[serde(deserialize_with = "lenient")]
    match_type: Option<String>,
    /// Original report text.
    #[serde(deserialize_with = "lenient")]
    original_message: Option<String>,
    /// Report time.
    #[serde(deserialize_with = "lenient")]
    time: Option<String>,
    /// Check type.
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
}

/// Feed properties of an inspector feature.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InspectorProperties {
    /// Report details.
    #[serde(deserialize_with = "lenient_default")]
    data: InspectorData,
    /// Feed id.
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    /// Location name, when the feed supplies one.
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
}

impl Resolvable for Inspector {
    const CATEGORY: Category = Category::Inspector;
    type Properties = InspectorProperties;

    fn canonical_name(properties: &InspectorProperties) -> String {
        return first_non_empty([
            properties.id.as_deref(),
            properties.data.formatted_address.as_deref(),
            properties.name.as_deref(),
        ])
        .unwrap_or_default()
        .to_string();
    }

    fn feed_id(properties: &InspectorProperties) -> &str {
        return properties.id.as_deref().unwrap_or_default();
    }

    fn hydrate(properties: InspectorProperties, coordinates: Coordinates) -> Self {
        let display_name = Self::canonical_name(&properties);
        let id = Self::feed_id(&properties).to_string();
        let data = properties.data;
        return Self {
            check_type: non_empty(data.kind),
            coordinates,
            display_name,
            formatted_address: non_empty(data.formatted_address),
            id,
            location_type: non_empty(data.location_type),
            match_type: non_empty(data.match_type),
            original_message: non_empty(data.original_message),
            time: non_empty(data.time),
        };
    }

    fn link_slug(properties: &InspectorProperties) -> String {
        return slug::inspector_slug(&Self::canonical_name(properties), Self::feed_id(properties));
    }
}

// ── Road disruptions ───────────────────────────────────────────────────

/// A road works, closure or incident record.
#[derive(Debug, Clone, Serialize)]
pub struct RoadDisruption {
    /// Sorted, de-duplicated roads named in the road description.
    pub affected_roads: Vec<RoadReference>,
    /// Disruption category, default `Road Works`.
    pub category: String,
    /// Operator comments.
    pub comments: String,
    /// Feature position.
    pub coordinates: Coordinates,
    /// Latest status text.
    pub current_update: String,
    /// Road name from the comments, else road name, else road description.
    pub display_name: String,
    /// Start of the disruption.
    pub from_date: Option<String>,
    /// Feed disruption id.
    pub id: String,
    /// When the feed last changed this record.
    pub last_updated: Option<String>,
    /// Number of the primary road, `Unknown` for street-only records.
    pub road_number: String,
    /// Class of the primary road.
    pub road_type: RoadKind,
    /// Severity, default `Moderate`.
    pub severity: String,
    /// Disruption sub-category, default `Maintenance`.
    pub sub_category: String,
    /// Planned end of the disruption.
    pub to_date: Option<String>,
}

/// Feed properties of a road disruption feature.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoadProperties {
    /// Disruption category.
    #[serde(deserialize_with = "lenient")]
    category: Option<String>,
    /// Operator comments; often restate the road as `[A302] Name (district)`.
    #[serde(deserialize_with = "lenient")]
    comments: Option<String>,
    /// Latest status text.
    #[serde(deserialize_with = "lenient")]
    current_update: Option<String>,
    /// Feed id.
    #[serde(deserialize_with = "lenient_id")]
    disruption_id: Option<String>,
    /// Start date.
    #[serde(deserialize_with = "lenient")]
    from_date: Option<String>,
    /// Last change.
    #[serde(deserialize_with = "lenient")]
    last_updated: Option<String>,
    /// Free-text list of affected roads.
    #[serde(deserialize_with = "lenient")]
    road_description: Option<String>,
    /// Short road name.
    #[serde(deserialize_with = "lenient")]
    road_name: Option<String>,
    /// Severity.
    #[serde(deserialize_with = "lenient")]
    severity: Option<String>,
    /// Sub-category.
    #[serde(deserialize_with = "lenient")]
    sub_category: Option<String>,
    /// End date.
    #[serde(deserialize_with = "lenient")]
    to_date: Option<String>,
}

impl RoadProperties {
    /// Road description, else road name, for road parsing.
    fn roads_text(&self) -> &str {
        return first_non_empty([self.road_description.as_deref(), self.road_name.as_deref()])
            .unwrap_or_default();
    }
}

impl Resolvable for RoadDisruption {
    const CATEGORY: Category = Category::RoadDisruption;
    type Properties = RoadProperties;

    fn canonical_name(properties: &RoadProperties) -> String {
        let description = properties.road_description.as_deref().unwrap_or_default();
        let comments = properties.comments.as_deref().unwrap_or_default();
        if let Some(primary) = roads::primary_road(description, comments)
            && let Some(name) = roads::road_name_from_comments(comments, &primary)
        {
            return name;
        }
        return first_non_empty([properties.road_name.as_deref(), properties.road_description.as_deref()])
            .unwrap_or_default()
            .to_string();
    }

    fn feed_id(properties: &RoadProperties) -> &str {
        return properties.disruption_id.as_deref().unwrap_or_default();
    }

    fn hydrate(properties: RoadProperties, coordinates: Coordinates) -> Self {
        let display_name = Self::canonical_name(&properties);
        let id = Self::feed_id(&properties).to_string();
        let comments = properties.comments.clone().unwrap_or_default();

        let primary = roads::primary_road(properties.road_description.as_deref().unwrap_or_default(), &comments);
        let (road_type, road_number) = match primary {
            None => (RoadKind::Street, "Unknown".to_string()),
            Some(road) => (road.kind, road.code),
        };

        let mut affected_roads = roads::parse_road_description(properties.roads_text());
        roads::sort_roads(&mut affected_roads);
        roads::dedup_roads(&mut affected_roads);

        let category = non_empty(properties.category);
        let current_update = non_empty(properties.current_update)
            .or_else(|| return category.clone())
            .unwrap_or_else(|| return "Road disruption reported".to_string());

        return Self {
            affected_roads,
            category: category.unwrap_or_else(|| return "Road Works".to_string()),
            comments,
            coordinates,
            current_update,
            display_name,
            from_date: non_empty(properties.from_date),
            id,
            last_updated: non_empty(properties.last_updated),
            road_number,
            road_type,
            severity: non_empty(properties.severity).unwrap_or_else(|| return "Moderate".to_string()),
            sub_category: non_empty(properties.sub_category).unwrap_or_else(|| return "Maintenance".to_string()),
            to_date: non_empty(properties.to_date),
        };
    }

    fn link_slug(properties: &RoadProperties) -> String {
        return slug::road_disruption_slug(&Self::canonical_name(properties), Self::feed_id(properties));
    }
}

// ── Transport disruptions ──────────────────────────────────────────────

/// Disruption on one line serving a station.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineDisruption {
    /// What is happening.
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    /// When it started.
    #[serde(deserialize_with = "lenient")]
    pub from_date: Option<String>,
    /// Line name, when the feed gives one.
    #[serde(deserialize_with = "lenient")]
    pub line: Option<String>,
    /// `Disruption`, `Closure`, `Suspension` or `Delay`.
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
}

/// A transport service disruption at a station.
#[derive(Debug, Clone, Serialize)]
pub struct TransportDisruption {
    /// Keys of the per-line disruption map, in feed order.
    pub affected_lines: Vec<String>,
    /// Whether the station serves an airport.
    pub airport_tag: bool,
    /// Station name.
    pub common_name: String,
    /// Feature position.
    pub coordinates: Coordinates,
    /// First disruption's description, else `"<service> disruption"`.
    pub description: String,
    /// Station name, as used for the slug.
    pub display_name: String,
    /// Start of the first disruption.
    pub from_date: Option<String>,
    /// Feed id.
    pub id: String,
    /// Per-line disruption details, in feed order.
    pub lines: Vec<LineDisruption>,
    /// Transport mode such as `tube` or `bus`.
    pub service: String,
    /// First disruption's type, default `Disruption`.
    pub status: String,
}

/// Feed properties of a transport disruption feature.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransportProperties {
    /// Serves an airport.
    #[serde(deserialize_with = "lenient")]
    airport_tag: Option<bool>,
    /// Station name.
    #[serde(rename = "commonName", deserialize_with = "lenient")]
    common_name: Option<String>,
    /// Per-line disruption objects keyed by line id.
    #[serde(deserialize_with = "lenient_default")]
    disruptions: Map<String, Value>,
    /// Feed id.
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    /// Station latitude.
    #[serde(deserialize_with = "lenient")]
    lat: Option<f64>,
    /// Station longitude.
    #[serde(deserialize_with = "lenient")]
    long: Option<f64>,
    /// Transport mode.
    #[serde(deserialize_with = "lenient")]
    service: Option<String>,
}

impl Resolvable for TransportDisruption {
    const CATEGORY: Category = Category::TransportDisruption;
    type Properties = TransportProperties;

    fn canonical_name(properties: &TransportProperties) -> String {
        return first_non_empty([properties.common_name.as_deref()])
            .unwrap_or_default()
            .to_string();
    }

    fn fallback_coordinates(properties: &TransportProperties) -> Option<Coordinates> {
        return Some(Coordinates {
            lat: properties.lat?,
            lon: properties.long?,
        });
    }

    fn feed_id(properties: &TransportProperties) -> &str {
        return properties.id.as_deref().unwrap_or_default();
    }

    fn hydrate(properties: TransportProperties, coordinates: Coordinates) -> Self {
        let display_name = Self::canonical_name(&properties);
        let id = Self::feed_id(&properties).to_string();
        let service = properties.service.unwrap_or_default();

        let (affected_lines, lines): (Vec<String>, Vec<LineDisruption>) = properties
            .disruptions
            .into_iter()
            .map(|(key, value)| return (key, serde_json::from_value(value).unwrap_or_default()))
            .unzip();

        let first = lines.first();
        let status = first
            .and_then(|l| return non_empty(l.kind.clone()))
            .unwrap_or_else(|| return "Disruption".to_string());
        let description = first
            .and_then(|l| return non_empty(l.description.clone()))
            .unwrap_or_else(|| return format!("{service} disruption"));
        let from_date = first.and_then(|l| return non_empty(l.from_date.clone()));

        return Self {
            affected_lines,
            airport_tag: properties.airport_tag.unwrap_or(false),
            common_name: properties.common_name.unwrap_or_default(),
            coordinates,
            description,
            display_name,
            from_date,
            id,
            lines,
            service,
            status,
        };
    }

    fn link_slug(properties: &TransportProperties) -> String {
        return slug::transport_disruption_slug(&Self::canonical_name(properties), Self::feed_id(properties));
    }
}

// ── Field helpers ──────────────────────────────────────────────────────

/// First field that is present and not blank.
fn first_non_empty<'a, const N: usize>(fields: [Option<&'a str>; N]) -> Option<&'a str> {
    return fields
        .into_iter()
        .flatten()
        .find(|field| return !field.trim().is_empty());
}

/// Read an optional field, treating `null` or a value of the wrong type as absent,
/// so one odd display field never drops the whole feature.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    return Ok(value.and_then(|v| return serde_json::from_value(v).ok()));
}

/// Like `lenient`, for fields that fall back to their default instead of `None`.
fn lenient_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    return lenient(deserializer).map(Option::unwrap_or_default);
}

/// Accept a feed id written as a string or a number; `null` reads as absent.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    return Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    });
}

/// Drop blank strings so defaults apply to them too.
fn non_empty(value: Option<String>) -> Option<String> {
    return value.filter(|v| return !v.trim().is_empty());
}
