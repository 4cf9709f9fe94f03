/// Core domain types for cityslug: feed categories, positions, and road references.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Feed box height/width in the feed's own units when the config doesn't override it.
const DEFAULT_AREA_SIDE: u32 = 1000;

/// Size of the box queried around an origin. Only events and transport
/// disruptions send it; the other feeds pick their own radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Area {
    /// Box height.
    pub height: u32,
    /// Box width.
    pub width: u32,
}

impl Default for Area {
    fn default() -> Self {
        return Self {
            height: DEFAULT_AREA_SIDE,
            width: DEFAULT_AREA_SIDE,
        };
    }
}

/// One of the four kinds of map-anchored item the feed serves.
/// The CLI spelling is the detail-page route prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Concerts, sports, expos and other scheduled events.
    Event,
    /// Enforcement checks reported at a location.
    Inspector,
    /// Road works, closures and incidents.
    RoadDisruption,
    /// Tube, rail, bus and other transport service disruptions.
    TransportDisruption,
}

impl Category {
    /// All categories in the order list views show them.
    pub const ALL: [Self; 4] = [
        Self::RoadDisruption,
        Self::Inspector,
        Self::Event,
        Self::TransportDisruption,
    ];

    /// Path segment of this category's feed endpoint.
    pub const fn feed_segment(self) -> &'static str {
        return match self {
            Self::Event => "events",
            Self::Inspector => "inspectors",
            Self::RoadDisruption => "roads",
            Self::TransportDisruption => "disruptions",
        };
    }

    /// Route prefix of this category's detail pages.
    pub const fn route_prefix(self) -> &'static str {
        return match self {
            Self::Event => "event",
            Self::Inspector => "inspector",
            Self::RoadDisruption => "road-disruption",
            Self::TransportDisruption => "transport-disruption",
        };
    }

    /// Detail-page path for a slug in this category.
    pub fn route_path(self, slug: &str) -> String {
        return format!("/routes/{}/{slug}", self.route_prefix());
    }

    /// Whether the feed query for this category carries `width`/`height`.
    pub const fn sends_area(self) -> bool {
        return matches!(self, Self::Event | Self::TransportDisruption);
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.route_prefix());
    }
}

/// A feature's position. Serialized GeoJSON-style as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "[f64; 2]")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl From<[f64; 2]> for Coordinates {
    fn from([lon, lat]: [f64; 2]) -> Self {
        return Self { lat, lon };
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(coordinates: Coordinates) -> Self {
        return [coordinates.lon, coordinates.lat];
    }
}

/// Center of a feed query.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Origin {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Origin {
    /// Central London, used whenever a caller gives no origin.
    pub const LONDON: Self = Self {
        lat: 51.5074,
        lon: -0.1276,
    };

    /// Check that the origin is a real position on the globe.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOrigin` if latitude is outside ±90 or longitude outside ±180.
    pub fn validate(self) -> Result<Self, Error> {
        let valid = (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon);
        if !valid {
            return Err(Error::InvalidOrigin {
                lat: self.lat,
                lon: self.lon,
            });
        }
        return Ok(self);
    }
}

impl Default for Origin {
    fn default() -> Self {
        return Self::LONDON;
    }
}

/// Which kind of road a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoadKind {
    /// A-road, written `[A302]` in feed text.
    A,
    /// Motorway, written `[M25]` in feed text.
    M,
    /// A plain street name with no road number.
    Street,
}

impl RoadKind {
    /// Parse the single-letter road class used inside bracketed codes.
    pub fn from_letter(letter: &str) -> Option<Self> {
        return match letter {
            "A" => Some(Self::A),
            "M" => Some(Self::M),
            _ => None,
        };
    }

    /// Display precedence: motorways, then A-roads, then streets.
    pub const fn rank(self) -> u8 {
        return match self {
            Self::A => 1,
            Self::M => 0,
            Self::Street => 2,
        };
    }
}

/// A structured road mention extracted from free text.
/// For A/M kinds `code` is the number with any letter suffix (`"406"`, `"40M"`);
/// for streets it is the street's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadReference {
    /// Road number, or street name for `RoadKind::Street`.
    pub code: String,
    /// Road class.
    pub kind: RoadKind,
}

impl RoadReference {
    /// Build a street reference from a display name.
    pub fn street(name: &str) -> Self {
        return Self {
            code: name.to_string(),
            kind: RoadKind::Street,
        };
    }
}

impl fmt::Display for RoadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self.kind {
            RoadKind::A => write!(f, "A{}", self.code),
            RoadKind::M => write!(f, "M{}", self.code),
            RoadKind::Street => f.write_str(&self.code),
        };
    }
}
