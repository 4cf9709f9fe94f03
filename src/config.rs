use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::feed::{Feed, FixtureFeed, HttpFeed};
use crate::types::{Area, Origin};

/// Upstream list service serving one GeoJSON endpoint per category.
const DEFAULT_BASE_URL: &str = "https://list-api-service.hellocabradar.workers.dev/list";

/// Per-request timeout applied by the HTTP client.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Sent with every feed request.
const DEFAULT_USER_AGENT: &str = concat!("cityslug/", env!("CARGO_PKG_VERSION"));

/// Project configuration loaded from `.cityslug.toml`.
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Box size sent with event and transport queries.
    pub area: Area,
    /// Feed base URL; the category segment is appended.
    pub base_url: String,
    /// Directory of `<segment>.json` files to serve instead of the network.
    pub fixtures: Option<PathBuf>,
    /// Search origin used when a command gets no `--lat`/`--lon`.
    pub origin: Origin,
    /// HTTP timeout in milliseconds.
    pub timeout_ms: u64,
    /// HTTP `User-Agent` header.
    pub user_agent: String,
}

/// Raw TOML structure for `.cityslug.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CityslugTomlConfig {
    /// Overrides `Config::area`.
    area: Option<Area>,
    /// Overrides `Config::base_url`.
    base_url: Option<String>,
    /// Sets `Config::fixtures`, relative to the config's directory.
    fixtures: Option<PathBuf>,
    /// Overrides `Config::origin`.
    origin: Option<Origin>,
    /// Overrides `Config::timeout_ms`.
    timeout_ms: Option<u64>,
    /// Overrides `Config::user_agent`.
    user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            area: Area::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fixtures: None,
            origin: Origin::LONDON,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        };
    }
}

impl Config {
    /// Build the feed this config describes: fixture files when `fixtures`
    /// is set, otherwise the HTTP feed at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` if the HTTP client cannot be built.
    pub fn feed(&self, root: &Path) -> Result<Box<dyn Feed>, Error> {
        if let Some(dir) = &self.fixtures {
            return Ok(Box::new(FixtureFeed::new(root.join(dir))));
        }
        return Ok(Box::new(HttpFeed::new(self)?));
    }

    /// Load config from `.cityslug.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. A written config
    /// file never silently falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid`/`Error::InvalidOrigin` if a value is out of range.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".cityslug.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: CityslugTomlConfig = toml::from_str(&content)?;
        let defaults = Self::default();
        let config = Self {
            area: raw.area.unwrap_or(defaults.area),
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            fixtures: raw.fixtures,
            origin: raw.origin.unwrap_or(defaults.origin),
            timeout_ms: raw.timeout_ms.unwrap_or(defaults.timeout_ms),
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
        };
        return config.validate();
    }

    /// HTTP timeout as a `Duration`.
    pub const fn timeout(&self) -> Duration {
        return Duration::from_millis(self.timeout_ms);
    }

    /// Reject values that would make every request fail.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` for a zero timeout, an empty area, or a
    /// non-HTTP base URL, and `Error::InvalidOrigin` for an off-globe origin.
    fn validate(self) -> Result<Self, Error> {
        if self.timeout_ms == 0 {
            return Err(Error::ConfigInvalid {
                reason: "timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.area.width == 0 || self.area.height == 0 {
            return Err(Error::ConfigInvalid {
                reason: format!("area must be non-empty, got {}x{}", self.area.width, self.area.height),
            });
        }
        let is_http = self.base_url.starts_with("http://") || self.base_url.starts_with("https://");
        if self.fixtures.is_none() && !is_http {
            return Err(Error::ConfigInvalid {
                reason: format!("base_url must be an http(s) URL, got `{}`", self.base_url),
            });
        }
        self.origin.validate()?;
        return Ok(self);
    }
}
