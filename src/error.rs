/// Crate-level error types for cityslug diagnostics.
use std::path::PathBuf;

use crate::types::Category;

/// All errors in cityslug carry enough context to produce a useful diagnostic
/// without a debugger. Feed failures and unmatched slugs are separate variants
/// so callers branch on the variant, never on the message.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `.cityslug.toml` parsed but holds a value that cannot be used.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// Which setting was rejected and why.
        reason: String,
    },

    /// The fixture feed has no JSON file for a category.
    #[error("fixture not found: {}", path.display())]
    FixtureNotFound {
        /// Path of the missing fixture file.
        path: PathBuf,
    },

    /// A search origin lies outside valid latitude/longitude ranges.
    #[error("invalid origin: lat {lat}, lon {lon}")]
    InvalidOrigin {
        /// Latitude that was supplied.
        lat: f64,
        /// Longitude that was supplied.
        lon: f64,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON could not be decoded.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The feed fetch failed, timed out, returned a non-success status,
    /// or sent a body that is not JSON.
    #[error("feed unavailable for {category}: {reason}")]
    Network {
        /// Category whose feed was being queried.
        category: Category,
        /// Transport-level description of the failure.
        reason: String,
    },

    /// The feed answered, but no candidate's regenerated slug equals the requested one.
    #[error("{category} not found: `{slug}`")]
    NotFound {
        /// Category that was searched.
        category: Category,
        /// First few normalized candidate slugs that were compared.
        considered: Vec<String>,
        /// The feed response lacked a `features` array.
        feed_malformed: bool,
        /// Slug as requested by the caller.
        slug: String,
        /// Candidate slugs sharing the requested slug's trailing token.
        suggestions: Vec<String>,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
