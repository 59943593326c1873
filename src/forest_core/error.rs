use thiserror::Error;

/// Configuration failures surface before any generation runs. A
/// non-positive weight sum must fail here: renormalizing it would feed
/// NaN or infinite weights into selection.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("species probability weights sum to {sum}; a positive finite total is required")]
    NonPositiveWeightSum { sum: f32 },

    #[error("configuration declares no species")]
    NoSpecies,

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
