//! Error type for region construction, folding, and configuration loading.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All failure modes of this crate.
///
/// Building a [`Region`](crate::Region) and calling
/// [`Region::varied`](crate::Region::varied) never fail. Errors arise only
/// from concrete variations while folding, and from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A concrete variation could not transform its operands.
    #[error("variation {kind} failed: {reason}")]
    Variation {
        /// Short type name of the failing variation.
        kind: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML or does not match the schema.
    #[error("invalid configuration in {}: {source}", .path.display())]
    Toml {
        /// The offending file (or `<inline>` for in-memory text).
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A region's variation chain names a variation that is not defined.
    #[error("region '{region}' refers to unknown variation '{variation}'")]
    UnknownVariation {
        /// Region whose chain is broken.
        region: String,
        /// The missing variation name.
        variation: String,
    },

    /// Two configuration entries of the same kind share a name.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// `"region"` or `"variation"`.
        kind: &'static str,
        /// The repeated name.
        name: String,
    },
}

impl Error {
    /// Builds a [`Error::Variation`] for the concrete variation type `V`.
    pub fn variation<V: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Variation {
            kind: short_type_name::<V>(),
            reason: reason.into(),
        }
    }
}

/// Last path segment of a type name, ignoring generic arguments.
pub(crate) fn short_type_name<V: ?Sized>() -> &'static str {
    let full = std::any::type_name::<V>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
