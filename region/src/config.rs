//! Analysis configuration: region and variation definitions in TOML.
//!
//! ```toml
//! [[variation]]
//! name = "sf_up"
//! kind = "weight_scaled"
//! factor = "lepton_sf_up / lepton_sf"
//!
//! [[region]]
//! name = "signal"
//! weight = "mc_weight"
//! selection = "n_jets >= 2 && is_iso"
//! label = "Signal region"
//! blinded = true
//! ```
//!
//! A file `analysis.toml` may be accompanied by `analysis.local.toml`. When
//! the local file exists it is read after the main one, and each of its
//! top-level keys replaces the main file's key of the same name. This lets
//! several analysts share one configuration while keeping private overrides.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::region::Region;
use crate::variation::{
    AppliedVariation, Nominal, SelectionReplaced, SelectionTightened, VariableNegated,
    WeightReplaced, WeightScaled,
};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// `[[variation]]` tables.
    #[serde(default, rename = "variation")]
    pub variations: Vec<VariationConfig>,
    /// `[[region]]` tables.
    #[serde(default, rename = "region")]
    pub regions: Vec<RegionConfig>,
}

/// One `[[region]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    /// Region name.
    pub name: String,
    /// Base weight; defaults to `1`.
    #[serde(default = "Expression::one")]
    pub weight: Expression,
    /// Base selection; defaults to `1`.
    #[serde(default = "Expression::one")]
    pub selection: Expression,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Blinded flag.
    #[serde(default)]
    pub blinded: bool,
    /// Names of variations applied to the base region, in order.
    #[serde(default)]
    pub variations: Vec<String>,
}

/// One `[[variation]]` table, tagged by `kind`.
///
/// Each kind accepts exactly its own parameters besides `name`. A parameter
/// that belongs to another kind is an error rather than silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum VariationConfig {
    /// See [`Nominal`].
    Nominal {
        /// Name used in region chains and sweep output.
        name: String,
    },
    /// See [`WeightScaled`].
    WeightScaled {
        /// Name used in region chains and sweep output.
        name: String,
        /// Scale-factor expression.
        factor: Expression,
    },
    /// See [`WeightReplaced`].
    WeightReplaced {
        /// Name used in region chains and sweep output.
        name: String,
        /// Replacement weight.
        weight: Expression,
    },
    /// See [`SelectionTightened`].
    SelectionTightened {
        /// Name used in region chains and sweep output.
        name: String,
        /// Additional cut.
        cut: Expression,
    },
    /// See [`SelectionReplaced`].
    SelectionReplaced {
        /// Name used in region chains and sweep output.
        name: String,
        /// Replacement selection.
        selection: Expression,
    },
    /// See [`VariableNegated`].
    VariableNegated {
        /// Name used in region chains and sweep output.
        name: String,
        /// Property to negate.
        variable: String,
    },
}

impl VariationConfig {
    /// The configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Nominal { name }
            | Self::WeightScaled { name, .. }
            | Self::WeightReplaced { name, .. }
            | Self::SelectionTightened { name, .. }
            | Self::SelectionReplaced { name, .. }
            | Self::VariableNegated { name, .. } => name,
        }
    }

    /// Instantiates the configured variation.
    #[must_use]
    pub fn build(&self) -> AppliedVariation {
        match self {
            Self::Nominal { .. } => AppliedVariation::new(Nominal),
            Self::WeightScaled { factor, .. } => {
                AppliedVariation::new(WeightScaled::new(factor.clone()))
            }
            Self::WeightReplaced { weight, .. } => {
                AppliedVariation::new(WeightReplaced::new(weight.clone()))
            }
            Self::SelectionTightened { cut, .. } => {
                AppliedVariation::new(SelectionTightened::new(cut.clone()))
            }
            Self::SelectionReplaced { selection, .. } => {
                AppliedVariation::new(SelectionReplaced::new(selection.clone()))
            }
            Self::VariableNegated { variable, .. } => {
                AppliedVariation::new(VariableNegated::new(variable.clone()))
            }
        }
    }
}

/// A configured variation together with its name.
#[derive(Debug, Clone)]
pub struct NamedVariation {
    /// Configured name.
    pub name: String,
    /// The variation itself.
    pub variation: AppliedVariation,
}

/// Regions and variations built from an [`AnalysisConfig`].
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Base regions, each with its configured chain already applied.
    pub regions: Vec<Region>,
    /// Named variations, in file order.
    pub variations: Vec<NamedVariation>,
}

impl AnalysisConfig {
    /// Loads `path`, merged with its `.local.toml` sibling if present.
    ///
    /// Returns `Ok(None)` if `path` does not exist or is not a file, even if
    /// the local override exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a file exists but cannot be read, and
    /// [`Error::Toml`] if either file is invalid or the merged document does
    /// not match the schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no configuration file");
            return Ok(None);
        }

        let mut table = read_table(path)?;
        let local = local_path(path);
        if local.is_file() {
            let overrides = read_table(&local)?;
            tracing::debug!(
                path = %local.display(),
                keys = overrides.len(),
                "applying local configuration overrides"
            );
            for (key, value) in overrides {
                table.insert(key, value);
            }
        }

        let config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|source| Error::Toml {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            regions = config.regions.len(),
            variations = config.variations.len(),
            "loaded analysis configuration"
        );
        Ok(Some(config))
    }

    /// Parses a configuration from TOML text (no override lookup).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`] if the text is invalid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Toml {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Builds the named variations and the base regions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if two regions or two variations
    /// share a name, and [`Error::UnknownVariation`] if a region chain names
    /// an undefined variation.
    pub fn build(&self) -> Result<Analysis> {
        let mut seen = HashSet::new();
        let mut variations = Vec::with_capacity(self.variations.len());
        for config in &self.variations {
            if !seen.insert(config.name()) {
                return Err(Error::DuplicateName {
                    kind: "variation",
                    name: config.name().to_owned(),
                });
            }
            variations.push(NamedVariation {
                name: config.name().to_owned(),
                variation: config.build(),
            });
        }

        let mut seen = HashSet::new();
        let mut regions = Vec::with_capacity(self.regions.len());
        for config in &self.regions {
            if !seen.insert(config.name.as_str()) {
                return Err(Error::DuplicateName {
                    kind: "region",
                    name: config.name.clone(),
                });
            }
            let mut region = Region::new(
                config.name.clone(),
                config.weight.clone(),
                config.selection.clone(),
                config.label.clone(),
            )
            .with_blinded(config.blinded);
            for name in &config.variations {
                let named = variations
                    .iter()
                    .find(|v| &v.name == name)
                    .ok_or_else(|| Error::UnknownVariation {
                        region: config.name.clone(),
                        variation: name.clone(),
                    })?;
                region = region.varied_with(named.variation.clone());
            }
            regions.push(region);
        }

        Ok(Analysis {
            regions,
            variations,
        })
    }
}

/// `dir/name.toml` → `dir/name.local.toml`
fn local_path(path: &Path) -> PathBuf {
    path.with_extension("local.toml")
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| Error::Toml {
        path: path.to_path_buf(),
        source,
    })
}
