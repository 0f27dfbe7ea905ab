//! Region × variation sweeps.
//!
//! A sweep branches every base region once per variation, the way a
//! systematics loop does, and folds each branch. Branches that are logically
//! identical (same [`RegionKey`]) are folded only once, which is exactly the
//! property a persistent result cache relies on.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{Analysis, NamedVariation};
use crate::error::Result;
use crate::expression::Expression;
use crate::region::{Region, RegionKey};

/// One folded point of a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepEntry {
    /// Base region name.
    pub region: String,
    /// Variation name, or `None` for the nominal (unvaried) entry.
    pub variation: Option<String>,
    /// Whether the region is blinded.
    pub blinded: bool,
    /// Cache key of the varied region.
    pub key: RegionKey,
    /// The folded weighted selection.
    pub expression: Expression,
}

#[derive(Debug, Clone)]
struct Point {
    variation: Option<String>,
    region: Region,
}

/// The full set of branches for a list of regions and variations.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    points: Vec<Point>,
}

impl Sweep {
    /// Branches each region into its nominal entry plus one entry per
    /// variation, in input order.
    #[must_use]
    pub fn new(regions: &[Region], variations: &[NamedVariation]) -> Self {
        let mut points = Vec::with_capacity(regions.len() * (variations.len() + 1));
        for region in regions {
            points.push(Point {
                variation: None,
                region: region.clone(),
            });
            for named in variations {
                points.push(Point {
                    variation: Some(named.name.clone()),
                    region: region.varied_with(named.variation.clone()),
                });
            }
        }
        Self { points }
    }

    /// Sweep over everything an [`Analysis`] defines.
    #[must_use]
    pub fn of_analysis(analysis: &Analysis) -> Self {
        Self::new(&analysis.regions, &analysis.variations)
    }

    /// Number of branches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if there are no branches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The varied regions, in sweep order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.points.iter().map(|p| &p.region)
    }

    /// Number of logically distinct branches.
    #[must_use]
    pub fn distinct_keys(&self) -> usize {
        let mut keys: Vec<RegionKey> = self.regions().map(Region::key).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// Folds every branch, reusing the result for branches with equal keys.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a variation.
    pub fn evaluate(&self) -> Result<Vec<SweepEntry>> {
        let mut folded: HashMap<RegionKey, Expression> = HashMap::new();
        let mut entries = Vec::with_capacity(self.points.len());
        for point in &self.points {
            let key = point.region.key();
            let expression = match folded.get(&key) {
                Some(expression) => {
                    tracing::debug!(
                        region = point.region.name(),
                        %key,
                        "reusing folded expression"
                    );
                    expression.clone()
                }
                None => {
                    let expression = point.region.weighted_selection()?;
                    folded.insert(key, expression.clone());
                    expression
                }
            };
            entries.push(SweepEntry {
                region: point.region.name().to_owned(),
                variation: point.variation.clone(),
                blinded: point.region.blinded(),
                key,
                expression,
            });
        }
        tracing::info!(
            branches = entries.len(),
            distinct = folded.len(),
            "evaluated sweep"
        );
        Ok(entries)
    }
}
