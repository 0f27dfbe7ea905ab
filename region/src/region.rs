//! Regions: a weight, a selection, and an ordered chain of variations.
//!
//! A [`Region`] is an immutable value. [`Region::varied`] never touches the
//! receiver; it returns a new region whose chain is the receiver's chain plus
//! one trailing variation. A single base region can therefore be branched
//! into a whole tree of systematic variants:
//!
//! ```
//! use hep_region::{Region, WeightScaled, SelectionTightened};
//!
//! let signal = Region::new("signal", "w", "s", "Signal region");
//! let up = signal.varied(WeightScaled::new("sf_up"));
//! let down = signal.varied(WeightScaled::new("sf_down"));
//! let tight_up = up.varied(SelectionTightened::new("met > 50"));
//!
//! assert!(signal.variations().is_empty());
//! assert_eq!(up.variations().len(), 1);
//! assert_eq!(down.variations().len(), 1);
//! assert_eq!(tight_up.variations().len(), 2);
//! assert_ne!(up.key(), down.key());
//! ```
//!
//! # Identity
//!
//! Equality, `Hash`, and [`Region::key`] consider only the weight, the
//! selection, and the ordered variation identities. The name, label, and
//! blinded flag are display metadata. Two regions with the same variations
//! in a different order are different regions.

use core::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::Result;
use crate::expression::{multiplied, Expression};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::variation::{AppliedVariation, Variation};

/// Stable cache key of a region: fingerprint of `(weight, selection, variations)`.
///
/// Serializes as the full 64-character hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionKey(Fingerprint);

impl RegionKey {
    /// The underlying fingerprint.
    #[inline]
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A named selection and weight in which processes are evaluated.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    weight: Expression,
    selection: Expression,
    label: String,
    blinded: bool,
    variations: Vec<AppliedVariation>,
}

impl Region {
    /// Creates an unblinded region with no variations.
    ///
    /// `weight` and `selection` may be neutral (see [`Expression::one`]).
    /// Nothing is validated here; expression well-formedness is the concern
    /// of whoever evaluates the folded expression.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        weight: impl Into<Expression>,
        selection: impl Into<Expression>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            weight: weight.into(),
            selection: selection.into(),
            label: label.into(),
            blinded: false,
            variations: Vec::new(),
        }
    }

    /// Sets the blinded flag. Meant for construction; the flag is metadata
    /// and does not affect identity.
    #[must_use]
    pub fn with_blinded(mut self, blinded: bool) -> Self {
        self.blinded = blinded;
        self
    }

    /// The region name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the region is marked as blinded.
    #[inline]
    #[must_use]
    pub const fn blinded(&self) -> bool {
        self.blinded
    }

    /// The base weight, before any variation.
    #[inline]
    #[must_use]
    pub const fn weight(&self) -> &Expression {
        &self.weight
    }

    /// The base selection, before any variation.
    #[inline]
    #[must_use]
    pub const fn selection(&self) -> &Expression {
        &self.selection
    }

    /// The variation chain, in application order.
    #[inline]
    #[must_use]
    pub fn variations(&self) -> &[AppliedVariation] {
        &self.variations
    }

    /// Returns a copy of this region with `variation` appended to its chain.
    ///
    /// `self` is left unmodified and can be branched again.
    #[must_use]
    pub fn varied<V: Variation + 'static>(&self, variation: V) -> Self {
        self.varied_with(AppliedVariation::new(variation))
    }

    /// Like [`varied`](Region::varied), for an already wrapped variation.
    #[must_use]
    pub fn varied_with(&self, variation: AppliedVariation) -> Self {
        tracing::trace!(
            region = %self.name,
            variation = variation.kind(),
            id = %variation.id(),
            depth = self.variations.len() + 1,
            "deriving varied region"
        );
        let mut variations = Vec::with_capacity(self.variations.len() + 1);
        variations.extend(self.variations.iter().cloned());
        variations.push(variation);
        Self {
            name: self.name.clone(),
            weight: self.weight.clone(),
            selection: self.selection.clone(),
            label: self.label.clone(),
            blinded: self.blinded,
            variations,
        }
    }

    /// The weight and selection after applying every variation in order.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a variation, unchanged.
    pub fn varied_operands(&self) -> Result<(Expression, Expression)> {
        let mut weight = self.weight.clone();
        let mut selection = self.selection.clone();
        for variation in &self.variations {
            (weight, selection) = variation.apply(&weight, &selection)?;
        }
        Ok((weight, selection))
    }

    /// The combined weighted-selection expression, after applying all
    /// variations left to right.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a variation, unchanged.
    pub fn weighted_selection(&self) -> Result<Expression> {
        let (weight, selection) = self.varied_operands()?;
        let combined = multiplied(&weight, &selection);
        tracing::debug!(
            region = %self.name,
            variations = self.variations.len(),
            expression = %combined,
            "folded weighted selection"
        );
        Ok(combined)
    }

    /// Stable cache key over `(weight, selection, variations)`.
    ///
    /// Unlike the `Hash` impl, the key does not depend on the hasher and is
    /// identical across processes running the same build. See
    /// [`fingerprint`](crate::fingerprint) for what can change it between
    /// builds.
    #[must_use]
    pub fn key(&self) -> RegionKey {
        let mut fp = Fingerprinter::new("hep-region/region");
        fp.str(self.weight.as_str()).str(self.selection.as_str());
        fp.sequence(self.variations.len());
        for variation in &self.variations {
            fp.fingerprint(variation.id().fingerprint());
        }
        RegionKey(fp.finish())
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
            && self.selection == other.selection
            && self.variations == other.variations
    }
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.weight.hash(state);
        self.selection.hash(state);
        self.variations.hash(state);
    }
}
