//! Analysis regions with ordered, hashable variation chains.
//!
//! A [`Region`] pairs an event weight with a selection. Systematic shifts and
//! alternate hypotheses are modelled as [`Variation`]s, pure transforms of
//! the `(weight, selection)` pair. Regions are immutable values:
//! [`Region::varied`] returns a new region with one more variation at the end
//! of its chain, and [`Region::weighted_selection`] folds the chain left to
//! right and combines the result into one expression.
//!
//! # Entry Point
//!
//! ```
//! use hep_region::{Region, WeightScaled};
//! use hep_region::expression::{multiplied, Expression};
//!
//! let region = Region::new("signal", "w", "s", "Signal region");
//! let doubled = region.varied(WeightScaled::new("2"));
//!
//! assert_eq!(
//!     doubled.weighted_selection()?,
//!     multiplied(&Expression::new("((w) * (2))"), &Expression::new("s")),
//! );
//! assert_eq!(region.weighted_selection()?.as_str(), "((w) * (s))");
//! # Ok::<(), hep_region::Error>(())
//! ```
//!
//! # Identity
//!
//! Regions and variations carry stable identities suitable as cache keys:
//!
//! - [`VariationId`]: fingerprint of the concrete variation type and its
//!   declared [`VariationState`].
//! - [`RegionKey`]: fingerprint of weight, selection, and the ordered
//!   variation identities. Name, label, and the blinded flag are excluded.
//!
//! # Configuration
//!
//! [`config::AnalysisConfig`] reads region and variation definitions from
//! TOML, and [`sweep::Sweep`] folds every region × variation branch.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod error;
pub mod expression;
pub mod fingerprint;
pub mod region;
pub mod sweep;
pub mod variation;

pub use error::{Error, Result};
pub use expression::Expression;
pub use fingerprint::Fingerprint;
pub use region::{Region, RegionKey};
pub use variation::{
    AppliedVariation, Nominal, SelectionReplaced, SelectionTightened, StateValue, VariableNegated,
    Variation, VariationId, VariationState, WeightReplaced, WeightScaled,
};
