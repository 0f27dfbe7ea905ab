//! Variations: pure, hashable transforms of a weight/selection pair.
//!
//! A variation models a systematic shift or an alternate hypothesis. It is a
//! pure function `(weight, selection) -> (weight', selection')` together with
//! a stable identity.
//!
//! # Identity
//!
//! The identity of a variation is the fingerprint of its concrete type path
//! (defining module + type name) and its declared [`VariationState`]. It is
//! computed when a concrete value is wrapped into an [`AppliedVariation`],
//! from the statically known type, so implementors cannot change how it is
//! derived. They only choose what goes into [`Variation::state`]:
//!
//! - same type + equal state ⇒ exactly the same [`VariationId`]
//! - different state ⇒ a different [`VariationId`]
//!
//! # Example
//!
//! ```
//! use hep_region::expression::{multiplied, Expression};
//! use hep_region::variation::{AppliedVariation, Variation, VariationState};
//!
//! #[derive(Debug)]
//! struct Scaled(f64);
//!
//! impl Variation for Scaled {
//!     fn state(&self) -> VariationState {
//!         VariationState::new().with(self.0)
//!     }
//!
//!     fn apply(
//!         &self,
//!         weight: &Expression,
//!         selection: &Expression,
//!     ) -> hep_region::Result<(Expression, Expression)> {
//!         let factor = Expression::new(self.0.to_string());
//!         Ok((multiplied(weight, &factor), selection.clone()))
//!     }
//! }
//!
//! assert_eq!(AppliedVariation::new(Scaled(2.0)).id(), AppliedVariation::new(Scaled(2.0)).id());
//! assert_ne!(AppliedVariation::new(Scaled(2.0)).id(), AppliedVariation::new(Scaled(0.5)).id());
//! ```

mod builtin;

use core::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{short_type_name, Result};
use crate::expression::Expression;
use crate::fingerprint::{Fingerprint, Fingerprinter};

pub use builtin::{
    Nominal, SelectionReplaced, SelectionTightened, VariableNegated, WeightReplaced, WeightScaled,
};

/// A transform applied to a region's weight and selection.
///
/// Implementations must be immutable values: [`apply`](Variation::apply)
/// may depend only on its arguments and on the fields reported by
/// [`state`](Variation::state).
pub trait Variation: fmt::Debug + Send + Sync {
    /// The parameters that influence [`apply`](Variation::apply).
    ///
    /// Stateless variations keep the default (empty state). Variations with
    /// parameters must list every one of them, otherwise two behaviourally
    /// different instances would share an identity.
    fn state(&self) -> VariationState {
        VariationState::new()
    }

    /// Applies the variation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Variation`](crate::Error::Variation) (or any other
    /// error the implementation chooses) if the operands cannot be varied.
    /// The error reaches the caller of
    /// [`Region::weighted_selection`](crate::Region::weighted_selection)
    /// unchanged.
    fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)>;
}

/// One field of a variation's declared state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer parameter.
    Int(i64),
    /// A floating-point parameter, stored by bit pattern so that equality
    /// and hashing are exact (`0.0` and `-0.0` are distinct).
    Float(u64),
    /// A free-form string parameter.
    Str(String),
    /// An expression parameter.
    Expr(Expression),
}

impl StateValue {
    fn encode(&self, fp: &mut Fingerprinter) {
        match self {
            Self::Bool(v) => fp.u64(0).bool(*v),
            Self::Int(v) => fp.u64(1).i64(*v),
            Self::Float(bits) => fp.u64(2).u64(*bits),
            Self::Str(s) => fp.u64(3).str(s),
            Self::Expr(e) => fp.u64(4).str(e.as_str()),
        };
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value.to_bits())
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Expression> for StateValue {
    fn from(value: Expression) -> Self {
        Self::Expr(value)
    }
}

impl From<&Expression> for StateValue {
    fn from(value: &Expression) -> Self {
        Self::Expr(value.clone())
    }
}

/// The ordered tuple of parameters declared by a variation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VariationState(Vec<StateValue>);

impl VariationState {
    /// The empty state `()`.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a field.
    #[must_use]
    pub fn with(mut self, value: impl Into<StateValue>) -> Self {
        self.0.push(value.into());
        self
    }

    /// The declared fields, in order.
    #[must_use]
    pub fn values(&self) -> &[StateValue] {
        &self.0
    }

    /// Returns `true` for a stateless variation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn encode(&self, fp: &mut Fingerprinter) {
        fp.sequence(self.0.len());
        for value in &self.0 {
            value.encode(fp);
        }
    }
}

/// Stable identity of a variation: `(type path, declared state)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariationId(Fingerprint);

impl VariationId {
    /// Computes the identity of a concrete variation.
    #[must_use]
    pub fn of<V: Variation>(variation: &V) -> Self {
        Self::from_parts(std::any::type_name::<V>(), &variation.state())
    }

    fn from_parts(kind: &str, state: &VariationState) -> Self {
        let mut fp = Fingerprinter::new("hep-region/variation");
        fp.str(kind);
        state.encode(&mut fp);
        Self(fp.finish())
    }

    /// The underlying fingerprint.
    #[inline]
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.0
    }
}

impl fmt::Display for VariationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A concrete variation erased behind `Arc<dyn Variation>`, with its
/// identity fixed at construction.
///
/// Cloning is cheap and shares the underlying immutable variation.
#[derive(Clone)]
pub struct AppliedVariation {
    id: VariationId,
    kind: &'static str,
    inner: Arc<dyn Variation>,
}

impl AppliedVariation {
    /// Wraps a concrete variation, computing its identity from `V` and its
    /// declared state.
    #[must_use]
    pub fn new<V: Variation + 'static>(variation: V) -> Self {
        Self {
            id: VariationId::of(&variation),
            kind: short_type_name::<V>(),
            inner: Arc::new(variation),
        }
    }

    /// The variation's identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> VariationId {
        self.id
    }

    /// Short type name of the concrete variation (e.g. `"WeightScaled"`).
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// The concrete variation's declared state.
    #[must_use]
    pub fn state(&self) -> VariationState {
        self.inner.state()
    }

    /// Applies the wrapped variation.
    ///
    /// # Errors
    ///
    /// Propagates whatever the concrete variation returns.
    pub fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        self.inner.apply(weight, selection)
    }
}

impl fmt::Debug for AppliedVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppliedVariation")
            .field("id", &self.id)
            .field("variation", &self.inner)
            .finish()
    }
}

impl PartialEq for AppliedVariation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AppliedVariation {}

impl Hash for AppliedVariation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::multiplied;

    #[derive(Debug)]
    struct Doubled;

    impl Variation for Doubled {
        fn apply(
            &self,
            weight: &Expression,
            selection: &Expression,
        ) -> Result<(Expression, Expression)> {
            let weight = multiplied(weight, &Expression::new("2"));
            Ok((weight, selection.clone()))
        }
    }

    #[derive(Debug)]
    struct Tripled;

    impl Variation for Tripled {
        fn apply(
            &self,
            weight: &Expression,
            selection: &Expression,
        ) -> Result<(Expression, Expression)> {
            let weight = multiplied(weight, &Expression::new("3"));
            Ok((weight, selection.clone()))
        }
    }

    #[derive(Debug)]
    struct Shifted {
        column: String,
        sigma: i64,
    }

    impl Variation for Shifted {
        fn state(&self) -> VariationState {
            let column = self.column.as_str();
            VariationState::new().with(column).with(self.sigma)
        }

        fn apply(
            &self,
            weight: &Expression,
            selection: &Expression,
        ) -> Result<(Expression, Expression)> {
            let shifted = format!("{}_{}", self.column, self.sigma);
            let selection = selection.as_str().replace(&self.column, &shifted);
            Ok((weight.clone(), Expression::new(selection)))
        }
    }

    fn shifted(column: &str, sigma: i64) -> Shifted {
        Shifted {
            column: column.to_owned(),
            sigma,
        }
    }

    #[test]
    fn test_stateless_instances_share_identity() {
        assert_eq!(VariationId::of(&Doubled), VariationId::of(&Doubled));
        assert!(Doubled.state().is_empty());
    }

    #[test]
    fn test_type_is_part_of_identity() {
        // Both stateless, distinct types
        assert_ne!(VariationId::of(&Doubled), VariationId::of(&Tripled));
    }

    #[test]
    fn test_state_is_part_of_identity() {
        let a = shifted("jet_pt", 1);
        let b = shifted("jet_pt", 1);
        let c = shifted("jet_pt", -1);
        let d = shifted("el_pt", 1);
        assert_eq!(VariationId::of(&a), VariationId::of(&b));
        assert_ne!(VariationId::of(&a), VariationId::of(&c));
        assert_ne!(VariationId::of(&a), VariationId::of(&d));
        assert_ne!(VariationId::of(&c), VariationId::of(&d));
    }

    #[test]
    fn test_declared_state_values() {
        let state = shifted("met", 2).state();
        let expected = [StateValue::Str("met".into()), StateValue::Int(2)];
        assert_eq!(state.values(), expected);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_applied_variation_keeps_identity() {
        let applied = AppliedVariation::new(shifted("met", 2));
        assert_eq!(applied.id(), VariationId::of(&shifted("met", 2)));
        assert_eq!(applied.kind(), "Shifted");
        assert_eq!(applied.state(), shifted("met", 2).state());
        assert_eq!(applied.clone(), applied);
    }

    #[test]
    fn test_applied_variation_delegates() {
        let applied = AppliedVariation::new(Doubled);
        let (w, s) = applied
            .apply(&Expression::new("w"), &Expression::new("s"))
            .unwrap();
        assert_eq!(w.as_str(), "((w) * (2))");
        assert_eq!(s.as_str(), "s");
        assert!(applied.state().is_empty());
    }

    #[test]
    fn test_state_value_kinds_do_not_collide() {
        let as_str = VariationState::new().with("1");
        let as_expr = VariationState::new().with(Expression::new("1"));
        let as_int = VariationState::new().with(1_i64);
        let fp = |state: &VariationState| VariationId::from_parts("k", state);
        let ids = [fp(&as_str), fp(&as_expr), fp(&as_int)];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn test_float_state_is_exact() {
        let a = VariationState::new().with(0.1_f64);
        let b = VariationState::new().with(0.1_f64);
        let c = VariationState::new().with(0.1_f64 + f64::EPSILON);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
