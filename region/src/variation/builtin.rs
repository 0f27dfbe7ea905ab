//! Concrete variations covering the common systematic patterns.

use super::{Variation, VariationState};
use crate::error::{Error, Result};
use crate::expression::{anded, is_identifier, multiplied, variable_negated, Expression};

/// Leaves weight and selection untouched.
///
/// Useful as the explicit "nominal" entry of a systematic list. A region
/// varied by `Nominal` folds to the same expression as the base region but
/// has a different key, since the chain differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nominal;

impl Variation for Nominal {
    fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        Ok((weight.clone(), selection.clone()))
    }
}

/// Multiplies the weight by a scale-factor expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightScaled {
    factor: Expression,
}

impl WeightScaled {
    /// Scale the weight by `factor`.
    #[must_use]
    pub fn new(factor: impl Into<Expression>) -> Self {
        Self {
            factor: factor.into(),
        }
    }

    /// The scale-factor expression.
    #[must_use]
    pub fn factor(&self) -> &Expression {
        &self.factor
    }
}

impl Variation for WeightScaled {
    fn state(&self) -> VariationState {
        VariationState::new().with(&self.factor)
    }

    fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        Ok((multiplied(weight, &self.factor), selection.clone()))
    }
}

/// Replaces the weight outright, e.g. with an alternate generator weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightReplaced {
    weight: Expression,
}

impl WeightReplaced {
    /// Replace the weight with `weight`.
    #[must_use]
    pub fn new(weight: impl Into<Expression>) -> Self {
        Self {
            weight: weight.into(),
        }
    }
}

impl Variation for WeightReplaced {
    fn state(&self) -> VariationState {
        VariationState::new().with(&self.weight)
    }

    fn apply(
        &self,
        _weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        Ok((self.weight.clone(), selection.clone()))
    }
}

/// ANDs an additional cut onto the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTightened {
    cut: Expression,
}

impl SelectionTightened {
    /// Require `cut` in addition to the existing selection.
    #[must_use]
    pub fn new(cut: impl Into<Expression>) -> Self {
        Self { cut: cut.into() }
    }
}

impl Variation for SelectionTightened {
    fn state(&self) -> VariationState {
        VariationState::new().with(&self.cut)
    }

    fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        Ok((weight.clone(), anded(selection, &self.cut)))
    }
}

/// Replaces the selection outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionReplaced {
    selection: Expression,
}

impl SelectionReplaced {
    /// Replace the selection with `selection`.
    #[must_use]
    pub fn new(selection: impl Into<Expression>) -> Self {
        Self {
            selection: selection.into(),
        }
    }
}

impl Variation for SelectionReplaced {
    fn state(&self) -> VariationState {
        VariationState::new().with(&self.selection)
    }

    fn apply(
        &self,
        weight: &Expression,
        _selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        Ok((weight.clone(), self.selection.clone()))
    }
}

/// Negates one boolean property wherever it appears in the selection.
///
/// This turns e.g. an isolated-lepton signal region into its
/// anti-isolated control region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNegated {
    variable: String,
}

impl VariableNegated {
    /// Negate the property `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Variation for VariableNegated {
    fn state(&self) -> VariationState {
        VariationState::new().with(self.variable.as_str())
    }

    fn apply(
        &self,
        weight: &Expression,
        selection: &Expression,
    ) -> Result<(Expression, Expression)> {
        if !is_identifier(&self.variable) {
            let reason = format!("'{}' is not a property name", self.variable);
            return Err(Error::variation::<Self>(reason));
        }
        let selection = variable_negated(selection, &self.variable);
        Ok((weight.clone(), selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::VariationId;

    fn operands() -> (Expression, Expression) {
        (Expression::new("w"), Expression::new("is_iso && pt > 25"))
    }

    #[test]
    fn test_nominal_is_identity() {
        let (w, s) = operands();
        assert_eq!(Nominal.apply(&w, &s).unwrap(), (w, s));
    }

    #[test]
    fn test_weight_scaled() {
        let (w, s) = operands();
        let (vw, vs) = WeightScaled::new("sf_up").apply(&w, &s).unwrap();
        assert_eq!(vw.as_str(), "((w) * (sf_up))");
        assert_eq!(vs, s);
    }

    #[test]
    fn test_weight_replaced() {
        let (w, s) = operands();
        let (vw, vs) = WeightReplaced::new("alt_weight").apply(&w, &s).unwrap();
        assert_eq!(vw.as_str(), "alt_weight");
        assert_eq!(vs, s);
    }

    #[test]
    fn test_selection_tightened() {
        let (w, s) = operands();
        let tightened = SelectionTightened::new("n_jets >= 2");
        let (vw, vs) = tightened.apply(&w, &s).unwrap();
        assert_eq!(vw, w);
        assert_eq!(vs.as_str(), "((is_iso && pt > 25) && (n_jets >= 2))");
    }

    #[test]
    fn test_selection_replaced() {
        let (w, s) = operands();
        let (vw, vs) = SelectionReplaced::new("1").apply(&w, &s).unwrap();
        assert_eq!(vw, w);
        assert_eq!(vs, Expression::one());
    }

    #[test]
    fn test_variable_negated() {
        let (w, s) = operands();
        let (_, vs) = VariableNegated::new("is_iso").apply(&w, &s).unwrap();
        assert_eq!(vs.as_str(), "!(is_iso) && pt > 25");
    }

    #[test]
    fn test_variable_negated_rejects_non_identifier() {
        let (w, s) = operands();
        let err = VariableNegated::new("pt > 25").apply(&w, &s).unwrap_err();
        assert_eq!(
            err.to_string(),
            "variation VariableNegated failed: 'pt > 25' is not a property name"
        );
    }

    #[test]
    fn test_builtin_identities() {
        assert_eq!(
            VariationId::of(&WeightScaled::new("a")),
            VariationId::of(&WeightScaled::new("a"))
        );
        assert_ne!(
            VariationId::of(&WeightScaled::new("a")),
            VariationId::of(&WeightScaled::new("b"))
        );
        // Same parameter, different behaviour
        assert_ne!(
            VariationId::of(&WeightScaled::new("a")),
            VariationId::of(&WeightReplaced::new("a"))
        );
        assert_ne!(
            VariationId::of(&SelectionTightened::new("a")),
            VariationId::of(&SelectionReplaced::new("a"))
        );
    }
}
