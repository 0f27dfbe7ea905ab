//! String expressions for event weights and selections.
//!
//! An [`Expression`] is an immutable piece of expression text such as
//! `"mc_weight * pileup_weight"` or `"n_jets >= 2 && met > 50"`. Expressions
//! are compared and hashed by their exact text, which makes them usable as
//! part of a cache key.
//!
//! The binary combinators wrap both operands in parentheses so that operator
//! precedence inside either operand can never leak into the combination:
//!
//! ```
//! use hep_region::expression::{multiplied, Expression};
//!
//! let w = Expression::new("x + y > 8");
//! let s = Expression::new("3 < (z - y)**2");
//! assert_eq!(multiplied(&w, &s).as_str(), "((x + y > 8) * (3 < (z - y)**2))");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An immutable weight or selection expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    /// Wraps expression text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The neutral weight / always-true selection, `1`.
    #[must_use]
    pub fn one() -> Self {
        Self::new("1")
    }

    /// The expression text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Expression {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for Expression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[allow(clippy::unwrap_used)] // literal pattern
fn identifier_regex() -> &'static Regex {
    const PATTERN: &str = r"[A-Za-z_]\w*";
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| Regex::new(PATTERN).unwrap())
}

/// Returns `true` if `text` is a bare identifier (`[A-Za-z_]\w*`).
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    identifier_regex()
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

/// Identifier matches in `text` that name properties, not function calls.
///
/// An identifier directly followed (after optional whitespace) by `(` is a
/// function name and is skipped.
fn property_matches(text: &str) -> impl Iterator<Item = regex::Match<'_>> {
    identifier_regex()
        .find_iter(text)
        .filter(move |m| !text[m.end()..].trim_start().starts_with('('))
}

/// Rewrites C-style logical operators into the element-wise form used by
/// columnar evaluators: `!` → `~`, `&&` → `&`, `||` → `|`.
#[must_use]
pub fn normalized(expression: &Expression) -> Expression {
    Expression::new(
        expression
            .as_str()
            .replace('!', "~")
            .replace("&&", "&")
            .replace("||", "|"),
    )
}

/// The set of properties (data columns) needed to evaluate `expression`.
///
/// ```
/// use hep_region::expression::{properties, Expression};
///
/// let props = properties(&Expression::new("electron_pt > sqrt(x * x)"));
/// assert_eq!(props.into_iter().collect::<Vec<_>>(), ["electron_pt", "x"]);
/// ```
#[must_use]
pub fn properties(expression: &Expression) -> BTreeSet<String> {
    property_matches(expression.as_str())
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Logical negation of the whole expression.
#[must_use]
pub fn negated(expression: &Expression) -> Expression {
    Expression::new(format!("!({expression})"))
}

/// Negates every occurrence of the property `variable` inside `expression`.
///
/// Only whole identifiers match: negating `particle_is_e` leaves
/// `particle_is_el` untouched.
#[must_use]
pub fn variable_negated(expression: &Expression, variable: &str) -> Expression {
    let text = expression.as_str();
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for m in property_matches(text).filter(|m| m.as_str() == variable) {
        out.push_str(&text[last..m.start()]);
        out.push_str("!(");
        out.push_str(m.as_str());
        out.push(')');
        last = m.end();
    }
    out.push_str(&text[last..]);
    Expression::new(out)
}

fn combined(left: &Expression, right: &Expression, operator: &str) -> Expression {
    Expression::new(format!("(({left}) {operator} ({right}))"))
}

/// `((left) + (right))`
#[must_use]
pub fn added(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "+")
}

/// `((left) - (right))`
#[must_use]
pub fn subtracted(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "-")
}

/// `((left) * (right))`
///
/// This is the combination used to turn a region's final weight and
/// selection into one evaluable expression.
#[must_use]
pub fn multiplied(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "*")
}

/// `((left) / (right))`
#[must_use]
pub fn divided(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "/")
}

/// `((left) // (right))`
#[must_use]
pub fn floor_divided(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "//")
}

/// `((left) && (right))`
#[must_use]
pub fn anded(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "&&")
}

/// `((left) || (right))`
#[must_use]
pub fn ored(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "||")
}

/// `((left) ^ (right))`
#[must_use]
pub fn xored(left: &Expression, right: &Expression) -> Expression {
    combined(left, right, "^")
}
