//! Constraint metadata attached to parameter types
//!
//! Numeric constraints bound each value (or each element of a container).
//! Cardinality constraints bound the size of a collection or string.

use crate::core::types::Number;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A predicate a coerced value must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    Gt(Number),
    Ge(Number),
    Lt(Number),
    Le(Number),
    Interval(Interval),
    MinLen(usize),
    MaxLen(usize),
    /// Exact length
    Len(usize),
}

impl Constraint {
    pub fn gt(bound: impl Into<Number>) -> Self {
        Self::Gt(bound.into())
    }

    pub fn ge(bound: impl Into<Number>) -> Self {
        Self::Ge(bound.into())
    }

    pub fn lt(bound: impl Into<Number>) -> Self {
        Self::Lt(bound.into())
    }

    pub fn le(bound: impl Into<Number>) -> Self {
        Self::Le(bound.into())
    }

    pub const fn interval(interval: Interval) -> Self {
        Self::Interval(interval)
    }

    pub const fn min_len(min: usize) -> Self {
        Self::MinLen(min)
    }

    pub const fn max_len(max: usize) -> Self {
        Self::MaxLen(max)
    }

    pub const fn len(len: usize) -> Self {
        Self::Len(len)
    }

    /// Whether this constraint compares values against a numeric bound
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Gt(_) | Self::Ge(_) | Self::Lt(_) | Self::Le(_) | Self::Interval(_)
        )
    }

    /// Numeric bounds in checking order (lower before upper for intervals)
    pub fn bounds(&self) -> Vec<NumericBound> {
        match *self {
            Self::Gt(bound) => vec![NumericBound::new(Relation::Gt, bound)],
            Self::Ge(bound) => vec![NumericBound::new(Relation::Ge, bound)],
            Self::Lt(bound) => vec![NumericBound::new(Relation::Lt, bound)],
            Self::Le(bound) => vec![NumericBound::new(Relation::Le, bound)],
            Self::Interval(interval) => interval.bounds(),
            Self::MinLen(_) | Self::MaxLen(_) | Self::Len(_) => Vec::new(),
        }
    }

    /// Size bound for cardinality constraints
    pub const fn cardinality(&self) -> Option<Cardinality> {
        match *self {
            Self::MinLen(n) => Some(Cardinality::AtLeast(n)),
            Self::MaxLen(n) => Some(Cardinality::AtMost(n)),
            Self::Len(n) => Some(Cardinality::Exactly(n)),
            _ => None,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gt(bound) => write!(f, "Gt({bound})"),
            Self::Ge(bound) => write!(f, "Ge({bound})"),
            Self::Lt(bound) => write!(f, "Lt({bound})"),
            Self::Le(bound) => write!(f, "Le({bound})"),
            Self::Interval(interval) => write!(f, "{interval}"),
            Self::MinLen(n) => write!(f, "MinLen({n})"),
            Self::MaxLen(n) => write!(f, "MaxLen({n})"),
            Self::Len(n) => write!(f, "Len({n})"),
        }
    }
}

/// Numeric range with optional exclusive or inclusive ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub gt: Option<Number>,
    pub ge: Option<Number>,
    pub lt: Option<Number>,
    pub le: Option<Number>,
}

impl Interval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, bound: impl Into<Number>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    pub fn ge(mut self, bound: impl Into<Number>) -> Self {
        self.ge = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<Number>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    pub fn le(mut self, bound: impl Into<Number>) -> Self {
        self.le = Some(bound.into());
        self
    }

    fn bounds(&self) -> Vec<NumericBound> {
        [
            self.gt.map(|b| NumericBound::new(Relation::Gt, b)),
            self.ge.map(|b| NumericBound::new(Relation::Ge, b)),
            self.lt.map(|b| NumericBound::new(Relation::Lt, b)),
            self.le.map(|b| NumericBound::new(Relation::Le, b)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [("gt", self.gt), ("ge", self.ge), ("lt", self.lt), ("le", self.le)]
            .into_iter()
            .filter_map(|(name, bound)| bound.map(|b| format!("{name}={b}")))
            .collect();
        write!(f, "Interval({})", parts.join(", "))
    }
}

/// Ordering relation between a value and a bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Relation {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    pub const fn is_lower(self) -> bool {
        matches!(self, Self::Gt | Self::Ge)
    }

    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Gt | Self::Lt)
    }

    /// NaN satisfies no relation.
    pub fn holds(self, value: Number, bound: Number) -> bool {
        match (self, value.partial_cmp(&bound)) {
            (_, None) => false,
            (Self::Gt, Some(ord)) => ord == Ordering::Greater,
            (Self::Ge, Some(ord)) => ord != Ordering::Less,
            (Self::Lt, Some(ord)) => ord == Ordering::Less,
            (Self::Le, Some(ord)) => ord != Ordering::Greater,
        }
    }
}

/// One side of a numeric constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBound {
    pub relation: Relation,
    pub bound: Number,
}

impl NumericBound {
    pub const fn new(relation: Relation, bound: Number) -> Self {
        Self { relation, bound }
    }

    pub fn admits(&self, value: Number) -> bool {
        self.relation.holds(value, self.bound)
    }
}

impl fmt::Display for NumericBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.relation.symbol(), self.bound)
    }
}

/// Size bound of a collection or string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    AtLeast(usize),
    AtMost(usize),
    Exactly(usize),
}

impl Cardinality {
    pub const fn admits(self, size: usize) -> bool {
        match self {
            Self::AtLeast(n) => size >= n,
            Self::AtMost(n) => size <= n,
            Self::Exactly(n) => size == n,
        }
    }

    /// Inclusive (min, max) range this bound allows
    pub const fn range(self) -> (usize, Option<usize>) {
        match self {
            Self::AtLeast(n) => (n, None),
            Self::AtMost(n) => (0, Some(n)),
            Self::Exactly(n) => (n, Some(n)),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(n) => write!(f, "at least {n}"),
            Self::AtMost(n) => write!(f, "at most {n}"),
            Self::Exactly(n) => write!(f, "exactly {n}"),
        }
    }
}
