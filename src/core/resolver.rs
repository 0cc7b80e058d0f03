//! Type resolution
//!
//! Maps a declared shape and its constraints to a coercion routine and an
//! ordered validator chain. Resolution happens once, when a parameter is
//! declared, and every invocation reuses the result.

use crate::core::constraint::{Cardinality, Constraint, NumericBound, Relation};
use crate::core::types::{Number, ScalarKind, Shape, Value};
use crate::error::{DeclarationError, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Converts one raw token into a scalar value
pub type Coercer = fn(&str) -> std::result::Result<Value, String>;

/// Number of values a flag consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(1) => f.write_str("1 value"),
            Self::Exactly(n) => write!(f, "{n} values"),
            Self::AtLeast(1) => f.write_str("at least 1 value"),
            Self::AtLeast(n) => write!(f, "at least {n} values"),
        }
    }
}

/// A token that failed coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    pub token: String,
    pub expected: ScalarKind,
    pub reason: String,
}

/// A value that failed one of its constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Check {
    /// Applied to a scalar, or to every element of a container
    Bound(NumericBound),
    /// Applied to the collection size, or to the length of a string
    Size(Cardinality),
}

/// Coercer and validators compiled for one declared parameter
#[derive(Debug, Clone)]
pub struct ResolvedType {
    shape: Shape,
    coercer: Coercer,
    checks: Vec<Check>,
}

impl ResolvedType {
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    pub const fn arity(&self) -> Arity {
        match self.shape {
            Shape::Scalar(_) => Arity::Exactly(1),
            Shape::Container(..) => Arity::AtLeast(1),
        }
    }

    /// Coerce raw tokens into a value of the resolved shape
    pub fn coerce(&self, tokens: &[String]) -> std::result::Result<Value, CoercionFailure> {
        let coerce_one = |token: &String| {
            (self.coercer)(token).map_err(|reason| CoercionFailure {
                token: token.clone(),
                expected: self.shape.element(),
                reason,
            })
        };

        match self.shape {
            Shape::Scalar(kind) => match tokens {
                [token] => coerce_one(token),
                _ => Err(CoercionFailure {
                    token: tokens.join(" "),
                    expected: kind,
                    reason: format!("expected a single value, got {}", tokens.len()),
                }),
            },
            Shape::Container(container, _) => {
                let elements = tokens.iter().map(coerce_one).collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(container.collect(elements))
            }
        }
    }

    /// Run the validators in declaration order, stopping at the first failure
    pub fn validate(&self, name: &str, value: &Value) -> std::result::Result<(), ConstraintViolation> {
        for check in &self.checks {
            match check {
                Check::Bound(bound) => self.check_bound(name, bound, value)?,
                Check::Size(cardinality) => self.check_size(*cardinality, value)?,
            }
        }
        Ok(())
    }

    fn check_bound(
        &self,
        name: &str,
        bound: &NumericBound,
        value: &Value,
    ) -> std::result::Result<(), ConstraintViolation> {
        let (subject, items) = match value.elements() {
            Some(items) => (format!("each element of {name}"), items),
            None => (name.to_string(), std::slice::from_ref(value)),
        };

        for item in items {
            let admitted = item.as_number().is_some_and(|n| bound.admits(n));
            if !admitted {
                return Err(ConstraintViolation {
                    message: format!("{subject} must be {bound}, got {item}"),
                });
            }
        }
        Ok(())
    }

    fn check_size(&self, cardinality: Cardinality, value: &Value) -> std::result::Result<(), ConstraintViolation> {
        let size = value.size().unwrap_or(0);
        if cardinality.admits(size) {
            return Ok(());
        }

        let unit = match self.shape {
            Shape::Scalar(ScalarKind::Bytes) => "bytes",
            Shape::Scalar(_) => "characters",
            Shape::Container(..) => "elements",
        };
        Err(ConstraintViolation {
            message: format!("Expected {cardinality} {unit}, got {size}"),
        })
    }
}

/// Coercion routine for a scalar kind
pub fn scalar_coercer(kind: ScalarKind) -> Coercer {
    match kind {
        ScalarKind::Int => coerce_int,
        ScalarKind::Float => coerce_float,
        ScalarKind::Str => coerce_str,
        ScalarKind::Bool => coerce_bool,
        ScalarKind::Bytes => coerce_bytes,
        ScalarKind::Path => coerce_path,
    }
}

fn coerce_int(token: &str) -> std::result::Result<Value, String> {
    token.trim().parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
}

fn coerce_float(token: &str) -> std::result::Result<Value, String> {
    token.trim().parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
}

fn coerce_str(token: &str) -> std::result::Result<Value, String> {
    Ok(Value::Str(token.to_string()))
}

fn coerce_bool(token: &str) -> std::result::Result<Value, String> {
    match token.to_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "0" => Ok(Value::Bool(false)),
        _ => Err(format!("invalid boolean value: {token}")),
    }
}

fn coerce_bytes(token: &str) -> std::result::Result<Value, String> {
    Ok(Value::Bytes(token.as_bytes().to_vec()))
}

fn coerce_path(token: &str) -> std::result::Result<Value, String> {
    Ok(Value::Path(PathBuf::from(token)))
}

/// Resolve the shape and constraints declared for parameter `param`
pub fn resolve(param: &str, shape: Shape, constraints: &[Constraint]) -> Result<ResolvedType> {
    let mut checks = Vec::with_capacity(constraints.len());

    for constraint in constraints {
        if constraint.is_numeric() {
            if !shape.element().is_numeric() {
                return Err(DeclarationError::constraint(
                    param,
                    format!("`{constraint}` is only valid with `int` or `float` values, not {shape}"),
                ));
            }
            if let Constraint::Interval(interval) = constraint {
                if interval.gt.is_some() && interval.ge.is_some() {
                    return Err(DeclarationError::constraint(
                        param,
                        "Interval cannot have both 'gt' and 'ge' specified",
                    ));
                }
                if interval.lt.is_some() && interval.le.is_some() {
                    return Err(DeclarationError::constraint(
                        param,
                        "Interval cannot have both 'lt' and 'le' specified",
                    ));
                }
            }
            let bounds = constraint.bounds();
            if let Some(bad) = bounds.iter().find(|b| !b.bound.as_f64().is_finite()) {
                return Err(DeclarationError::constraint(
                    param,
                    format!("`{constraint}` has a non-finite bound ({})", bad.bound),
                ));
            }
            checks.extend(bounds.into_iter().map(Check::Bound));
        } else if let Some(cardinality) = constraint.cardinality() {
            let sized = shape.is_container() || shape.element().is_sized();
            if !sized {
                return Err(DeclarationError::constraint(
                    param,
                    format!("`{constraint}` can only be used with list, tuple, set, str or bytes types, not {shape}"),
                ));
            }
            checks.push(Check::Size(cardinality));
        }
    }

    check_satisfiable(param, shape.element(), &checks)?;

    debug!(
        "Resolved '{}' as {} with {} check(s)",
        param,
        shape,
        checks.len()
    );

    Ok(ResolvedType {
        shape,
        coercer: scalar_coercer(shape.element()),
        checks,
    })
}

/// Reject constraint sets that no value can satisfy
fn check_satisfiable(param: &str, kind: ScalarKind, checks: &[Check]) -> Result<()> {
    let bounds: Vec<&NumericBound> = checks
        .iter()
        .filter_map(|check| match check {
            Check::Bound(bound) => Some(bound),
            Check::Size(_) => None,
        })
        .collect();

    for lower in bounds.iter().filter(|b| b.relation.is_lower()) {
        for upper in bounds.iter().filter(|b| !b.relation.is_lower()) {
            if kind == ScalarKind::Int {
                let (low, high) = (integer_bound(lower), integer_bound(upper));
                if matches!(low.partial_cmp(&high), Some(std::cmp::Ordering::Greater) | None) {
                    return Err(DeclarationError::constraint(
                        param,
                        format!("no int value can be {lower} and {upper}"),
                    ));
                }
                continue;
            }

            let empty = match lower.bound.partial_cmp(&upper.bound) {
                Some(std::cmp::Ordering::Greater) | None => true,
                Some(std::cmp::Ordering::Equal) => lower.relation.is_strict() || upper.relation.is_strict(),
                Some(std::cmp::Ordering::Less) => false,
            };
            if empty {
                return Err(DeclarationError::constraint(
                    param,
                    format!("no value can be {lower} and {upper}"),
                ));
            }
        }
    }

    let mut min = 0usize;
    let mut max: Option<usize> = None;
    for check in checks {
        if let Check::Size(cardinality) = check {
            let (lo, hi) = cardinality.range();
            min = min.max(lo);
            max = match (max, hi) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
    }
    if let Some(max) = max {
        if min > max {
            return Err(DeclarationError::constraint(
                param,
                format!("length constraints are contradictory (at least {min}, at most {max})"),
            ));
        }
    }

    Ok(())
}

/// Tighten a bound to the inclusive integer it admits, e.g. `> 0.5` becomes `>= 1`
fn integer_bound(bound: &NumericBound) -> Number {
    match (bound.relation, bound.bound) {
        (Relation::Gt, Number::Int(n)) => Number::Int(n.saturating_add(1)),
        (Relation::Lt, Number::Int(n)) => Number::Int(n.saturating_sub(1)),
        (Relation::Ge | Relation::Le, Number::Int(n)) => Number::Int(n),
        (Relation::Gt, Number::Float(k)) => Number::Float(k.floor() + 1.0),
        (Relation::Ge, Number::Float(k)) => Number::Float(k.ceil()),
        (Relation::Lt, Number::Float(k)) => Number::Float(k.ceil() - 1.0),
        (Relation::Le, Number::Float(k)) => Number::Float(k.floor()),
    }
}
