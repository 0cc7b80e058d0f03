//! Declared parameter shapes and runtime values
//!
//! A parameter is either a scalar or a homogeneous container of scalars.
//! Shapes can be built directly or parsed from type expressions such as
//! `int`, `list[float]` or `Tuple[int, ...]`.

use crate::error::{DeclarationError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base kind of a scalar value or of a container's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Int,
    Float,
    Str,
    Bool,
    Bytes,
    Path,
}

impl ScalarKind {
    /// Canonical type name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::Path => "Path",
        }
    }

    /// Whether ordering constraints apply to this kind
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Whether length constraints apply to a scalar of this kind
    pub const fn is_sized(self) -> bool {
        matches!(self, Self::Str | Self::Bytes)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "bool" => Some(Self::Bool),
            "bytes" => Some(Self::Bytes),
            "Path" | "path" | "pathlib.Path" => Some(Self::Path),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of collection built from a variable number of tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    List,
    Tuple,
    Set,
}

impl ContainerKind {
    /// Canonical type name
    pub const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "list" | "List" | "typing.List" => Some(Self::List),
            "tuple" | "Tuple" | "typing.Tuple" => Some(Self::Tuple),
            "set" | "Set" | "typing.Set" => Some(Self::Set),
            _ => None,
        }
    }

    /// Wrap already coerced elements, collapsing duplicates for sets
    pub fn collect(self, elements: Vec<Value>) -> Value {
        match self {
            Self::List => Value::List(elements),
            Self::Tuple => Value::Tuple(elements),
            Self::Set => {
                let mut unique: Vec<Value> = Vec::with_capacity(elements.len());
                for element in elements {
                    if !unique.contains(&element) {
                        unique.push(element);
                    }
                }
                Value::Set(unique)
            }
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved shape of a declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Scalar(ScalarKind),
    Container(ContainerKind, ScalarKind),
}

impl Shape {
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    pub const fn list(element: ScalarKind) -> Self {
        Self::Container(ContainerKind::List, element)
    }

    pub const fn tuple(element: ScalarKind) -> Self {
        Self::Container(ContainerKind::Tuple, element)
    }

    pub const fn set(element: ScalarKind) -> Self {
        Self::Container(ContainerKind::Set, element)
    }

    /// The scalar kind of the value, or of each element for containers
    pub const fn element(&self) -> ScalarKind {
        match self {
            Self::Scalar(kind) | Self::Container(_, kind) => *kind,
        }
    }

    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Container(..))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Container(ContainerKind::Tuple, kind) => write!(f, "tuple[{kind}, ...]"),
            Self::Container(container, kind) => write!(f, "{container}[{kind}]"),
        }
    }
}

/// Numeric bound carried by ordering constraints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A coerced command-line value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Path(PathBuf),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Unique elements in first-seen order
    Set(Vec<Value>),
}

impl Value {
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ContainerKind::Set.collect(items.into_iter().map(Into::into).collect())
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Short name of the value's kind, used in error messages
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::Path(_) => "Path",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Int(value) => Some(Number::Int(*value)),
            Self::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Elements of a list, tuple or set
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Size used by length constraints: elements, characters or bytes
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Str(text) => Some(text.chars().count()),
            Self::Bytes(data) => Some(data.len()),
            other => other.elements().map(<[Value]>::len),
        }
    }

    /// Reshape a declared default so that it matches `shape`
    ///
    /// Integers are promoted for float shapes and container defaults are
    /// re-wrapped into the declared container kind.
    pub fn conform(self, shape: Shape) -> Option<Value> {
        match shape {
            Shape::Scalar(kind) => self.conform_scalar(kind),
            Shape::Container(container, kind) => {
                let items = match self {
                    Self::List(items) | Self::Tuple(items) | Self::Set(items) => items,
                    _ => return None,
                };
                let items = items
                    .into_iter()
                    .map(|item| item.conform_scalar(kind))
                    .collect::<Option<Vec<_>>>()?;
                Some(container.collect(items))
            }
        }
    }

    fn conform_scalar(self, kind: ScalarKind) -> Option<Value> {
        match (kind, self) {
            (ScalarKind::Int, value @ Self::Int(_))
            | (ScalarKind::Float, value @ Self::Float(_))
            | (ScalarKind::Str, value @ Self::Str(_))
            | (ScalarKind::Bool, value @ Self::Bool(_))
            | (ScalarKind::Bytes, value @ Self::Bytes(_))
            | (ScalarKind::Path, value @ Self::Path(_)) => Some(value),
            (ScalarKind::Float, Self::Int(value)) => Some(Self::Float(value as f64)),
            (ScalarKind::Path, Self::Str(text)) => Some(Self::Path(PathBuf::from(text))),
            (ScalarKind::Bytes, Self::Str(text)) => Some(Self::Bytes(text.into_bytes())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(close)
        }

        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(text) => f.write_str(text),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Bytes(data) => f.write_str(&String::from_utf8_lossy(data)),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::List(items) => join(f, items, "[", "]"),
            Self::Tuple(items) => join(f, items, "(", ")"),
            Self::Set(items) => join(f, items, "{", "}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

/// Parser for type expressions such as `int` or `set[float]`
pub struct TypeParser {
    /// Regex for `name` or `name[args]`
    re_type: Regex,
    /// Regex for a bare dotted identifier
    re_ident: Regex,
}

impl TypeParser {
    /// Create a new type expression parser
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_type: Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\[(.*)\])?\s*$")
                .map_err(|e| DeclarationError::config(format!("Failed to compile regex: {e}")))?,
            re_ident: Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$")
                .map_err(|e| DeclarationError::config(format!("Failed to compile regex: {e}")))?,
        })
    }

    /// Parse the declared type of parameter `param`
    pub fn parse(&self, param: &str, expr: &str) -> Result<Shape> {
        let unsupported = |reason: String| DeclarationError::unsupported_type(param, expr, reason);

        let caps = self
            .re_type
            .captures(expr)
            .ok_or_else(|| unsupported("not a type expression".to_string()))?;
        let name = caps.get(1).map_or("", |m| m.as_str());
        let args = caps.get(2).map(|m| m.as_str());

        let shape = match (ContainerKind::from_name(name), ScalarKind::from_name(name), args) {
            (Some(container), _, None) => {
                return Err(unsupported(format!(
                    "{container} argument '{param}' must specify an element type (e.g., {container}[int])"
                )));
            }
            (Some(container), _, Some(args)) => {
                let element = self.parse_elements(container, args).map_err(unsupported)?;
                Shape::Container(container, element)
            }
            (None, Some(kind), None) => Shape::Scalar(kind),
            (None, Some(kind), Some(_)) => {
                return Err(unsupported(format!("{kind} does not take type parameters")));
            }
            (None, None, _) => {
                return Err(unsupported(format!("no registered handler for type '{name}'")));
            }
        };

        debug!("Parsed type '{}' for '{}' as {}", expr, param, shape);
        Ok(shape)
    }

    fn parse_elements(&self, container: ContainerKind, args: &str) -> std::result::Result<ScalarKind, String> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(format!("{container} has an empty element type"));
        }

        let first = parts[0];
        let element = match ScalarKind::from_name(first) {
            Some(kind) => kind,
            None if first.contains('[') => {
                return Err(format!("nested containers are not supported ({first})"));
            }
            None if self.re_ident.is_match(first) => {
                return Err(format!("no registered handler for {container} element type: {first}"));
            }
            None => return Err(format!("invalid element type '{first}'")),
        };

        match container {
            ContainerKind::List | ContainerKind::Set if parts.len() > 1 => {
                Err(format!("{container} takes exactly one element type"))
            }
            ContainerKind::Tuple if parts.len() == 2 && parts[1] == "..." => Ok(element),
            _ if parts.iter().any(|part| *part != first) => {
                Err(format!("{container} must have homogeneous elements"))
            }
            _ => Ok(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(expr: &str) -> Result<Shape> {
        TypeParser::new().unwrap().parse("x", expr)
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("int").unwrap(), Shape::Scalar(ScalarKind::Int));
        assert_eq!(parse(" float ").unwrap(), Shape::Scalar(ScalarKind::Float));
        assert_eq!(parse("pathlib.Path").unwrap(), Shape::Scalar(ScalarKind::Path));
        assert_eq!(parse("bytes").unwrap(), Shape::Scalar(ScalarKind::Bytes));
    }

    #[test]
    fn test_parse_containers_and_aliases() {
        assert_eq!(parse("list[int]").unwrap(), Shape::list(ScalarKind::Int));
        assert_eq!(parse("List[str]").unwrap(), Shape::list(ScalarKind::Str));
        assert_eq!(parse("Set[float]").unwrap(), Shape::set(ScalarKind::Float));
        assert_eq!(parse("tuple[int, ...]").unwrap(), Shape::tuple(ScalarKind::Int));
        assert_eq!(parse("Tuple[bool, bool, bool]").unwrap(), Shape::tuple(ScalarKind::Bool));
    }

    #[test]
    fn test_parse_rejects_unsupported() {
        for expr in [
            "dict",
            "list",
            "int[str]",
            "list[list[int]]",
            "tuple[int, str]",
            "list[dict]",
            "set[int, int]",
            "list[]",
            "3int",
        ] {
            let err = parse(expr).unwrap_err();
            assert!(
                matches!(err, DeclarationError::UnsupportedType { .. }),
                "{expr} should be unsupported, got {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_element_type_message() {
        let err = parse("list").unwrap_err();
        assert!(err.to_string().contains("must specify an element type"));
    }

    #[test]
    fn test_set_collapses_duplicates_in_order() {
        let value = Value::set([2.0, 1.0, 2.0]);
        assert_eq!(value, Value::Set(vec![Value::Float(2.0), Value::Float(1.0)]));
        assert_eq!(value.to_string(), "{2.0, 1.0}");
    }

    #[test]
    fn test_conform_defaults() {
        let shape = Shape::Scalar(ScalarKind::Float);
        assert_eq!(Value::Int(1).conform(shape), Some(Value::Float(1.0)));
        assert_eq!(Value::from("x").conform(shape), None);

        let shape = Shape::set(ScalarKind::Int);
        assert_eq!(
            Value::list([1, 1, 2]).conform(shape),
            Some(Value::Set(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(Value::Int(1).conform(shape), None);
    }

    #[test]
    fn test_number_ordering_mixed() {
        assert!(Number::Int(11) > Number::Int(10));
        assert!(Number::Float(10.5) > Number::Int(10));
        assert_eq!(Number::Float(f64::NAN).partial_cmp(&Number::Int(1)), None);
        assert_eq!(Number::Int(10).to_string(), "10");
        assert_eq!(Number::Float(2.0).to_string(), "2.0");
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::list(ScalarKind::Int).to_string(), "list[int]");
        assert_eq!(Shape::tuple(ScalarKind::Float).to_string(), "tuple[float, ...]");
    }
}
