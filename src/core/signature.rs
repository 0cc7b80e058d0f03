//! Function declarations and signature introspection
//!
//! A [`Function`] describes a command body together with its parameter list.
//! The [`Introspector`] turns each parameter into a [`ParameterSpec`]: the
//! flag name, the resolved type, help text and default.
//!
//! ```
//! use sigflag::core::{annotated, Arg, Constraint, Function, Param};
//!
//! let add = Function::new("add", |args| {
//!     let x: i64 = args.get("x")?;
//!     let y: i64 = args.get("y")?;
//!     println!("{}", x + y);
//!     Ok(())
//! })
//! .doc("Add two numbers.")
//! .param(Param::new("x", Arg::new("int")))
//! .param(Param::new("y", Arg::new(annotated("int", [Constraint::gt(0)])).help("Second.")).default(1));
//! # let _ = add;
//! ```

use crate::core::binder::BoundArguments;
use crate::core::constraint::Constraint;
use crate::core::resolver::{self, Arity, ResolvedType};
use crate::core::types::{Shape, TypeParser, Value};
use crate::error::{DeclarationError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

/// Body of a leaf command
pub type Handler = Box<dyn Fn(&BoundArguments) -> anyhow::Result<()>>;

/// Base of a declared type: an expression to parse or an explicit shape
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Expr(String),
    Shape(Shape),
}

impl From<&str> for TypeSpec {
    fn from(expr: &str) -> Self {
        Self::Expr(expr.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(expr: String) -> Self {
        Self::Expr(expr)
    }
}

impl From<Shape> for TypeSpec {
    fn from(shape: Shape) -> Self {
        Self::Shape(shape)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => f.write_str(expr),
            Self::Shape(shape) => write!(f, "{shape}"),
        }
    }
}

/// A declared type plus any constraint metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TypeHint {
    pub base: TypeSpec,
    pub metadata: Vec<Constraint>,
}

impl TypeHint {
    pub fn new(base: impl Into<TypeSpec>) -> Self {
        Self {
            base: base.into(),
            metadata: Vec::new(),
        }
    }

    /// Attach one more constraint
    #[must_use]
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.metadata.push(constraint);
        self
    }
}

impl From<&str> for TypeHint {
    fn from(expr: &str) -> Self {
        Self::new(expr)
    }
}

impl From<String> for TypeHint {
    fn from(expr: String) -> Self {
        Self::new(expr)
    }
}

impl From<Shape> for TypeHint {
    fn from(shape: Shape) -> Self {
        Self::new(shape)
    }
}

/// `Annotated[base, constraints...]`
pub fn annotated(base: impl Into<TypeSpec>, metadata: impl IntoIterator<Item = Constraint>) -> TypeHint {
    TypeHint {
        base: base.into(),
        metadata: metadata.into_iter().collect(),
    }
}

/// Flag marker: opts a parameter into command-line binding
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub hint: TypeHint,
    pub help: String,
}

impl Arg {
    pub fn new(hint: impl Into<TypeHint>) -> Self {
        Self {
            hint: hint.into(),
            help: String::new(),
        }
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// How a parameter was annotated
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Arg(Arg),
    /// A plain type without the flag marker; never bindable
    Bare(String),
}

/// One declared function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Annotation,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>, arg: Arg) -> Self {
        Self {
            name: name.into(),
            annotation: Annotation::Arg(arg),
            default: None,
        }
    }

    pub fn bare(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: Annotation::Bare(type_name.into()),
            default: None,
        }
    }

    /// Give the parameter a default, which makes its flag optional
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A function to expose as a leaf command
pub struct Function {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<Param>,
    pub handler: Handler,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&BoundArguments) -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            handler: Box::new(handler),
        }
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A parameter turned into a flag
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    flag: String,
    resolved: ResolvedType,
    constraints: Vec<Constraint>,
    help: String,
    default: Option<Value>,
}

impl ParameterSpec {
    /// Build a spec directly, resolving its type and checking its default
    pub fn new(
        name: impl Into<String>,
        shape: Shape,
        constraints: Vec<Constraint>,
        help: impl Into<String>,
        default: Option<Value>,
    ) -> Result<Self> {
        let name = name.into();
        let resolved = resolver::resolve(&name, shape, &constraints)?;

        let default = match default {
            Some(value) => {
                let found = value.kind_name();
                let value = value.conform(shape).ok_or_else(|| {
                    DeclarationError::invalid_default(&name, format!("expected {shape}, got {found}"))
                })?;
                resolved
                    .validate(&name, &value)
                    .map_err(|violation| DeclarationError::invalid_default(&name, violation.message))?;
                Some(value)
            }
            None => None,
        };

        Ok(Self {
            flag: format!("--{name}"),
            name,
            resolved,
            constraints,
            help: help.into(),
            default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Long-form flag, `--<name>`
    pub fn flag(&self) -> &str {
        &self.flag
    }

    pub const fn shape(&self) -> Shape {
        self.resolved.shape()
    }

    pub const fn arity(&self) -> Arity {
        self.resolved.arity()
    }

    pub const fn resolved(&self) -> &ResolvedType {
        &self.resolved
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Parameter specs and help text extracted from a function
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<ParameterSpec>,
    pub help: String,
}

/// Extracts typed parameter specifications from function declarations
pub struct Introspector {
    types: TypeParser,
    re_name: Regex,
}

impl Introspector {
    /// Create a new introspector
    pub fn new() -> Result<Self> {
        Ok(Self {
            types: TypeParser::new()?,
            re_name: Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$")
                .map_err(|e| DeclarationError::config(format!("Failed to compile regex: {e}")))?,
        })
    }

    /// Produce the ordered parameter specs and help text of `function`
    #[instrument(skip(self, function), fields(function = %function.name))]
    pub fn introspect(&self, function: &Function) -> Result<Signature> {
        let mut params = Vec::with_capacity(function.params.len());

        for param in &function.params {
            let arg = match &param.annotation {
                Annotation::Arg(arg) => arg,
                Annotation::Bare(_) => {
                    return Err(DeclarationError::not_bindable(&function.name, &param.name));
                }
            };
            self.check_name(&param.name)?;

            let shape = match &arg.hint.base {
                TypeSpec::Expr(expr) => self.types.parse(&param.name, expr)?,
                TypeSpec::Shape(shape) => *shape,
            };

            let spec = ParameterSpec::new(
                param.name.clone(),
                shape,
                arg.hint.metadata.clone(),
                arg.help.clone(),
                param.default.clone(),
            )?;
            debug!(
                "Parameter {} -> {} ({})",
                spec.name(),
                spec.shape(),
                if spec.is_required() { "required" } else { "optional" }
            );
            params.push(spec);
        }

        self.check_params(&function.name, &params)?;
        Ok(Signature {
            params,
            help: function.doc.clone().unwrap_or_default(),
        })
    }

    /// Check that every flag name is valid and unique within `owner`
    pub fn check_params(&self, owner: &str, params: &[ParameterSpec]) -> Result<()> {
        let mut seen = HashSet::new();
        for param in params {
            self.check_name(param.name())?;
            if !seen.insert(param.name()) {
                return Err(DeclarationError::invalid_name(
                    param.name(),
                    format!("duplicate parameter in '{owner}'"),
                ));
            }
        }
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if !self.re_name.is_match(name) {
            return Err(DeclarationError::invalid_name(
                name,
                "parameter names must start with a letter or underscore",
            ));
        }
        if name == "h" || name == "help" {
            return Err(DeclarationError::invalid_name(name, "conflicts with the help flag"));
        }
        Ok(())
    }
}
