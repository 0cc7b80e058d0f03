//! Core command engine
//!
//! Declaration (signature introspection, type resolution, registry) and
//! invocation (binding, dispatch) of annotated command functions.

pub mod binder;
pub mod constraint;
pub mod dispatcher;
pub mod registry;
pub mod resolver;
pub mod signature;
pub mod types;

pub use binder::{bind, Binding, BoundArguments, FromValue};
pub use constraint::{Cardinality, Constraint, Interval, NumericBound, Relation};
pub use dispatcher::Dispatcher;
pub use registry::{CommandNode, NodeKind, Registry};
pub use resolver::{resolve, Arity, ResolvedType};
pub use signature::{
    annotated, Annotation, Arg, Function, Handler, Introspector, Param, ParameterSpec, Signature,
    TypeHint, TypeSpec,
};
pub use types::{ContainerKind, Number, ScalarKind, Shape, TypeParser, Value};
