//! Argument binding
//!
//! Matches raw tokens against a leaf command's flags, coerces each flag's
//! values and runs its validators. Every problem found in one invocation is
//! collected so the caller can report them together.

use crate::core::registry::CommandNode;
use crate::core::signature::ParameterSpec;
use crate::core::types::Value;
use crate::error::{BindError, ValueError};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Coerced and validated arguments, one per parameter, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
}

impl BoundArguments {
    /// Read the argument `name` as `T`
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, ValueError> {
        let value = self
            .value(name)
            .ok_or_else(|| ValueError::Missing(name.to_string()))?;
        T::from_value(value).ok_or_else(|| ValueError::Mismatch {
            name: name.to_string(),
            found: value.kind_name(),
            expected: T::EXPECTED,
        })
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn push(&mut self, name: &str, value: Value) {
        self.values.push((name.to_string(), value));
    }
}

/// Conversion from a bound [`Value`] into a handler's parameter type
pub trait FromValue: Sized {
    /// Type name used in mismatch errors
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "str";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    const EXPECTED: &'static str = "Path";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_path().map(PathBuf::from)
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list, tuple or set";

    fn from_value(value: &Value) -> Option<Self> {
        value.elements()?.iter().map(T::from_value).collect()
    }
}

/// Outcome of a successful bind
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Bound(BoundArguments),
    /// `-h` or `--help` was given
    Help,
}

/// Ends option parsing; later tokens are positional
pub const END_OF_OPTIONS: &str = "--";

pub fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

/// Whether `token` names a flag rather than supplying a value
///
/// Negative numbers such as `-5` or `-0.5` are values.
pub fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token.parse::<f64>().is_err()
}

/// Bind `tokens` to the parameters of the leaf `node`
#[instrument(skip_all, fields(command = %node.path().join(" ")))]
pub fn bind(node: &CommandNode, tokens: &[String]) -> Result<Binding, Vec<BindError>> {
    let (options, positionals) = match tokens.iter().position(|token| token == END_OF_OPTIONS) {
        Some(index) => (&tokens[..index], &tokens[index + 1..]),
        None => (tokens, &tokens[tokens.len()..]),
    };

    if options.iter().any(|token| is_help_flag(token)) {
        debug!("Help requested");
        return Ok(Binding::Help);
    }

    let params = node.params();
    let mut errors = Vec::new();
    let supplied = collect_flags(params, options, &mut errors);
    errors.extend(positionals.iter().map(|token| BindError::UnexpectedArgument {
        token: token.clone(),
    }));

    let mut bound = BoundArguments::default();
    for (param, values) in params.iter().zip(supplied) {
        match values {
            Some(values) => match bind_one(param, &values) {
                Ok(value) => bound.push(param.name(), value),
                Err(error) => errors.push(error),
            },
            None => match param.default() {
                Some(default) => bound.push(param.name(), default.clone()),
                None => errors.push(BindError::MissingFlag {
                    flag: param.flag().to_string(),
                }),
            },
        }
    }

    if errors.is_empty() {
        debug!("Bound {} argument(s)", bound.len());
        Ok(Binding::Bound(bound))
    } else {
        debug!("Binding failed with {} error(s)", errors.len());
        Err(errors)
    }
}

/// Group tokens by flag; the last occurrence of a repeated flag wins
fn collect_flags(
    params: &[ParameterSpec],
    tokens: &[String],
    errors: &mut Vec<BindError>,
) -> Vec<Option<Vec<String>>> {
    let mut supplied: Vec<Option<Vec<String>>> = vec![None; params.len()];
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        if !looks_like_flag(token) {
            errors.push(BindError::UnexpectedArgument {
                token: token.clone(),
            });
            continue;
        }

        let (flag, inline) = match token.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (token.as_str(), None),
        };

        let Some(index) = params.iter().position(|param| param.flag() == flag) else {
            errors.push(BindError::UnknownFlag {
                flag: flag.to_string(),
            });
            while iter.next_if(|next| !looks_like_flag(next)).is_some() {}
            continue;
        };

        let mut values: Vec<String> = inline.into_iter().collect();
        if values.is_empty() {
            while let Some(next) = iter.next_if(|next| !looks_like_flag(next)) {
                values.push(next.clone());
            }
        }
        supplied[index] = Some(values);
    }

    supplied
}

fn bind_one(param: &ParameterSpec, values: &[String]) -> Result<Value, BindError> {
    if !param.arity().accepts(values.len()) {
        return Err(BindError::WrongArity {
            flag: param.flag().to_string(),
            expected: param.arity(),
            found: values.len(),
        });
    }

    let value = param
        .resolved()
        .coerce(values)
        .map_err(|failure| BindError::Coercion {
            flag: param.flag().to_string(),
            token: failure.token,
            tokens: values.to_vec(),
            expected: failure.expected,
        })?;

    param
        .resolved()
        .validate(param.name(), &value)
        .map_err(|violation| BindError::Constraint {
            flag: param.flag().to_string(),
            message: violation.message,
        })?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraint::Constraint;
    use crate::core::registry::Registry;
    use crate::core::resolver::Arity;
    use crate::core::signature::{annotated, Arg, Function, Param};
    use crate::core::types::ScalarKind;

    fn noop(_: &BoundArguments) -> anyhow::Result<()> {
        Ok(())
    }

    fn registry() -> Registry {
        let mut registry = Registry::new().unwrap();
        registry.base(&["ops"], "Arithmetic operations.").unwrap();
        registry
            .cmd(
                &["ops", "add"],
                Function::new("add", noop)
                    .param(Param::new("x", Arg::new("int")))
                    .param(Param::new("y", Arg::new("int").help("Second.")))
                    .param(Param::new("z", Arg::new("int")).default(100)),
            )
            .unwrap();
        registry
            .cmd(
                &["types"],
                Function::new("types", noop)
                    .param(Param::new("y", Arg::new(annotated("int", [Constraint::gt(10)]))))
                    .param(
                        Param::new("z", Arg::new(annotated("set[float]", [Constraint::max_len(2)])))
                            .default(Value::set([0.5])),
                    )
                    .param(Param::new("v", Arg::new("list[int]")).default(Value::list([0])))
                    .param(Param::new("t", Arg::new("tuple[str, ...]")).default(Value::tuple(["a"]))),
            )
            .unwrap();
        registry
    }

    fn argv(tokens: &str) -> Vec<String> {
        tokens.split_whitespace().map(str::to_string).collect()
    }

    fn bind_at(path: &[&str], tokens: &str) -> Result<Binding, Vec<BindError>> {
        let registry = registry();
        let node = registry.lookup(path).unwrap();
        bind(node, &argv(tokens))
    }

    fn bound(path: &[&str], tokens: &str) -> BoundArguments {
        match bind_at(path, tokens) {
            Ok(Binding::Bound(args)) => args,
            other => panic!("expected bound arguments, got {other:?}"),
        }
    }

    fn errors(path: &[&str], tokens: &str) -> Vec<BindError> {
        bind_at(path, tokens).unwrap_err()
    }

    #[test]
    fn test_ops_add_defaults() {
        let args = bound(&["ops", "add"], "--x 2 --y 4");
        assert_eq!(args.len(), 3);
        let (x, y, z): (i64, i64, i64) = (args.get("x").unwrap(), args.get("y").unwrap(), args.get("z").unwrap());
        assert_eq!((x, y, z), (2, 4, 100));
        assert_eq!(x + y + z, 106);

        let args = bound(&["ops", "add"], "--x 2 --y 4 --z 4");
        let sum: i64 = ["x", "y", "z"].iter().map(|n| args.get::<i64>(n).unwrap()).sum();
        assert_eq!(sum, 10);
    }

    #[test]
    fn test_bound_order_follows_declaration() {
        let args = bound(&["ops", "add"], "--z 1 --y 2 --x 3");
        let names: Vec<&str> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn test_missing_required_flag() {
        let errs = errors(&["ops", "add"], "--x 2");
        assert_eq!(errs, [BindError::MissingFlag { flag: "--y".into() }]);
    }

    #[test]
    fn test_gt_constraint_scenario() {
        let errs = errors(&["types"], "--y 5");
        assert_eq!(errs.len(), 1);
        let message = errs[0].to_string();
        assert!(message.contains("y must be > 10"), "{message}");
        assert!(message.contains("got 5"), "{message}");
        assert_eq!(errs[0].flag(), Some("--y"));

        let args = bound(&["types"], "--y 11");
        assert_eq!(args.get::<i64>("y").unwrap(), 11);
    }

    #[test]
    fn test_max_len_scenario() {
        let errs = errors(&["types"], "--y 11 --z 1.0 2.0 3.0");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].to_string().contains("at most 2 elements, got 3"));

        let args = bound(&["types"], "--y 11 --z 1.0 2.0");
        assert_eq!(args.get::<Vec<f64>>("z").unwrap(), vec![1.0, 2.0]);
        let args = bound(&["types"], "--y 11 --z 1.0");
        assert_eq!(args.value("z"), Some(&Value::set([1.0])));
    }

    #[test]
    fn test_container_sizes_and_order() {
        let args = bound(&["types"], "--y 11 --v 3 1 2 --t c a b --z 2 2 2");
        assert_eq!(args.get::<Vec<i64>>("v").unwrap(), vec![3, 1, 2]);
        assert_eq!(args.value("t"), Some(&Value::tuple(["c", "a", "b"])));
        assert_eq!(args.value("z").and_then(Value::size), Some(1));
    }

    #[test]
    fn test_negative_numbers_are_values() {
        let args = bound(&["ops", "add"], "--x -2 --y -0 --z -100");
        assert_eq!(args.get::<i64>("x").unwrap(), -2);
        assert_eq!(args.get::<i64>("z").unwrap(), -100);
    }

    #[test]
    fn test_inline_values() {
        let args = bound(&["ops", "add"], "--x=7 --y=-1");
        assert_eq!(args.get::<i64>("x").unwrap(), 7);
        assert_eq!(args.get::<i64>("y").unwrap(), -1);
    }

    #[test]
    fn test_repeated_flag_last_wins() {
        let args = bound(&["ops", "add"], "--x 1 --y 1 --x 5");
        assert_eq!(args.get::<i64>("x").unwrap(), 5);
    }

    #[test]
    fn test_all_errors_collected() {
        let errs = errors(&["ops", "add"], "--x two --q 1 stray --z");
        assert!(errs.contains(&BindError::UnknownFlag { flag: "--q".into() }));
        assert!(errs.contains(&BindError::UnexpectedArgument { token: "stray".into() }));
        assert!(errs.contains(&BindError::Coercion {
            flag: "--x".into(),
            token: "two".into(),
            tokens: vec!["two".into()],
            expected: ScalarKind::Int,
        }));
        assert!(errs.contains(&BindError::MissingFlag { flag: "--y".into() }));
        assert!(errs.contains(&BindError::WrongArity {
            flag: "--z".into(),
            expected: Arity::Exactly(1),
            found: 0,
        }));
        assert_eq!(errs.len(), 5);
    }

    #[test]
    fn test_wrong_arity() {
        let errs = errors(&["ops", "add"], "--x 1 2 --y 3");
        assert_eq!(
            errs,
            [BindError::WrongArity {
                flag: "--x".into(),
                expected: Arity::Exactly(1),
                found: 2,
            }]
        );

        let errs = errors(&["types"], "--y 11 --v");
        assert_eq!(errs[0].to_string(), "argument --v: expected at least 1 value, got 0");
    }

    #[test]
    fn test_help_short_circuits() {
        assert_eq!(bind_at(&["ops", "add"], "--bogus -h"), Ok(Binding::Help));
        assert_eq!(bind_at(&["ops", "add"], "--help"), Ok(Binding::Help));
    }

    #[test]
    fn test_value_errors() {
        let args = bound(&["ops", "add"], "--x 1 --y 2");
        assert_eq!(args.get::<i64>("w"), Err(ValueError::Missing("w".into())));
        assert!(matches!(args.get::<String>("x"), Err(ValueError::Mismatch { .. })));
        assert_eq!(args.get::<f64>("x").unwrap(), 1.0);
    }

    #[test]
    fn test_double_dash_ends_options() {
        let args = bound(&["ops", "add"], "--x 1 --y 2 --");
        assert_eq!(args.get::<i64>("y").unwrap(), 2);

        let errs = errors(&["ops", "add"], "--x 1 -- --y 2");
        assert!(errs.contains(&BindError::UnexpectedArgument { token: "--y".into() }));
        assert!(errs.contains(&BindError::UnexpectedArgument { token: "2".into() }));
        assert!(errs.contains(&BindError::MissingFlag { flag: "--y".into() }));
        assert!(!errs.iter().any(|e| matches!(e, BindError::UnknownFlag { .. })));

        let errs = errors(&["ops", "add"], "--x 1 --y 2 -- -h");
        assert_eq!(errs, [BindError::UnexpectedArgument { token: "-h".into() }]);
    }

    #[test]
    fn test_flag_detection() {
        assert!(looks_like_flag("--x"));
        assert!(looks_like_flag("-v"));
        assert!(!looks_like_flag("-"));
        assert!(!looks_like_flag("-5"));
        assert!(!looks_like_flag("-1e3"));
        assert!(!looks_like_flag("value"));
    }
}
