//! Sample program and command execution for the CLI

use crate::{
    config::Config,
    core::{
        annotated, Arg, BoundArguments, Constraint, Dispatcher, Function, Interval, Param,
        Registry, Value,
    },
    error::Result,
};
use anyhow::Context;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Dispatch `argv` against the bundled sample program
#[instrument(skip(config))]
pub fn execute_command(config: &Config, argv: &[String]) -> anyhow::Result<i32> {
    let registry = sample_registry(config).context("Failed to declare sample commands")?;
    let dispatcher = Dispatcher::new(registry, config.clone());
    dispatcher.dispatch(argv)
}

/// Declare the sample command tree
pub fn sample_registry(config: &Config) -> Result<Registry> {
    let mut registry = Registry::from_config(config)?;

    registry.base(&["ops"], "Arithmetic operations.")?;
    registry.cmd(&["ops", "add"], add_command())?;
    registry.cmd(&["ops", "scale"], scale_command())?;
    registry.cmd(&["types"], types_command())?;
    registry.cmd(&["echo"], echo_command())?;

    debug!("Declared {} top-level commands", registry.root().children().len());
    Ok(registry)
}

fn add_command() -> Function {
    Function::new("add", |args: &BoundArguments| {
        let sum = args.get::<i64>("x")? + args.get::<i64>("y")? + args.get::<i64>("z")?;
        println!("{sum}");
        Ok(())
    })
    .doc("Add three integers and print the sum.")
    .param(Param::new("x", Arg::new("int").help("First operand.")))
    .param(Param::new("y", Arg::new("int").help("Second.")))
    .param(Param::new("z", Arg::new("int").help("Third.")).default(100))
}

fn scale_command() -> Function {
    Function::new("scale", |args: &BoundArguments| {
        let factor = args.get::<f64>("factor")?;
        let scaled: Vec<String> = args
            .get::<Vec<f64>>("values")?
            .into_iter()
            .map(|value| Value::Float(value * factor).to_string())
            .collect();
        println!("{}", scaled.join(" "));
        Ok(())
    })
    .doc("Multiply each value by a factor.")
    .param(Param::new(
        "values",
        Arg::new(annotated("list[float]", [Constraint::min_len(1)])).help("Values to scale."),
    ))
    .param(
        Param::new(
            "factor",
            Arg::new(annotated(
                "float",
                [Constraint::interval(Interval::new().gt(0).le(100))],
            ))
            .help("Multiplier in (0, 100]."),
        )
        .default(1.0),
    )
}

fn types_command() -> Function {
    Function::new("types", |args: &BoundArguments| {
        for (name, value) in args.iter() {
            println!("{name}={value}");
        }
        Ok(())
    })
    .doc("Print each argument after coercion.\n\nOne name=value line per flag.")
    .param(Param::new(
        "y",
        Arg::new(annotated("int", [Constraint::gt(10)])).help("An integer above 10."),
    ))
    .param(
        Param::new(
            "z",
            Arg::new(annotated("set[float]", [Constraint::max_len(2)]))
                .help("Up to two distinct floats."),
        )
        .default(Value::set([0.5])),
    )
    .param(Param::new("name", Arg::new("str").help("A string.")).default("world"))
    .param(Param::new("verbose", Arg::new("bool").help("A boolean.")).default(false))
    .param(Param::new("payload", Arg::new("bytes").help("Raw bytes.")).default(Value::bytes("")))
    .param(Param::new("path", Arg::new("Path").help("A filesystem path.")).default(PathBuf::from(".")))
}

fn echo_command() -> Function {
    Function::new("echo", |args: &BoundArguments| {
        let words = args.get::<Vec<String>>("words")?;
        let sep = args.get::<String>("sep")?;
        let mut line = words.join(sep.as_str());
        if args.get::<bool>("upper")? {
            line = line.to_uppercase();
        }
        println!("{line}");
        Ok(())
    })
    .doc("Print words joined by a separator.")
    .param(Param::new("words", Arg::new("tuple[str, ...]").help("Words to print.")))
    .param(Param::new("sep", Arg::new("str").help("Separator.")).default(" "))
    .param(Param::new("upper", Arg::new("bool").help("Uppercase the output.")).default(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{bind, Binding, NodeKind};

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn test_sample_tree() {
        let registry = sample_registry(&Config::default()).unwrap();
        let names: Vec<&str> = registry.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["ops", "types", "echo"]);
        assert_eq!(registry.lookup(&["ops"]).unwrap().kind(), NodeKind::Group);
        assert_eq!(registry.lookup(&["ops", "scale"]).unwrap().kind(), NodeKind::Leaf);
    }

    #[test]
    fn test_sample_declares_in_strict_mode() {
        let config = Config {
            require_declared_groups: true,
            ..Config::default()
        };
        assert!(sample_registry(&config).is_ok());
    }

    #[test]
    fn test_types_defaults() {
        let registry = sample_registry(&Config::default()).unwrap();
        let types = registry.lookup(&["types"]).unwrap();
        let Ok(Binding::Bound(args)) = bind(types, &argv(&["--y", "11"])) else {
            panic!("expected bound arguments");
        };
        assert_eq!(args.get::<String>("name").unwrap(), "world");
        assert!(!args.get::<bool>("verbose").unwrap());
        assert_eq!(args.value("payload").and_then(Value::as_bytes), Some(&b""[..]));
        assert_eq!(args.get::<PathBuf>("path").unwrap(), PathBuf::from("."));
        assert_eq!(args.get::<Vec<f64>>("z").unwrap(), vec![0.5]);
    }

    #[test]
    fn test_scale_bounds() {
        let registry = sample_registry(&Config::default()).unwrap();
        let scale = registry.lookup(&["ops", "scale"]).unwrap();
        assert!(bind(scale, &argv(&["--values", "1", "--factor", "0"])).is_err());
        assert!(bind(scale, &argv(&["--values", "1", "--factor", "100"])).is_ok());
        assert!(bind(scale, &argv(&["--values", "1", "--factor", "100.5"])).is_err());
        assert!(bind(scale, &argv(&["--values"])).is_err());
    }
}
