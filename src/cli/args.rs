//! Command-line argument parsing for the launcher

use clap::Parser;

/// sigflag - run commands declared from annotated function signatures
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "sigflag")]
pub struct Args {
    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Program name shown in usage and error messages
    #[arg(long, default_value = "sigflag")]
    pub prog: String,

    /// Require parent groups to be declared before nested commands
    #[arg(long)]
    pub strict_groups: bool,

    /// Report only the first argument error
    #[arg(long)]
    pub first_error_only: bool,

    /// Text shown under the top-level usage line
    #[arg(long, default_value = "Run the bundled sample commands.")]
    pub description: String,

    /// Text appended to the top-level help
    #[arg(long)]
    pub epilog: Option<String>,

    /// Command path and flags handed to the dispatcher
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub argv: Vec<String>,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = Args::try_parse_from(["sigflag", "ops", "add"]).unwrap();
        assert!(!args.debug);
        assert_eq!(args.prog, "sigflag");
        assert_eq!(args.argv, ["ops", "add"]);
    }

    #[test]
    fn test_parse_launcher_flags() {
        let args = Args::try_parse_from([
            "sigflag",
            "--debug",
            "--prog",
            "calc",
            "--strict-groups",
            "--first-error-only",
            "types",
        ])
        .unwrap();
        assert!(args.debug);
        assert_eq!(args.prog, "calc");
        assert!(args.strict_groups);
        assert!(args.first_error_only);
        assert_eq!(args.argv, ["types"]);
    }

    #[test]
    fn test_parse_help_text_flags() {
        let args = Args::try_parse_from([
            "sigflag",
            "--epilog",
            "See the manual.",
            "--description",
            "",
        ])
        .unwrap();
        assert_eq!(args.epilog.as_deref(), Some("See the manual."));
        assert_eq!(args.description, "");

        let args = Args::try_parse_from(["sigflag"]).unwrap();
        assert_eq!(args.description, "Run the bundled sample commands.");
        assert!(args.epilog.is_none());
    }

    #[test]
    fn test_command_flags_pass_through() {
        let args =
            Args::try_parse_from(["sigflag", "ops", "add", "--x", "-2", "--y=4", "--help"]).unwrap();
        assert_eq!(args.argv, ["ops", "add", "--x", "-2", "--y=4", "--help"]);
        assert!(!args.debug);
    }

    #[test]
    fn test_empty_argv() {
        let args = Args::try_parse_from(["sigflag"]).unwrap();
        assert!(args.argv.is_empty());
    }
}
