use clap::{Args, Parser};
use modextract_core::{DEFAULT_OUTPUT_DIR, DEFAULT_SPLIT_SIZE_MB};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOpts {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path of the TOML config file (default: ./modextract.toml when present).",
        value_name = "FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        long,
        help = "Ignore any config file and use the built-in tables.",
        conflicts_with = "config_file",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Extract an Odoo-style module into an annotated content bundle.",
    long_about = "modextract walks a module directory, orders its files by importance and writes \nfour artifacts: a structure listing, an annotated content bundle, a summary and a file index.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  modextract ./addons/sale\n  modextract ~/odoo/addons/stock -o ./dump -v",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(help = "Module root directory to extract.", value_name = "MODULE_PATH")]
    pub module_path: PathBuf,

    #[arg(
        short,
        long,
        help = "Directory that receives the artifacts (created if missing).",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help_heading = "Output"
    )]
    pub output: PathBuf,

    #[arg(
        long,
        help = "Content bundle split size in MB (accepted, not yet applied).",
        value_name = "MB",
        default_value_t = DEFAULT_SPLIT_SIZE_MB,
        help_heading = "Output"
    )]
    pub split_size: u64,

    #[command(flatten)]
    pub config: ConfigOpts,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from(["modextract", "addons/sale"]).unwrap();
        assert_eq!(cli.module_path, PathBuf::from("addons/sale"));
        assert_eq!(cli.output, PathBuf::from("output"));
        assert_eq!(cli.split_size, 10);
        assert!(cli.config.config_file.is_none());
        assert!(!cli.config.no_config);
    }

    #[test]
    fn config_and_no_config_conflict() {
        let result =
            Cli::try_parse_from(["modextract", "m", "--config", "x.toml", "--no-config"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["modextract", "m", "-vv", "-o", "out"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, PathBuf::from("out"));
    }
}
