use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use profile_api::config::Variant;

use crate::PROFILE_VERSION;

#[derive(Parser, Debug)]
#[clap(version = PROFILE_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Warn)]
    pub verbosity: LevelFilter,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Named profile presets
#[derive(clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProfileVariant {
    /// Shared dataset only
    Basic,
    /// Shared dataset plus a scratch volume on every worker
    Scratch,
}

impl From<ProfileVariant> for Variant {
    fn from(variant: ProfileVariant) -> Self {
        match variant {
            ProfileVariant::Basic => Variant::Basic,
            ProfileVariant::Scratch => Variant::Scratch,
        }
    }
}

/// Where the profile request comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileSource {
    /// Path to a profile configuration file
    #[clap(index = 1)]
    pub config: Option<PathBuf>,

    /// Parameter value, as NAME=VALUE; may be repeated and overrides the configuration file
    #[clap(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Profile preset to use instead of the one in the configuration file
    #[clap(long, value_enum)]
    pub variant: Option<ProfileVariant>,

    /// Path to save an eventual fatal error
    #[clap(short, long)]
    pub error: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the request RSpec
    Generate {
        #[clap(flatten)]
        source: ProfileSource,

        /// Path to save the generated RSpec; printed to stdout when omitted
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Bind and validate the profile parameters without generating anything
    Validate {
        #[clap(flatten)]
        source: ProfileSource,
    },

    /// Print the parameters accepted by a profile variant
    Parameters {
        /// Profile preset to describe
        #[clap(long, value_enum, default_value = "basic")]
        variant: ProfileVariant,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Validate { .. } => "validate",
            Commands::Parameters { .. } => "parameters",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "nfs-profile",
            "generate",
            "profile.yaml",
            "-p",
            "num_nodes=3",
            "--param",
            "agree=true",
            "--variant",
            "scratch",
            "-o",
            "out.xml",
        ])
        .unwrap();

        assert_eq!(cli.verbosity, LevelFilter::Warn);
        match cli.command {
            Commands::Generate { source, output } => {
                assert_eq!(source.config, Some(PathBuf::from("profile.yaml")));
                assert_eq!(source.params, vec!["num_nodes=3", "agree=true"]);
                assert_eq!(source.variant, Some(ProfileVariant::Scratch));
                assert_eq!(source.error, None);
                assert_eq!(output, Some(PathBuf::from("out.xml")));
            }
            other => panic!("unexpected command: {other}"),
        }
    }

    #[test]
    fn test_parse_parameters() {
        let cli = Cli::try_parse_from(["nfs-profile", "-v", "debug", "parameters"]).unwrap();
        assert_eq!(cli.verbosity, LevelFilter::Debug);
        assert!(matches!(
            cli.command,
            Commands::Parameters {
                variant: ProfileVariant::Basic
            }
        ));
        assert_eq!(cli.command.to_string(), "parameters");
    }
}
