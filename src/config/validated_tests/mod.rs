//! Tests for validated configuration.

use super::ConfigError;
use super::cli::Cli;
use super::toml::TomlConfig;
use super::validated::ValidatedConfig;

/// Builds CLI args for the `check` command.
fn cli(args: &[&str]) -> Cli {
    let mut full_args = vec!["devconf", "check"];
    full_args.extend(args);
    Cli::parse_from_iter(full_args)
}

fn toml(content: &str) -> TomlConfig {
    TomlConfig::parse(content).unwrap()
}

mod loading_tests;
