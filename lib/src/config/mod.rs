use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Configuration for the lexer compiler.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Minimize every DFA after subset construction.
    pub minimize: bool,
    /// Policy for choosing the accept code when more than one rule matches
    /// the same longest prefix.
    pub tie_break: TieBreak,
}

/// Decides which rule wins when several rules match the same longest prefix.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The rule with the greatest accept code wins.
    #[default]
    HighestCode,
    /// The rule declared first wins, regardless of its accept code.
    FirstDeclared,
}

impl Default for Config {
    fn default() -> Config {
        Config { minimize: true, tie_break: TieBreak::default() }
    }
}

/// Load config file from a given path. Path must contain a valid TOML file or
/// this function will propagate the error. Settings that are missing from the
/// file keep their default values.
pub fn load_config_from_file(
    config_file: &Path,
) -> Result<Config, figment::Error> {
    let config: Config =
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file_exact(config_file))
            .extract()?;
    Ok(config)
}
