//! Command implementations for the searchplan CLI

pub mod config;
pub mod plan;
pub mod search;

use clap::Args;
use std::path::PathBuf;

use searchplan_core::{SearchConfig, SearchRequest};

use crate::config::Config;
use crate::error::CliResult;
use crate::overrides::SearchOverrides;

/// Positional databases and search options shared by `search` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query sequence or profile database
    pub query_db: PathBuf,

    /// Target sequence or profile database
    pub target_db: PathBuf,

    /// Alignment result database to create
    pub result_db: PathBuf,

    /// Base directory for temporary files
    pub tmp_dir: PathBuf,

    #[command(flatten)]
    pub overrides: SearchOverrides,
}

/// Layer command-line options over the configuration file.
pub fn build_request(config: &Config, args: SearchArgs) -> CliResult<SearchRequest> {
    let overrides = args.overrides.merge(config.file_overrides());
    let search_config = overrides.apply(SearchConfig::builder())?.build()?;
    log::debug!("{} options set explicitly", search_config.explicit().len());

    Ok(SearchRequest::new(
        args.query_db,
        args.target_db,
        args.result_db,
        args.tmp_dir,
        search_config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchplan_core::OptionId;

    fn args(overrides: SearchOverrides) -> SearchArgs {
        SearchArgs {
            query_db: PathBuf::from("q"),
            target_db: PathBuf::from("t"),
            result_db: PathBuf::from("r"),
            tmp_dir: PathBuf::from("tmp"),
            overrides,
        }
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let mut config = Config::default();
        config.search.sensitivity = Some(2.0);
        config.search.num_iterations = Some(2);

        let request = build_request(
            &config,
            args(SearchOverrides { sensitivity: Some(7.0), ..Default::default() }),
        )
        .unwrap();

        let options = request.config.options();
        assert_eq!(options.sensitivity, 7.0);
        assert_eq!(options.num_iterations, 2);
        assert!(request.config.is_explicit(OptionId::Sensitivity));
        assert!(request.config.is_explicit(OptionId::NumIterations));
        assert_eq!(request.tmp_dir, PathBuf::from("tmp"));
    }

    #[test]
    fn test_invalid_option_is_reported() {
        let err = build_request(
            &Config::default(),
            args(SearchOverrides { num_iterations: Some(0), ..Default::default() }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--num-iterations"));
    }
}
