//! Plan command implementation - emit the execution plan as JSON without running it

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use searchplan_core::{ExecutionPlan, Planner, SingleWorker};

use super::{build_request, SearchArgs};
use crate::config::Config;
use crate::error::{CliError, CliResult};

pub fn execute(config: &Config, args: SearchArgs, output: Option<PathBuf>) -> Result<()> {
    let request = build_request(config, args)?;
    let planner = Planner::new(config.planner_settings());
    let plan = planner.plan(&request, &SingleWorker).map_err(CliError::from)?;

    let json = render_plan(&plan)?;
    match output {
        Some(path) => {
            write_plan(&path, &json)?;
            log::info!("Plan written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn render_plan(plan: &ExecutionPlan) -> Result<String> {
    serde_json::to_string_pretty(plan).context("Failed to serialize execution plan")
}

fn write_plan(path: &Path, json: &str) -> CliResult<()> {
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::SearchOverrides;
    use searchplan_core::dbtype::write_dbtype;
    use searchplan_core::SequenceKind;
    use tempfile::TempDir;

    #[test]
    fn test_plan_written_as_json() -> Result<()> {
        let dir = TempDir::new()?;
        write_dbtype(&dir.path().join("query"), SequenceKind::Nucleotide, 0)?;
        write_dbtype(&dir.path().join("target"), SequenceKind::AminoAcid, 0)?;
        let output = dir.path().join("plan.json");

        let args = SearchArgs {
            query_db: dir.path().join("query"),
            target_db: dir.path().join("target"),
            result_db: dir.path().join("result"),
            tmp_dir: dir.path().join("tmp"),
            overrides: SearchOverrides { remove_tmp_files: Some(true), ..Default::default() },
        };
        execute(&Config::default(), args, Some(output.clone()))?;

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
        assert_eq!(value["template"], "TranslatedSearch");
        assert_eq!(value["variables"]["REMOVE_TMP"], "TRUE");
        assert_eq!(value["variables"]["TARGET_NUCL"], serde_json::Value::Null);
        assert_eq!(value["variables"]["STAGE_BIN"], "mmseqs");
        assert_eq!(value["filenames"].as_array().map(Vec::len), Some(4));
        Ok(())
    }
}
