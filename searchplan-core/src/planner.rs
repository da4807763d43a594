//! End-to-end planning of one search invocation.
//!
//! Everything that can reject a request (classification, compatibility,
//! schedule bounds, the memory probe) runs before the working directory is
//! touched, so a rejected request leaves no files behind.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dbtype::{DatabaseClassifier, DbTypeFileClassifier};
use crate::defaults::resolve_defaults;
use crate::emit::emit_plan;
use crate::error::{PlanError, PlanResult};
use crate::options::SearchConfig;
use crate::params::{ParameterGroup, StageParameters};
use crate::plan::{ExecutionPlan, VariableMap};
use crate::stages::{build_stage_variables, SlicingSettings};
use crate::topology::{select_topology, Topology};
use crate::types::DatabaseKinds;
use crate::validate::validate;
use crate::workdir::{invocation_hash, prepare_working_directory, WorkerGroup};

/// Binary that runs the individual stages unless configured otherwise.
pub const DEFAULT_STAGE_BINARY: &str = "mmseqs";

/// Host-level planner settings that are not search options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    pub slicing: SlicingSettings,
    pub stage_binary: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            slicing: SlicingSettings::default(),
            stage_binary: DEFAULT_STAGE_BINARY.to_string(),
        }
    }
}

/// One search invocation: the positional databases plus options.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_db: PathBuf,
    pub target_db: PathBuf,
    pub result_db: PathBuf,
    pub tmp_dir: PathBuf,
    pub config: SearchConfig,
}

impl SearchRequest {
    pub fn new(
        query_db: impl Into<PathBuf>,
        target_db: impl Into<PathBuf>,
        result_db: impl Into<PathBuf>,
        tmp_dir: impl Into<PathBuf>,
        config: SearchConfig,
    ) -> Self {
        Self {
            query_db: query_db.into(),
            target_db: target_db.into(),
            result_db: result_db.into(),
            tmp_dir: tmp_dir.into(),
            config,
        }
    }

    /// Positional arguments in invocation order.
    pub fn filenames(&self) -> Vec<PathBuf> {
        vec![
            self.query_db.clone(),
            self.target_db.clone(),
            self.result_db.clone(),
            self.tmp_dir.clone(),
        ]
    }
}

/// Outcome of the side-effect free planning steps.
#[derive(Debug, Clone)]
pub struct ResolvedSearch {
    pub kinds: DatabaseKinds,
    /// Configuration after classification-dependent defaults.
    pub config: SearchConfig,
    pub topology: Topology,
    pub variables: VariableMap,
}

pub struct Planner<C = DbTypeFileClassifier> {
    classifier: C,
    settings: PlannerSettings,
}

impl Planner<DbTypeFileClassifier> {
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            classifier: DbTypeFileClassifier,
            settings,
        }
    }
}

impl<C: DatabaseClassifier> Planner<C> {
    pub fn with_classifier(classifier: C, settings: PlannerSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    fn classify(&self, database: &Path) -> PlanResult<crate::types::SequenceKind> {
        self.classifier
            .classify(database)
            .ok_or_else(|| PlanError::UnknownDatabaseType {
                path: database.to_path_buf(),
            })
    }

    /// Classify, validate, resolve defaults, select the topology and derive
    /// every stage variable.
    pub fn resolve(&self, request: &SearchRequest) -> PlanResult<ResolvedSearch> {
        let kinds = DatabaseKinds::new(self.classify(&request.query_db)?, self.classify(&request.target_db)?);
        log::info!("Query database: {}, target database: {}", kinds.query, kinds.target);

        validate(kinds, &request.config)?;

        let config = resolve_defaults(&request.config, kinds);
        let topology = select_topology(kinds, config.options());
        log::info!("Selected {}", topology);

        let variables = build_stage_variables(
            &config,
            kinds,
            topology,
            &self.settings.slicing,
            &self.settings.stage_binary,
        )?;

        Ok(ResolvedSearch {
            kinds,
            config,
            topology,
            variables,
        })
    }

    /// Produce the execution plan for `request` as one worker of `group`.
    pub fn plan(&self, request: &SearchRequest, group: &dyn WorkerGroup) -> PlanResult<ExecutionPlan> {
        let resolved = self.resolve(request)?;
        log_workflow_parameters(&resolved.config);

        let filenames = request.filenames();
        let hash = invocation_hash(&filenames, &resolved.config);
        let prepared = prepare_working_directory(&request.tmp_dir, hash, group)?;
        if group.is_leader() {
            log::info!("Working directory {}", prepared.path.display());
        }

        emit_plan(prepared.path, resolved.topology, resolved.variables, filenames)
    }
}

fn log_workflow_parameters(config: &SearchConfig) {
    let workflow = StageParameters::full(config, ParameterGroup::Workflow);
    log::info!("Search parameters:");
    for (flag, value) in workflow.iter() {
        log::info!("  {:<24} {}", flag, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SequenceKind;
    use crate::workdir::SingleWorker;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FixedKinds(HashMap<PathBuf, SequenceKind>);

    impl DatabaseClassifier for FixedKinds {
        fn classify(&self, database: &Path) -> Option<SequenceKind> {
            self.0.get(database).copied()
        }
    }

    fn planner(query: SequenceKind, target: SequenceKind) -> Planner<FixedKinds> {
        let mut kinds = HashMap::new();
        kinds.insert(PathBuf::from("q"), query);
        kinds.insert(PathBuf::from("t"), target);
        Planner::with_classifier(FixedKinds(kinds), PlannerSettings::default())
    }

    #[test]
    fn test_unknown_database_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let planner = planner(SequenceKind::AminoAcid, SequenceKind::AminoAcid);
        let request = SearchRequest::new("q", "missing", "r", tmp.path().join("tmp"), SearchConfig::default());
        let err = planner.plan(&request, &SingleWorker).unwrap_err();
        assert!(matches!(err, PlanError::UnknownDatabaseType { ref path } if path == Path::new("missing")));
        assert!(!tmp.path().join("tmp").exists());
    }

    #[test]
    fn test_resolve_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let planner = planner(SequenceKind::AminoAcid, SequenceKind::Profile);
        let request = SearchRequest::new("q", "t", "r", tmp.path().join("tmp"), SearchConfig::default());
        let resolved = planner.resolve(&request).unwrap();
        assert_eq!(resolved.config.options().kmer_size, 5);
        assert!(resolved.variables.contains("SWAP_PAR"));
        assert!(!tmp.path().join("tmp").exists());
    }

    #[test]
    fn test_plan_uses_stage_binary() {
        let tmp = TempDir::new().unwrap();
        let mut planner = planner(SequenceKind::AminoAcid, SequenceKind::AminoAcid);
        planner.settings.stage_binary = "/opt/bin/mmseqs".to_string();
        let request = SearchRequest::new("q", "t", "r", tmp.path(), SearchConfig::default());
        let plan = planner.plan(&request, &SingleWorker).unwrap();
        assert_eq!(plan.variables.get("STAGE_BIN"), Some("/opt/bin/mmseqs"));
        assert_eq!(plan.filenames[..3], [PathBuf::from("q"), PathBuf::from("t"), PathBuf::from("r")]);
    }
}
