//! Stage parameter derivation for each topology.
//!
//! Values that must only hold while one stage's parameters are derived (a
//! widened result cap, disabled pseudo-counts, per-round e-values) are
//! expressed as scoped copies of the resolved configuration, never by
//! mutating it.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::options::{OptionId, SearchConfig};
use crate::params::{ParameterGroup, RenderFlavor, StageParameters};
use crate::plan::VariableMap;
use crate::sysmem;
use crate::topology::{BaseTopology, Topology, TranslatedSides};
use crate::types::{DatabaseKinds, RescoreMode, SequenceKind};

/// Tunables of the sliced target-profile search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicingSettings {
    /// Share of total memory the sliced search may use.
    pub memory_fraction: f64,
    /// Upper bound on the number of slicing steps.
    pub max_steps: u32,
    /// Skip probing the host and use this total instead.
    pub total_memory_bytes: Option<u64>,
}

impl Default for SlicingSettings {
    fn default() -> Self {
        Self {
            memory_fraction: 0.9,
            max_steps: 30,
            total_memory_bytes: None,
        }
    }
}

impl SlicingSettings {
    /// Memory budget handed to the sliced search, in KiB.
    pub fn available_memory_kib(&self) -> PlanResult<u64> {
        if !(self.memory_fraction > 0.0 && self.memory_fraction <= 1.0) {
            return Err(PlanError::InvalidOption(format!(
                "memory fraction must be in (0, 1], got {}",
                self.memory_fraction
            )));
        }
        let total = match self.total_memory_bytes {
            Some(total) => total,
            None => sysmem::total_system_memory()?,
        };
        let limit = (total as f64 * self.memory_fraction) as u64;
        Ok(limit / 1024)
    }
}

/// Linear sensitivity schedule of the plain search, one-decimal strings.
pub fn sensitivity_schedule(config: &SearchConfig) -> PlanResult<Vec<String>> {
    let options = config.options();
    let steps = options.sensitivity_steps;
    if steps <= 1 {
        return Ok(vec![format!("{:.1}", options.sensitivity)]);
    }
    let start = options.start_sensitivity;
    let target = options.sensitivity;
    if start > target {
        return Err(PlanError::SensitivitySchedule { start, target });
    }
    let step_size = (target - start) / (steps - 1) as f32;
    Ok((0..steps)
        .map(|step| format!("{:.1}", start + step_size * step as f32))
        .collect())
}

/// Alignment stage parameters: rescoring flavor in ungapped mode, full
/// alignment otherwise.
pub fn alignment_parameters(config: &SearchConfig) -> StageParameters {
    if config.options().alignment_mode.is_ungapped() {
        let rescoring = config.scoped(|o| o.rescore_mode = RescoreMode::Alignment);
        StageParameters::full(&rescoring, ParameterGroup::RescoreDiagonal)
    } else {
        StageParameters::full(config, ParameterGroup::Align)
    }
}

pub fn alignment_module(config: &SearchConfig) -> &'static str {
    if config.options().alignment_mode.is_ungapped() {
        "rescorediagonal"
    } else {
        "align"
    }
}

/// Per-round configurations of an iterative search.
///
/// Round 0 realigns unless the query is already a profile; later rounds never
/// do. Every round but the last filters with the profile e-value.
pub fn iteration_rounds(config: &SearchConfig, kinds: DatabaseKinds) -> Vec<SearchConfig> {
    let options = config.options();
    let rounds = options.num_iterations.max(1);
    let final_evalue = options.eval_threshold;
    let profile_evalue = options.profile_eval_threshold;
    let first_round_realign =
        if kinds.query.is_profile() || config.is_explicit(OptionId::Realign) { options.realign } else { true };

    (0..rounds)
        .map(|round| {
            config.scoped(|o| {
                o.realign = round == 0 && first_round_realign;
                o.eval_threshold = if round + 1 == rounds { final_evalue } else { profile_evalue };
            })
        })
        .collect()
}

/// Variables shared by every topology.
pub fn common_variables(config: &SearchConfig, kinds: DatabaseKinds, stage_binary: &str) -> VariableMap {
    let options = config.options();
    let mut vars = VariableMap::new();
    vars.set("ALIGN_MODULE", alignment_module(config));
    vars.set_flag("REMOVE_TMP", options.remove_tmp_files);
    vars.set("RUNNER", options.runner.as_str());
    vars.set("STAGE_BIN", stage_binary);
    let db_ext = if kinds.target == SequenceKind::ProfileStateSequence { ".255" } else { "" };
    vars.set("ALIGNMENT_DB_EXT", db_ext);
    vars
}

pub fn plain_variables(config: &SearchConfig) -> PlanResult<VariableMap> {
    let schedule = sensitivity_schedule(config)?;
    let mut vars = VariableMap::new();
    for (step, sensitivity) in schedule.iter().enumerate() {
        vars.set(format!("SENSE_{}", step), sensitivity.as_str());
    }
    vars.set("STEPS", schedule.len().to_string());
    let prefilter = StageParameters::full(config, ParameterGroup::Prefilter).without(OptionId::Sensitivity);
    vars.set("PREFILTER_PAR", prefilter.render());
    vars.set("ALIGNMENT_PAR", alignment_parameters(config).render());
    Ok(vars)
}

pub fn target_profile_variables(config: &SearchConfig) -> VariableMap {
    let mut vars = VariableMap::new();
    vars.set("PREFILTER_PAR", StageParameters::full(config, ParameterGroup::Prefilter).render());
    // every prefilter hit against a profile target has to be aligned
    let uncapped = config.scoped(|o| o.max_seqs = i32::MAX);
    vars.set("ALIGNMENT_PAR", alignment_parameters(&uncapped).render());
    vars.set("SWAP_PAR", StageParameters::full(config, ParameterGroup::SwapResults).render());
    vars
}

pub fn sliced_target_profile_variables(
    config: &SearchConfig,
    slicing: &SlicingSettings,
) -> PlanResult<VariableMap> {
    let options = config.options();
    let mut vars = VariableMap::new();
    let prefilter = StageParameters::from_config(config, ParameterGroup::Prefilter, RenderFlavor::OnlyExplicit);
    vars.set("PREFILTER_PAR", prefilter.render());
    vars.set("MAX_STEPS", slicing.max_steps.to_string());
    vars.set("MAX_RESULTS_PER_QUERY", options.max_seqs.to_string());
    vars.set("AVAIL_MEM", slicing.available_memory_kib()?.to_string());
    vars.set("COMMONS", format!("--threads {}", options.threads));
    vars.set("ALIGNMENT_PAR", alignment_parameters(config).render());
    vars.set("SWAP_PAR", StageParameters::full(config, ParameterGroup::SwapResults).render());
    Ok(vars)
}

pub fn iterative_variables(config: &SearchConfig, kinds: DatabaseKinds) -> VariableMap {
    let options = config.options();
    let mut vars = VariableMap::new();
    vars.set("NUM_IT", options.num_iterations.to_string());
    vars.set("PROFILE", if kinds.query.is_profile() { "1" } else { "0" });
    vars.set("SUBTRACT_PAR", StageParameters::full(config, ParameterGroup::SubtractDbs).render());

    for (round, round_config) in iteration_rounds(config, kinds).iter().enumerate() {
        let prefilter = StageParameters::full(round_config, ParameterGroup::Prefilter);
        vars.set(format!("PREFILTER_PAR_{}", round), prefilter.render());
        vars.set(format!("ALIGNMENT_PAR_{}", round), alignment_parameters(round_config).render());
        let without_pseudo_counts = round_config.scoped(|o| o.pseudo_count_a = 0.0);
        let profile = StageParameters::full(&without_pseudo_counts, ParameterGroup::ResultToProfile);
        vars.set(format!("PROFILE_PAR_{}", round), profile.render());
    }
    vars
}

/// ORF extraction and translation variables; `SEARCH` is added once the
/// inner script has a path.
pub fn translated_variables(config: &SearchConfig, sides: TranslatedSides) -> VariableMap {
    let mut vars = VariableMap::new();
    vars.set_flag("QUERY_NUCL", sides.query_nucleotide);
    vars.set_flag("TARGET_NUCL", sides.target_nucleotide);
    vars.set("ORF_PAR", StageParameters::full(config, ParameterGroup::ExtractOrfs).render());
    vars.set("TRANSLATE_PAR", StageParameters::full(config, ParameterGroup::TranslateNucs).render());
    vars
}

/// All stage variables for `topology`, without any path-dependent entries.
pub fn build_stage_variables(
    config: &SearchConfig,
    kinds: DatabaseKinds,
    topology: Topology,
    slicing: &SlicingSettings,
    stage_binary: &str,
) -> PlanResult<VariableMap> {
    let mut vars = common_variables(config, kinds, stage_binary);
    let stage_vars = match topology.base {
        BaseTopology::SlicedTargetProfile => sliced_target_profile_variables(config, slicing)?,
        BaseTopology::TargetProfile => target_profile_variables(config),
        BaseTopology::Iterative => iterative_variables(config, kinds),
        BaseTopology::Plain => plain_variables(config)?,
    };
    vars.extend(stage_vars);
    if let Some(sides) = topology.translated {
        vars.extend(translated_variables(config, sides));
    }
    for (name, value) in vars.present() {
        log::debug!("{}={}", name, value);
    }
    Ok(vars)
}
