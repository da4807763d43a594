//! Search options, the explicit-option set and the configuration builder.
//!
//! A [`SearchConfig`] is assembled once from the baseline in
//! [`SearchOptions::default`] plus user overrides, each of which is recorded
//! in the explicit set. After `build()` the configuration is immutable;
//! defaults resolution and per-stage derivations produce new values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PlanError, PlanResult};
use crate::types::{AlignmentMode, RescoreMode};

/// Every tunable option understood by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionId {
    SubstitutionMatrix,
    Sensitivity,
    KmerSize,
    MaxSeqs,
    SpacedKmer,
    CompBiasCorrection,
    Mask,
    MinUngappedScore,
    ExactKmerMatching,
    SplitMemoryLimit,
    Coverage,
    CoverageMode,
    PseudoCountA,
    PseudoCountB,
    AddBacktrace,
    AlignmentMode,
    EvalThreshold,
    MinSeqId,
    MinAlnLen,
    Realign,
    MaxRejected,
    AltAlignments,
    GapOpen,
    GapExtend,
    RescoreMode,
    FilterHits,
    ProfileEvalThreshold,
    MaskProfile,
    OrfMinLength,
    OrfMaxLength,
    OrfMaxGaps,
    ContigStartMode,
    ContigEndMode,
    OrfStartMode,
    ForwardFrames,
    ReverseFrames,
    TranslationTable,
    UseAllTableStarts,
    AddOrfStop,
    Threads,
    Compressed,
    Verbosity,
    NumIterations,
    StartSensitivity,
    SensitivitySteps,
    SliceSearch,
    IncludeHeader,
    RemoveTmpFiles,
    Runner,
}

impl OptionId {
    pub const ALL: [OptionId; 49] = [
        OptionId::SubstitutionMatrix,
        OptionId::Sensitivity,
        OptionId::KmerSize,
        OptionId::MaxSeqs,
        OptionId::SpacedKmer,
        OptionId::CompBiasCorrection,
        OptionId::Mask,
        OptionId::MinUngappedScore,
        OptionId::ExactKmerMatching,
        OptionId::SplitMemoryLimit,
        OptionId::Coverage,
        OptionId::CoverageMode,
        OptionId::PseudoCountA,
        OptionId::PseudoCountB,
        OptionId::AddBacktrace,
        OptionId::AlignmentMode,
        OptionId::EvalThreshold,
        OptionId::MinSeqId,
        OptionId::MinAlnLen,
        OptionId::Realign,
        OptionId::MaxRejected,
        OptionId::AltAlignments,
        OptionId::GapOpen,
        OptionId::GapExtend,
        OptionId::RescoreMode,
        OptionId::FilterHits,
        OptionId::ProfileEvalThreshold,
        OptionId::MaskProfile,
        OptionId::OrfMinLength,
        OptionId::OrfMaxLength,
        OptionId::OrfMaxGaps,
        OptionId::ContigStartMode,
        OptionId::ContigEndMode,
        OptionId::OrfStartMode,
        OptionId::ForwardFrames,
        OptionId::ReverseFrames,
        OptionId::TranslationTable,
        OptionId::UseAllTableStarts,
        OptionId::AddOrfStop,
        OptionId::Threads,
        OptionId::Compressed,
        OptionId::Verbosity,
        OptionId::NumIterations,
        OptionId::StartSensitivity,
        OptionId::SensitivitySteps,
        OptionId::SliceSearch,
        OptionId::IncludeHeader,
        OptionId::RemoveTmpFiles,
        OptionId::Runner,
    ];

    /// Command-line flag the stage binaries accept for this option.
    pub fn flag(self) -> &'static str {
        match self {
            OptionId::SubstitutionMatrix => "--sub-mat",
            OptionId::Sensitivity => "-s",
            OptionId::KmerSize => "-k",
            OptionId::MaxSeqs => "--max-seqs",
            OptionId::SpacedKmer => "--spaced-kmer-mode",
            OptionId::CompBiasCorrection => "--comp-bias-corr",
            OptionId::Mask => "--mask",
            OptionId::MinUngappedScore => "--min-ungapped-score",
            OptionId::ExactKmerMatching => "--exact-kmer-matching",
            OptionId::SplitMemoryLimit => "--split-memory-limit",
            OptionId::Coverage => "-c",
            OptionId::CoverageMode => "--cov-mode",
            OptionId::PseudoCountA => "--pca",
            OptionId::PseudoCountB => "--pcb",
            OptionId::AddBacktrace => "-a",
            OptionId::AlignmentMode => "--alignment-mode",
            OptionId::EvalThreshold => "-e",
            OptionId::MinSeqId => "--min-seq-id",
            OptionId::MinAlnLen => "--min-aln-len",
            OptionId::Realign => "--realign",
            OptionId::MaxRejected => "--max-rejected",
            OptionId::AltAlignments => "--alt-ali",
            OptionId::GapOpen => "--gap-open",
            OptionId::GapExtend => "--gap-extend",
            OptionId::RescoreMode => "--rescore-mode",
            OptionId::FilterHits => "--filter-hits",
            OptionId::ProfileEvalThreshold => "--e-profile",
            OptionId::MaskProfile => "--mask-profile",
            OptionId::OrfMinLength => "--min-length",
            OptionId::OrfMaxLength => "--max-length",
            OptionId::OrfMaxGaps => "--max-gaps",
            OptionId::ContigStartMode => "--contig-start-mode",
            OptionId::ContigEndMode => "--contig-end-mode",
            OptionId::OrfStartMode => "--orf-start-mode",
            OptionId::ForwardFrames => "--forward-frames",
            OptionId::ReverseFrames => "--reverse-frames",
            OptionId::TranslationTable => "--translation-table",
            OptionId::UseAllTableStarts => "--use-all-table-starts",
            OptionId::AddOrfStop => "--add-orf-stop",
            OptionId::Threads => "--threads",
            OptionId::Compressed => "--compressed",
            OptionId::Verbosity => "-v",
            OptionId::NumIterations => "--num-iterations",
            OptionId::StartSensitivity => "--start-sens",
            OptionId::SensitivitySteps => "--sens-steps",
            OptionId::SliceSearch => "--slice-search",
            OptionId::IncludeHeader => "--include-header",
            OptionId::RemoveTmpFiles => "--remove-tmp-files",
            OptionId::Runner => "--mpi-runner",
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Upper bound for `--sens-steps`; each step is one prefilter pass.
pub const MAX_SENSITIVITY_STEPS: u32 = 100;

/// Typed values for every [`OptionId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub substitution_matrix: String,
    pub sensitivity: f32,
    /// 0 lets the prefilter choose.
    pub kmer_size: u32,
    pub max_seqs: i32,
    pub spaced_kmer: bool,
    pub comp_bias_correction: bool,
    pub mask: bool,
    pub min_ungapped_score: u32,
    pub exact_kmer_matching: bool,
    pub split_memory_limit: String,
    pub coverage: f32,
    pub coverage_mode: u8,
    pub pseudo_count_a: f32,
    pub pseudo_count_b: f32,
    pub add_backtrace: bool,
    pub alignment_mode: AlignmentMode,
    pub eval_threshold: f64,
    pub min_seq_id: f32,
    pub min_aln_len: u32,
    pub realign: bool,
    pub max_rejected: i32,
    pub alt_alignments: u32,
    pub gap_open: u32,
    pub gap_extend: u32,
    pub rescore_mode: RescoreMode,
    pub filter_hits: bool,
    pub profile_eval_threshold: f64,
    pub mask_profile: bool,
    pub orf_min_length: u32,
    pub orf_max_length: u32,
    pub orf_max_gaps: i32,
    pub contig_start_mode: u8,
    pub contig_end_mode: u8,
    pub orf_start_mode: u8,
    pub forward_frames: String,
    pub reverse_frames: String,
    pub translation_table: u32,
    pub use_all_table_starts: bool,
    pub add_orf_stop: bool,
    pub threads: usize,
    pub compressed: bool,
    pub verbosity: u8,
    pub num_iterations: u32,
    pub start_sensitivity: f32,
    pub sensitivity_steps: u32,
    pub slice_search: bool,
    pub include_header: bool,
    pub remove_tmp_files: bool,
    pub runner: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            substitution_matrix: "blosum62.out".to_string(),
            sensitivity: 5.7,
            kmer_size: 0,
            max_seqs: 300,
            spaced_kmer: true,
            comp_bias_correction: true,
            mask: true,
            min_ungapped_score: 15,
            exact_kmer_matching: false,
            split_memory_limit: "0".to_string(),
            coverage: 0.0,
            coverage_mode: 0,
            pseudo_count_a: 1.0,
            pseudo_count_b: 1.5,
            add_backtrace: false,
            alignment_mode: AlignmentMode::ScoreCoverage,
            eval_threshold: 0.001,
            min_seq_id: 0.0,
            min_aln_len: 0,
            realign: false,
            max_rejected: i32::MAX,
            alt_alignments: 0,
            gap_open: 11,
            gap_extend: 1,
            rescore_mode: RescoreMode::Hamming,
            filter_hits: false,
            profile_eval_threshold: 0.001,
            mask_profile: true,
            orf_min_length: 30,
            orf_max_length: 32734,
            orf_max_gaps: i32::MAX,
            contig_start_mode: 2,
            contig_end_mode: 2,
            orf_start_mode: 0,
            forward_frames: "1,2,3".to_string(),
            reverse_frames: "1,2,3".to_string(),
            translation_table: 1,
            use_all_table_starts: false,
            add_orf_stop: false,
            threads: num_cpus::get(),
            compressed: false,
            verbosity: 3,
            num_iterations: 1,
            start_sensitivity: 4.0,
            sensitivity_steps: 1,
            slice_search: false,
            include_header: true,
            remove_tmp_files: false,
            runner: String::new(),
        }
    }
}

fn flag_value(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

impl SearchOptions {
    /// Render one option's value the way the stage binaries parse it.
    pub fn render_value(&self, id: OptionId) -> String {
        match id {
            OptionId::SubstitutionMatrix => self.substitution_matrix.clone(),
            OptionId::Sensitivity => self.sensitivity.to_string(),
            OptionId::KmerSize => self.kmer_size.to_string(),
            OptionId::MaxSeqs => self.max_seqs.to_string(),
            OptionId::SpacedKmer => flag_value(self.spaced_kmer),
            OptionId::CompBiasCorrection => flag_value(self.comp_bias_correction),
            OptionId::Mask => flag_value(self.mask),
            OptionId::MinUngappedScore => self.min_ungapped_score.to_string(),
            OptionId::ExactKmerMatching => flag_value(self.exact_kmer_matching),
            OptionId::SplitMemoryLimit => self.split_memory_limit.clone(),
            OptionId::Coverage => self.coverage.to_string(),
            OptionId::CoverageMode => self.coverage_mode.to_string(),
            OptionId::PseudoCountA => self.pseudo_count_a.to_string(),
            OptionId::PseudoCountB => self.pseudo_count_b.to_string(),
            OptionId::AddBacktrace => flag_value(self.add_backtrace),
            OptionId::AlignmentMode => self.alignment_mode.code().to_string(),
            OptionId::EvalThreshold => self.eval_threshold.to_string(),
            OptionId::MinSeqId => self.min_seq_id.to_string(),
            OptionId::MinAlnLen => self.min_aln_len.to_string(),
            OptionId::Realign => flag_value(self.realign),
            OptionId::MaxRejected => self.max_rejected.to_string(),
            OptionId::AltAlignments => self.alt_alignments.to_string(),
            OptionId::GapOpen => self.gap_open.to_string(),
            OptionId::GapExtend => self.gap_extend.to_string(),
            OptionId::RescoreMode => self.rescore_mode.code().to_string(),
            OptionId::FilterHits => flag_value(self.filter_hits),
            OptionId::ProfileEvalThreshold => self.profile_eval_threshold.to_string(),
            OptionId::MaskProfile => flag_value(self.mask_profile),
            OptionId::OrfMinLength => self.orf_min_length.to_string(),
            OptionId::OrfMaxLength => self.orf_max_length.to_string(),
            OptionId::OrfMaxGaps => self.orf_max_gaps.to_string(),
            OptionId::ContigStartMode => self.contig_start_mode.to_string(),
            OptionId::ContigEndMode => self.contig_end_mode.to_string(),
            OptionId::OrfStartMode => self.orf_start_mode.to_string(),
            OptionId::ForwardFrames => self.forward_frames.clone(),
            OptionId::ReverseFrames => self.reverse_frames.clone(),
            OptionId::TranslationTable => self.translation_table.to_string(),
            OptionId::UseAllTableStarts => flag_value(self.use_all_table_starts),
            OptionId::AddOrfStop => flag_value(self.add_orf_stop),
            OptionId::Threads => self.threads.to_string(),
            OptionId::Compressed => flag_value(self.compressed),
            OptionId::Verbosity => self.verbosity.to_string(),
            OptionId::NumIterations => self.num_iterations.to_string(),
            OptionId::StartSensitivity => self.start_sensitivity.to_string(),
            OptionId::SensitivitySteps => self.sensitivity_steps.to_string(),
            OptionId::SliceSearch => flag_value(self.slice_search),
            OptionId::IncludeHeader => flag_value(self.include_header),
            OptionId::RemoveTmpFiles => flag_value(self.remove_tmp_files),
            OptionId::Runner => self.runner.clone(),
        }
    }

    fn check(&self) -> PlanResult<()> {
        if self.num_iterations == 0 {
            return Err(PlanError::InvalidOption("--num-iterations must be at least 1".into()));
        }
        if self.sensitivity_steps == 0 || self.sensitivity_steps > MAX_SENSITIVITY_STEPS {
            return Err(PlanError::InvalidOption(format!(
                "--sens-steps must be between 1 and {}",
                MAX_SENSITIVITY_STEPS
            )));
        }
        for (flag, value) in [("-s", self.sensitivity), ("--start-sens", self.start_sensitivity)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::InvalidOption(format!(
                    "{} must be a finite, non-negative number, got {}",
                    flag, value
                )));
            }
        }
        if self.threads == 0 {
            return Err(PlanError::InvalidOption("--threads must be at least 1".into()));
        }
        let negative = |e: f64| e.is_nan() || e < 0.0;
        if negative(self.eval_threshold) || negative(self.profile_eval_threshold) {
            return Err(PlanError::InvalidOption("e-value thresholds must be non-negative".into()));
        }
        if self.orf_min_length > self.orf_max_length {
            return Err(PlanError::InvalidOption(format!(
                "--min-length {} is greater than --max-length {}",
                self.orf_min_length, self.orf_max_length
            )));
        }
        Ok(())
    }
}

/// Resolved options plus the set of options the user set explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    options: SearchOptions,
    explicit: BTreeSet<OptionId>,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn is_explicit(&self, id: OptionId) -> bool {
        self.explicit.contains(&id)
    }

    pub fn explicit(&self) -> &BTreeSet<OptionId> {
        &self.explicit
    }

    /// Copy with `patch` applied; the explicit set is unchanged.
    ///
    /// Used for defaults resolution and for values that hold only while one
    /// stage's parameters are derived.
    pub fn scoped(&self, patch: impl FnOnce(&mut SearchOptions)) -> SearchConfig {
        let mut options = self.options.clone();
        patch(&mut options);
        SearchConfig {
            options,
            explicit: self.explicit.clone(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfigBuilder::new().into_config()
    }
}

/// Layers user overrides on top of the baseline options
#[derive(Debug, Clone)]
pub struct SearchConfigBuilder {
    options: SearchOptions,
    explicit: BTreeSet<OptionId>,
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            options: SearchOptions::default(),
            explicit: BTreeSet::new(),
        }
    }

    /// Apply a user override and mark `id` as explicitly set.
    ///
    /// `apply` is expected to write the field belonging to `id`.
    pub fn set(mut self, id: OptionId, apply: impl FnOnce(&mut SearchOptions)) -> Self {
        apply(&mut self.options);
        self.explicit.insert(id);
        self
    }

    pub fn is_explicit(&self, id: OptionId) -> bool {
        self.explicit.contains(&id)
    }

    fn into_config(self) -> SearchConfig {
        SearchConfig {
            options: self.options,
            explicit: self.explicit,
        }
    }

    /// Check option ranges and freeze the configuration.
    pub fn build(self) -> PlanResult<SearchConfig> {
        self.options.check()?;
        Ok(self.into_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_defaults() {
        let config = SearchConfig::default();
        let o = config.options();
        assert!(o.spaced_kmer);
        assert_eq!(o.alignment_mode, AlignmentMode::ScoreCoverage);
        assert_eq!(o.sensitivity, 5.7);
        assert_eq!(o.eval_threshold, 0.001);
        assert!(o.include_header);
        assert_eq!(o.orf_start_mode, 0);
        assert_eq!((o.orf_min_length, o.orf_max_length), (30, 32734));
        assert!(config.explicit().is_empty());
    }

    #[test]
    fn test_builder_records_explicit_options() {
        let config = SearchConfig::builder()
            .set(OptionId::Sensitivity, |o| o.sensitivity = 7.5)
            .set(OptionId::KmerSize, |o| o.kmer_size = 6)
            .build()
            .unwrap();
        assert_eq!(config.options().sensitivity, 7.5);
        assert_eq!(config.options().kmer_size, 6);
        assert!(config.is_explicit(OptionId::Sensitivity));
        assert!(config.is_explicit(OptionId::KmerSize));
        assert!(!config.is_explicit(OptionId::EvalThreshold));
    }

    #[test]
    fn test_scoped_copy_leaves_original_untouched() {
        let config = SearchConfig::default();
        let widened = config.scoped(|o| o.max_seqs = i32::MAX);
        assert_eq!(config.options().max_seqs, 300);
        assert_eq!(widened.options().max_seqs, i32::MAX);
        assert_eq!(widened.explicit(), config.explicit());
    }

    #[test]
    fn test_build_rejects_out_of_range_values() {
        let err = SearchConfig::builder()
            .set(OptionId::NumIterations, |o| o.num_iterations = 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidOption(_)));

        let err = SearchConfig::builder()
            .set(OptionId::OrfMinLength, |o| o.orf_min_length = 100)
            .set(OptionId::OrfMaxLength, |o| o.orf_max_length = 50)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("--min-length"));
    }

    #[test]
    fn test_build_rejects_unusable_sensitivity() {
        for bad in [f32::NAN, f32::INFINITY, -1.0] {
            let err = SearchConfig::builder()
                .set(OptionId::Sensitivity, |o| o.sensitivity = bad)
                .set(OptionId::SensitivitySteps, |o| o.sensitivity_steps = 3)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("-s "), "{}", err);

            let err = SearchConfig::builder()
                .set(OptionId::StartSensitivity, |o| o.start_sensitivity = bad)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("--start-sens"), "{}", err);
        }
    }

    #[test]
    fn test_sensitivity_steps_are_capped() {
        let capped = SearchConfig::builder()
            .set(OptionId::SensitivitySteps, |o| o.sensitivity_steps = MAX_SENSITIVITY_STEPS)
            .build();
        assert!(capped.is_ok());

        let err = SearchConfig::builder()
            .set(OptionId::SensitivitySteps, |o| o.sensitivity_steps = 4_000_000_000)
            .build()
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidOption(_)));
        assert!(err.to_string().contains("--sens-steps"));
    }

    #[test]
    fn test_render_values() {
        let o = SearchOptions::default();
        assert_eq!(o.render_value(OptionId::Sensitivity), "5.7");
        assert_eq!(o.render_value(OptionId::EvalThreshold), "0.001");
        assert_eq!(o.render_value(OptionId::SpacedKmer), "1");
        assert_eq!(o.render_value(OptionId::AddBacktrace), "0");
        assert_eq!(o.render_value(OptionId::AlignmentMode), "2");
        assert_eq!(o.render_value(OptionId::MaxRejected), "2147483647");
    }

    #[test]
    fn test_flags_are_unique() {
        let flags: BTreeSet<&str> = OptionId::ALL.iter().map(|id| id.flag()).collect();
        assert_eq!(flags.len(), OptionId::ALL.len());
    }
}
