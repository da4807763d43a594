//! User-supplied search options.
//!
//! The same struct is parsed from the command line and from the `[search]`
//! section of the configuration file. Every field is optional: a value that
//! is present, from either source, is recorded as explicitly set.

use clap::builder::BoolishValueParser;
use clap::Args;
use serde::{Deserialize, Serialize};

use searchplan_core::{AlignmentMode, OptionId, PlanError, PlanResult, RescoreMode, SearchConfigBuilder};

#[derive(Args, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOverrides {
    /// Substitution matrix file
    #[arg(long = "sub-mat")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_matrix: Option<String>,

    /// Target sensitivity (1.0 fast to 7.5 sensitive)
    #[arg(short = 's', long = "sensitivity")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f32>,

    /// k-mer length (0 chooses automatically)
    #[arg(short = 'k', long = "kmer-size")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kmer_size: Option<u32>,

    /// Maximum results per query passing the prefilter
    #[arg(long = "max-seqs")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_seqs: Option<i32>,

    #[arg(long = "spaced-kmer-mode", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaced_kmer: Option<bool>,

    /// Correct for locally biased amino acid composition
    #[arg(long = "comp-bias-corr", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_bias_correction: Option<bool>,

    /// Mask low-complexity regions in the prefilter
    #[arg(long = "mask", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,

    #[arg(long = "min-ungapped-score")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ungapped_score: Option<u32>,

    #[arg(long = "exact-kmer-matching", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_kmer_matching: Option<bool>,

    /// Memory limit of a prefilter split, e.g. 10G
    #[arg(long = "split-memory-limit")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_memory_limit: Option<String>,

    /// Minimum alignment coverage
    #[arg(short = 'c', long = "coverage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f32>,

    #[arg(long = "cov-mode")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_mode: Option<u8>,

    /// Pseudo-count admixture strength
    #[arg(long = "pca")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudo_count_a: Option<f32>,

    #[arg(long = "pcb")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pseudo_count_b: Option<f32>,

    /// Keep alignment back-traces
    #[arg(short = 'a', long = "add-backtrace", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_backtrace: Option<bool>,

    /// 0 auto, 1 score only, 2 score and coverage, 3 plus sequence identity, 4 ungapped
    #[arg(long = "alignment-mode", value_parser = clap::value_parser!(u8).range(0..=4))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_mode: Option<u8>,

    /// E-value threshold of the final result
    #[arg(short = 'e', long = "evalue")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_threshold: Option<f64>,

    #[arg(long = "min-seq-id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_seq_id: Option<f32>,

    #[arg(long = "min-aln-len")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_aln_len: Option<u32>,

    /// Recompute alignments with relaxed scoring
    #[arg(long = "realign", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realign: Option<bool>,

    #[arg(long = "max-rejected")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rejected: Option<i32>,

    #[arg(long = "alt-ali")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_alignments: Option<u32>,

    #[arg(long = "gap-open")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_open: Option<u32>,

    #[arg(long = "gap-extend")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_extend: Option<u32>,

    /// Rescoring of ungapped hits (0 hamming .. 4 window quality)
    #[arg(long = "rescore-mode", value_parser = clap::value_parser!(u8).range(0..=4))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescore_mode: Option<u8>,

    #[arg(long = "filter-hits", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_hits: Option<bool>,

    /// Inclusion threshold when building profiles between iterations
    #[arg(long = "e-profile")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_eval_threshold: Option<f64>,

    #[arg(long = "mask-profile", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_profile: Option<bool>,

    /// Minimum codons per open reading frame
    #[arg(long = "min-length")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orf_min_length: Option<u32>,

    #[arg(long = "max-length")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orf_max_length: Option<u32>,

    #[arg(long = "max-gaps")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orf_max_gaps: Option<i32>,

    #[arg(long = "contig-start-mode")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contig_start_mode: Option<u8>,

    #[arg(long = "contig-end-mode")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contig_end_mode: Option<u8>,

    #[arg(long = "orf-start-mode")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orf_start_mode: Option<u8>,

    #[arg(long = "forward-frames")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_frames: Option<String>,

    #[arg(long = "reverse-frames")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_frames: Option<String>,

    #[arg(long = "translation-table")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_table: Option<u32>,

    #[arg(long = "use-all-table-starts", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_all_table_starts: Option<bool>,

    #[arg(long = "add-orf-stop", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_orf_stop: Option<bool>,

    /// Threads used by every stage
    #[arg(short = 't', long = "threads")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Write compressed intermediate databases
    #[arg(long = "compressed", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,

    /// Verbosity passed to the stages (0 quiet .. 3 info)
    #[arg(long = "stage-verbosity")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,

    /// Profile search iterations
    #[arg(long = "num-iterations")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_iterations: Option<u32>,

    /// Sensitivity of the first step
    #[arg(long = "start-sens")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_sensitivity: Option<f32>,

    /// Number of sensitivity steps
    #[arg(long = "sens-steps")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity_steps: Option<u32>,

    /// Split the target profile database to fit into memory
    #[arg(long = "slice-search", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_search: Option<bool>,

    #[arg(long = "include-header", value_parser = BoolishValueParser::new())]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_header: Option<bool>,

    /// Delete intermediate databases after the search
    #[arg(long = "remove-tmp-files", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_tmp_files: Option<bool>,

    /// Command prefixed to parallel stages, e.g. "mpirun -np 4"
    #[arg(long = "mpi-runner")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<String>,
}

/// Copy every field present in `$from` into the builder under its option id.
macro_rules! apply_present {
    ($from:expr, $builder:ident; $($field:ident => $id:ident),* $(,)?) => {
        $(
            if let Some(value) = $from.$field.clone() {
                $builder = $builder.set(OptionId::$id, move |o| o.$field = value);
            }
        )*
    };
}

/// Take each field from `$primary`, falling back to `$fallback`.
macro_rules! merge_fields {
    ($primary:ident, $fallback:ident; $($field:ident),* $(,)?) => {
        SearchOverrides {
            $($field: $primary.$field.or($fallback.$field),)*
        }
    };
}

impl SearchOverrides {
    /// Values of `self` win; gaps are filled from `fallback`.
    pub fn merge(self, fallback: SearchOverrides) -> SearchOverrides {
        let primary = self;
        merge_fields!(primary, fallback;
            substitution_matrix, sensitivity, kmer_size, max_seqs, spaced_kmer,
            comp_bias_correction, mask, min_ungapped_score, exact_kmer_matching,
            split_memory_limit, coverage, coverage_mode, pseudo_count_a, pseudo_count_b,
            add_backtrace, alignment_mode, eval_threshold, min_seq_id, min_aln_len,
            realign, max_rejected, alt_alignments, gap_open, gap_extend, rescore_mode,
            filter_hits, profile_eval_threshold, mask_profile, orf_min_length,
            orf_max_length, orf_max_gaps, contig_start_mode, contig_end_mode,
            orf_start_mode, forward_frames, reverse_frames, translation_table,
            use_all_table_starts, add_orf_stop, threads, compressed, verbosity,
            num_iterations, start_sensitivity, sensitivity_steps, slice_search,
            include_header, remove_tmp_files, runner,
        )
    }

    /// Record every present value on `builder`.
    pub fn apply(&self, mut builder: SearchConfigBuilder) -> PlanResult<SearchConfigBuilder> {
        apply_present!(self, builder;
            substitution_matrix => SubstitutionMatrix,
            sensitivity => Sensitivity,
            kmer_size => KmerSize,
            max_seqs => MaxSeqs,
            spaced_kmer => SpacedKmer,
            comp_bias_correction => CompBiasCorrection,
            mask => Mask,
            min_ungapped_score => MinUngappedScore,
            exact_kmer_matching => ExactKmerMatching,
            split_memory_limit => SplitMemoryLimit,
            coverage => Coverage,
            coverage_mode => CoverageMode,
            pseudo_count_a => PseudoCountA,
            pseudo_count_b => PseudoCountB,
            add_backtrace => AddBacktrace,
            eval_threshold => EvalThreshold,
            min_seq_id => MinSeqId,
            min_aln_len => MinAlnLen,
            realign => Realign,
            max_rejected => MaxRejected,
            alt_alignments => AltAlignments,
            gap_open => GapOpen,
            gap_extend => GapExtend,
            filter_hits => FilterHits,
            profile_eval_threshold => ProfileEvalThreshold,
            mask_profile => MaskProfile,
            orf_min_length => OrfMinLength,
            orf_max_length => OrfMaxLength,
            orf_max_gaps => OrfMaxGaps,
            contig_start_mode => ContigStartMode,
            contig_end_mode => ContigEndMode,
            orf_start_mode => OrfStartMode,
            forward_frames => ForwardFrames,
            reverse_frames => ReverseFrames,
            translation_table => TranslationTable,
            use_all_table_starts => UseAllTableStarts,
            add_orf_stop => AddOrfStop,
            threads => Threads,
            compressed => Compressed,
            verbosity => Verbosity,
            num_iterations => NumIterations,
            start_sensitivity => StartSensitivity,
            sensitivity_steps => SensitivitySteps,
            slice_search => SliceSearch,
            include_header => IncludeHeader,
            remove_tmp_files => RemoveTmpFiles,
            runner => Runner,
        );

        if let Some(code) = self.alignment_mode {
            let mode = AlignmentMode::from_code(code)
                .ok_or_else(|| PlanError::InvalidOption(format!("unknown alignment mode {}", code)))?;
            builder = builder.set(OptionId::AlignmentMode, move |o| o.alignment_mode = mode);
        }
        if let Some(code) = self.rescore_mode {
            let mode = RescoreMode::from_code(code)
                .ok_or_else(|| PlanError::InvalidOption(format!("unknown rescore mode {}", code)))?;
            builder = builder.set(OptionId::RescoreMode, move |o| o.rescore_mode = mode);
        }
        Ok(builder)
    }
}
