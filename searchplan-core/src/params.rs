//! Per-stage parameter sets.
//!
//! Every stage binary accepts a fixed group of options. A [`StageParameters`]
//! is the ordered `(flag, value)` list for one invocation, rendered as the
//! space separated string the workflow scripts splice into the command line.

use serde::Serialize;
use std::fmt;

use crate::options::{OptionId, SearchConfig};

/// Option groups of the external stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterGroup {
    Prefilter,
    Align,
    RescoreDiagonal,
    SwapResults,
    ResultToProfile,
    SubtractDbs,
    ExtractOrfs,
    TranslateNucs,
    /// Every option; describes the whole search for logging and hashing.
    Workflow,
}

use OptionId as O;

const PREFILTER: &[OptionId] = &[
    O::SubstitutionMatrix,
    O::Sensitivity,
    O::KmerSize,
    O::MaxSeqs,
    O::SpacedKmer,
    O::CompBiasCorrection,
    O::Mask,
    O::MinUngappedScore,
    O::ExactKmerMatching,
    O::SplitMemoryLimit,
    O::Coverage,
    O::CoverageMode,
    O::PseudoCountA,
    O::PseudoCountB,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const ALIGN: &[OptionId] = &[
    O::SubstitutionMatrix,
    O::AddBacktrace,
    O::AlignmentMode,
    O::EvalThreshold,
    O::MinSeqId,
    O::MinAlnLen,
    O::Coverage,
    O::CoverageMode,
    O::MaxSeqs,
    O::Realign,
    O::MaxRejected,
    O::AltAlignments,
    O::GapOpen,
    O::GapExtend,
    O::CompBiasCorrection,
    O::PseudoCountA,
    O::PseudoCountB,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const RESCORE_DIAGONAL: &[OptionId] = &[
    O::SubstitutionMatrix,
    O::RescoreMode,
    O::FilterHits,
    O::EvalThreshold,
    O::Coverage,
    O::CoverageMode,
    O::MinSeqId,
    O::MinAlnLen,
    O::AddBacktrace,
    O::MaxSeqs,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const SWAP_RESULTS: &[OptionId] = &[
    O::SubstitutionMatrix,
    O::EvalThreshold,
    O::SplitMemoryLimit,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const RESULT_TO_PROFILE: &[OptionId] = &[
    O::SubstitutionMatrix,
    O::ProfileEvalThreshold,
    O::MaskProfile,
    O::CompBiasCorrection,
    O::PseudoCountA,
    O::PseudoCountB,
    O::GapOpen,
    O::GapExtend,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const SUBTRACT_DBS: &[OptionId] = &[O::ProfileEvalThreshold, O::Threads, O::Compressed, O::Verbosity];

const EXTRACT_ORFS: &[OptionId] = &[
    O::OrfMinLength,
    O::OrfMaxLength,
    O::OrfMaxGaps,
    O::ContigStartMode,
    O::ContigEndMode,
    O::OrfStartMode,
    O::ForwardFrames,
    O::ReverseFrames,
    O::TranslationTable,
    O::UseAllTableStarts,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

const TRANSLATE_NUCS: &[OptionId] = &[
    O::TranslationTable,
    O::AddOrfStop,
    O::Threads,
    O::Compressed,
    O::Verbosity,
];

impl ParameterGroup {
    pub fn options(self) -> &'static [OptionId] {
        match self {
            ParameterGroup::Prefilter => PREFILTER,
            ParameterGroup::Align => ALIGN,
            ParameterGroup::RescoreDiagonal => RESCORE_DIAGONAL,
            ParameterGroup::SwapResults => SWAP_RESULTS,
            ParameterGroup::ResultToProfile => RESULT_TO_PROFILE,
            ParameterGroup::SubtractDbs => SUBTRACT_DBS,
            ParameterGroup::ExtractOrfs => EXTRACT_ORFS,
            ParameterGroup::TranslateNucs => TRANSLATE_NUCS,
            ParameterGroup::Workflow => &OptionId::ALL,
        }
    }
}

/// Which options of a group end up in the rendered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFlavor {
    #[default]
    All,
    /// Only options the user set explicitly; the stage keeps its own defaults
    /// for everything else.
    OnlyExplicit,
}

/// Ordered parameter list for one stage invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StageParameters {
    entries: Vec<(OptionId, String)>,
}

impl StageParameters {
    pub fn from_config(config: &SearchConfig, group: ParameterGroup, flavor: RenderFlavor) -> Self {
        let options = config.options();
        let entries = group
            .options()
            .iter()
            .copied()
            .filter(|id| flavor == RenderFlavor::All || config.is_explicit(*id))
            .map(|id| (id, options.render_value(id)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        Self { entries }
    }

    pub fn full(config: &SearchConfig, group: ParameterGroup) -> Self {
        Self::from_config(config, group, RenderFlavor::All)
    }

    /// Drop one option, e.g. when a variable elsewhere supersedes it.
    pub fn without(mut self, id: OptionId) -> Self {
        self.entries.retain(|(entry, _)| *entry != id);
        self
    }

    pub fn get(&self, id: OptionId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, id: OptionId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(id, value)| (id.flag(), value.as_str()))
    }

    /// `--flag value --flag value ` with a trailing separator.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StageParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, value) in self.iter() {
            write!(f, "{} {} ", flag, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_prefilter() {
        let config = SearchConfig::builder()
            .set(OptionId::Threads, |o| o.threads = 4)
            .build()
            .unwrap();
        let params = StageParameters::full(&config, ParameterGroup::Prefilter);
        let rendered = params.render();
        assert!(rendered.starts_with("--sub-mat blosum62.out -s 5.7 -k 0 --max-seqs 300 "));
        assert!(rendered.contains("--threads 4 "));
        assert!(rendered.ends_with("-v 3 "));
        assert_eq!(params.len(), PREFILTER.len());
    }

    #[test]
    fn test_only_explicit_flavor() {
        let config = SearchConfig::builder()
            .set(OptionId::Sensitivity, |o| o.sensitivity = 7.5)
            .set(OptionId::EvalThreshold, |o| o.eval_threshold = 10.0)
            .build()
            .unwrap();
        let params = StageParameters::from_config(&config, ParameterGroup::Prefilter, RenderFlavor::OnlyExplicit);
        // -e is not a prefilter option
        assert_eq!(params.render(), "-s 7.5 ");
    }

    #[test]
    fn test_without_removes_option() {
        let params = StageParameters::full(&SearchConfig::default(), ParameterGroup::Prefilter)
            .without(OptionId::Sensitivity);
        assert!(!params.contains(OptionId::Sensitivity));
        assert!(params.contains(OptionId::KmerSize));
        assert!(!params.render().contains("-s "));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let params = StageParameters::full(&SearchConfig::default(), ParameterGroup::Workflow);
        assert!(!params.contains(OptionId::Runner));
        assert_eq!(params.len(), OptionId::ALL.len() - 1);
    }

    #[test]
    fn test_every_group_flag_exists_once() {
        for group in [
            ParameterGroup::Prefilter,
            ParameterGroup::Align,
            ParameterGroup::RescoreDiagonal,
            ParameterGroup::SwapResults,
            ParameterGroup::ResultToProfile,
            ParameterGroup::SubtractDbs,
            ParameterGroup::ExtractOrfs,
            ParameterGroup::TranslateNucs,
        ] {
            let ids = group.options();
            let mut unique = ids.to_vec();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), ids.len(), "duplicate option in {:?}", group);
        }
    }
}
