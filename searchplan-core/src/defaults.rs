//! Classification-dependent defaults.
//!
//! Each patch names the option it writes and only applies when that option
//! is absent from the explicit set, so user values always survive. Patches
//! never add to the explicit set, which makes resolution idempotent.

use crate::options::{OptionId, SearchConfig, SearchOptions};
use crate::types::DatabaseKinds;

/// k-mer size used against profile targets.
pub const TARGET_PROFILE_KMER_SIZE: u32 = 5;

/// Inclusion threshold for building profiles between iterations.
pub const ITERATIVE_PROFILE_EVALUE: f64 = 0.1;

struct ConditionalPatch {
    option: OptionId,
    description: &'static str,
    applies: fn(DatabaseKinds, &SearchOptions) -> bool,
    apply: fn(&mut SearchOptions),
}

const PATCHES: &[ConditionalPatch] = &[
    ConditionalPatch {
        option: OptionId::KmerSize,
        description: "smaller k-mer for profile targets",
        applies: |kinds, _| kinds.target.is_profile(),
        apply: |o| o.kmer_size = TARGET_PROFILE_KMER_SIZE,
    },
    ConditionalPatch {
        option: OptionId::AddBacktrace,
        description: "back-traces are needed to build profiles",
        applies: |_, o| o.num_iterations > 1,
        apply: |o| o.add_backtrace = true,
    },
    ConditionalPatch {
        option: OptionId::Realign,
        description: "query profiles are never realigned",
        applies: |kinds, o| o.num_iterations > 1 && kinds.query.is_profile(),
        apply: |o| o.realign = false,
    },
    ConditionalPatch {
        option: OptionId::ProfileEvalThreshold,
        description: "relaxed inclusion threshold between iterations",
        applies: |_, o| o.num_iterations > 1,
        apply: |o| o.profile_eval_threshold = ITERATIVE_PROFILE_EVALUE,
    },
];

/// Apply the classification-dependent defaults to `config`.
pub fn resolve_defaults(config: &SearchConfig, kinds: DatabaseKinds) -> SearchConfig {
    let mut resolved = config.clone();
    for patch in PATCHES {
        if resolved.is_explicit(patch.option) || !(patch.applies)(kinds, resolved.options()) {
            continue;
        }
        log::debug!("Default {} ({})", patch.option, patch.description);
        resolved = resolved.scoped(patch.apply);
    }
    resolved
}
