//! Rejection of unsupported database/mode combinations.
//!
//! Rules are checked in a fixed order and the first match wins, so the
//! reported reason is deterministic when several rules apply.

use std::fmt;

use crate::options::{OptionId, SearchConfig};
use crate::types::{DatabaseKinds, SequenceKind};

/// Why a combination of inputs cannot be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ProfileProfile,
    NucleotideNucleotide,
    UngappedWithProfile,
    IterativeTargetProfile,
    RealignQueryProfile,
}

impl Rejection {
    /// 1-based position in the rule table.
    pub fn rule(self) -> u8 {
        match self {
            Rejection::ProfileProfile => 1,
            Rejection::NucleotideNucleotide => 2,
            Rejection::UngappedWithProfile => 3,
            Rejection::IterativeTargetProfile => 4,
            Rejection::RealignQueryProfile => 5,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::ProfileProfile => "Profile-profile searches are not supported",
            Rejection::NucleotideNucleotide => "Nucleotide-nucleotide searches are not supported",
            Rejection::UngappedWithProfile => {
                "Cannot use ungapped alignment mode with profile databases"
            }
            Rejection::IterativeTargetProfile => {
                "Iterative target-profile searches are not supported"
            }
            Rejection::RealignQueryProfile => "Cannot realign query profiles",
        };
        f.write_str(reason)
    }
}

impl std::error::Error for Rejection {}

/// Check the classified pair against the rule table.
pub fn validate(kinds: DatabaseKinds, config: &SearchConfig) -> Result<(), Rejection> {
    let options = config.options();
    let query_profile = kinds.query == SequenceKind::Profile;
    let target_profile = kinds.target == SequenceKind::Profile;
    let iterative = options.num_iterations > 1;

    if query_profile && target_profile {
        return Err(Rejection::ProfileProfile);
    }
    if kinds.query == SequenceKind::Nucleotide && kinds.target == SequenceKind::Nucleotide {
        return Err(Rejection::NucleotideNucleotide);
    }
    if options.alignment_mode.is_ungapped() && (query_profile || target_profile) {
        return Err(Rejection::UngappedWithProfile);
    }
    if iterative && target_profile {
        return Err(Rejection::IterativeTargetProfile);
    }
    if iterative && query_profile && config.is_explicit(OptionId::Realign) && options.realign {
        return Err(Rejection::RealignQueryProfile);
    }
    Ok(())
}
