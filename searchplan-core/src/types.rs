//! Shared vocabulary: sequence kinds and alignment/rescoring modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of data stored in a sequence database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    AminoAcid,
    Nucleotide,
    Profile,
    ProfileStateSequence,
}

impl SequenceKind {
    /// Map a `.dbtype` type code (low 16 bits already extracted) to a kind.
    pub fn from_type_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(SequenceKind::AminoAcid),
            1 => Some(SequenceKind::Nucleotide),
            2 => Some(SequenceKind::Profile),
            3 => Some(SequenceKind::ProfileStateSequence),
            _ => None,
        }
    }

    pub fn type_code(self) -> u16 {
        match self {
            SequenceKind::AminoAcid => 0,
            SequenceKind::Nucleotide => 1,
            SequenceKind::Profile => 2,
            SequenceKind::ProfileStateSequence => 3,
        }
    }

    pub fn is_profile(self) -> bool {
        self == SequenceKind::Profile
    }

    pub fn is_nucleotide(self) -> bool {
        self == SequenceKind::Nucleotide
    }

    pub const ALL: [SequenceKind; 4] = [
        SequenceKind::AminoAcid,
        SequenceKind::Nucleotide,
        SequenceKind::Profile,
        SequenceKind::ProfileStateSequence,
    ];
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::AminoAcid => "amino acid",
            SequenceKind::Nucleotide => "nucleotide",
            SequenceKind::Profile => "profile",
            SequenceKind::ProfileStateSequence => "profile state sequence",
        };
        f.write_str(name)
    }
}

/// Classified query/target pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseKinds {
    pub query: SequenceKind,
    pub target: SequenceKind,
}

impl DatabaseKinds {
    pub fn new(query: SequenceKind, target: SequenceKind) -> Self {
        Self { query, target }
    }

    /// Either side is nucleotide, so the search runs on translated frames.
    pub fn is_translated(&self) -> bool {
        self.query.is_nucleotide() || self.target.is_nucleotide()
    }
}

/// Alignment mode passed to the alignment stage (`--alignment-mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentMode {
    Auto,
    ScoreOnly,
    #[default]
    ScoreCoverage,
    ScoreCoverageSeqId,
    Ungapped,
}

impl AlignmentMode {
    pub fn code(self) -> u8 {
        match self {
            AlignmentMode::Auto => 0,
            AlignmentMode::ScoreOnly => 1,
            AlignmentMode::ScoreCoverage => 2,
            AlignmentMode::ScoreCoverageSeqId => 3,
            AlignmentMode::Ungapped => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AlignmentMode::Auto),
            1 => Some(AlignmentMode::ScoreOnly),
            2 => Some(AlignmentMode::ScoreCoverage),
            3 => Some(AlignmentMode::ScoreCoverageSeqId),
            4 => Some(AlignmentMode::Ungapped),
            _ => None,
        }
    }

    pub fn is_ungapped(self) -> bool {
        self == AlignmentMode::Ungapped
    }
}

/// Rescoring mode of the ungapped diagonal rescoring stage (`--rescore-mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RescoreMode {
    #[default]
    Hamming,
    Substitution,
    Alignment,
    EndToEndAlignment,
    WindowQualityAlignment,
}

impl RescoreMode {
    pub fn code(self) -> u8 {
        match self {
            RescoreMode::Hamming => 0,
            RescoreMode::Substitution => 1,
            RescoreMode::Alignment => 2,
            RescoreMode::EndToEndAlignment => 3,
            RescoreMode::WindowQualityAlignment => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RescoreMode::Hamming),
            1 => Some(RescoreMode::Substitution),
            2 => Some(RescoreMode::Alignment),
            3 => Some(RescoreMode::EndToEndAlignment),
            4 => Some(RescoreMode::WindowQualityAlignment),
            _ => None,
        }
    }
}
