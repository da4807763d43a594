//! Pipeline topology selection.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::options::SearchOptions;
use crate::types::DatabaseKinds;

/// The four mutually exclusive search pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseTopology {
    Plain,
    TargetProfile,
    SlicedTargetProfile,
    Iterative,
}

impl fmt::Display for BaseTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseTopology::Plain => "plain search",
            BaseTopology::TargetProfile => "target-profile search",
            BaseTopology::SlicedTargetProfile => "sliced target-profile search",
            BaseTopology::Iterative => "iterative profile search",
        };
        f.write_str(name)
    }
}

/// Which sides of a translated search carry nucleotides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedSides {
    pub query_nucleotide: bool,
    pub target_nucleotide: bool,
}

/// A base topology, optionally wrapped by ORF extraction and translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub base: BaseTopology,
    pub translated: Option<TranslatedSides>,
}

impl Topology {
    pub fn is_translated(&self) -> bool {
        self.translated.is_some()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.translated {
            Some(_) => write!(f, "translated {}", self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Choose the topology for an already validated pair.
pub fn select_topology(kinds: DatabaseKinds, options: &SearchOptions) -> Topology {
    let base = if kinds.target.is_profile() && options.slice_search {
        BaseTopology::SlicedTargetProfile
    } else if kinds.target.is_profile() {
        BaseTopology::TargetProfile
    } else if options.num_iterations > 1 {
        BaseTopology::Iterative
    } else {
        BaseTopology::Plain
    };

    let translated = kinds.is_translated().then_some(TranslatedSides {
        query_nucleotide: kinds.query.is_nucleotide(),
        target_nucleotide: kinds.target.is_nucleotide(),
    });

    Topology { base, translated }
}
