//! searchplan core library
//!
//! Database classification, compatibility checks, defaults resolution,
//! topology selection and stage planning for multi-stage sequence searches.

pub mod types;
pub mod error;
pub mod dbtype;
pub mod options;
pub mod validate;
pub mod defaults;
pub mod topology;
pub mod params;
pub mod plan;
pub mod sysmem;
pub mod stages;
pub mod templates;
pub mod workdir;
pub mod emit;
pub mod handoff;
pub mod planner;

// Re-export commonly used types and functions
pub use types::{AlignmentMode, DatabaseKinds, RescoreMode, SequenceKind};
pub use error::{ErrorKind, HandoffError, PlanError, PlanResult};
pub use dbtype::{classify_database, DatabaseClassifier, DbTypeFileClassifier};
pub use options::{OptionId, SearchConfig, SearchConfigBuilder, SearchOptions};
pub use validate::{validate, Rejection};
pub use topology::{BaseTopology, Topology, TranslatedSides};
pub use plan::{ExecutionPlan, VariableMap};
pub use stages::SlicingSettings;
pub use workdir::{LocalWorkerGroup, SingleWorker, WorkerGroup};
pub use handoff::{hand_off, ExecutionEngine, ProcessEngine};
pub use planner::{Planner, PlannerSettings, SearchRequest};

/// Version information for the searchplan core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
