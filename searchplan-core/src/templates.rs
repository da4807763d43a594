//! Embedded workflow scripts.

use serde::Serialize;

use crate::topology::BaseTopology;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScriptTemplate {
    Plain,
    TargetProfile,
    SlicedTargetProfile,
    Iterative,
    TranslatedSearch,
}

impl ScriptTemplate {
    pub fn for_base(base: BaseTopology) -> Self {
        match base {
            BaseTopology::Plain => ScriptTemplate::Plain,
            BaseTopology::TargetProfile => ScriptTemplate::TargetProfile,
            BaseTopology::SlicedTargetProfile => ScriptTemplate::SlicedTargetProfile,
            BaseTopology::Iterative => ScriptTemplate::Iterative,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ScriptTemplate::Plain => "search.sh",
            ScriptTemplate::TargetProfile => "target_profile_search.sh",
            ScriptTemplate::SlicedTargetProfile => "sliced_target_profile_search.sh",
            ScriptTemplate::Iterative => "iterative_search.sh",
            ScriptTemplate::TranslatedSearch => "translated_search.sh",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            ScriptTemplate::Plain => include_str!("../templates/search.sh"),
            ScriptTemplate::TargetProfile => include_str!("../templates/target_profile_search.sh"),
            ScriptTemplate::SlicedTargetProfile => {
                include_str!("../templates/sliced_target_profile_search.sh")
            }
            ScriptTemplate::Iterative => include_str!("../templates/iterative_search.sh"),
            ScriptTemplate::TranslatedSearch => include_str!("../templates/translated_search.sh"),
        }
    }

    pub fn len(self) -> usize {
        self.body().len()
    }

    pub fn is_empty(self) -> bool {
        self.body().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ScriptTemplate; 5] = [
        ScriptTemplate::Plain,
        ScriptTemplate::TargetProfile,
        ScriptTemplate::SlicedTargetProfile,
        ScriptTemplate::Iterative,
        ScriptTemplate::TranslatedSearch,
    ];

    #[test]
    fn test_templates_are_shell_scripts() {
        for template in ALL {
            assert!(template.body().starts_with("#!/bin/sh"), "{:?}", template);
            assert!(template.file_name().ends_with(".sh"));
            assert!(!template.is_empty());
        }
    }

    #[test]
    fn test_templates_reference_their_variables() {
        assert!(ScriptTemplate::Plain.body().contains("$PREFILTER_PAR"));
        assert!(ScriptTemplate::Plain.body().contains("SENSE_"));
        assert!(ScriptTemplate::TargetProfile.body().contains("$SWAP_PAR"));
        assert!(ScriptTemplate::SlicedTargetProfile.body().contains("$AVAIL_MEM"));
        assert!(ScriptTemplate::Iterative.body().contains("PROFILE_PAR_"));
        assert!(ScriptTemplate::TranslatedSearch.body().contains("$SEARCH"));
    }
}
