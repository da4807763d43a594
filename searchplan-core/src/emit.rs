//! Script materialization and plan assembly.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{PlanError, PlanResult};
use crate::plan::{ExecutionPlan, VariableMap};
use crate::templates::ScriptTemplate;
use crate::topology::Topology;

/// Write `template` into `dir` and return its path.
///
/// The body goes to a private temporary file first and is persisted into
/// place, so workers emitting the same plan never observe a partially written
/// script. The temporary file is removed if any step fails.
pub fn write_template(dir: &Path, template: ScriptTemplate) -> PlanResult<PathBuf> {
    let path = dir.join(template.file_name());
    let to_error = |source| PlanError::ScriptWrite {
        path: path.clone(),
        source,
    };

    let mut staging = NamedTempFile::new_in(dir).map_err(to_error)?;
    staging.write_all(template.body().as_bytes()).map_err(to_error)?;
    staging.as_file().sync_all().map_err(to_error)?;
    make_executable(staging.as_file()).map_err(to_error)?;
    staging.persist(&path).map_err(|err| to_error(err.error))?;

    log::debug!("Wrote {} ({} bytes)", path.display(), template.len());
    Ok(path)
}

#[cfg(unix)]
fn make_executable(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// Materialize the scripts for `topology` and assemble the final plan.
///
/// `filenames` are the positional arguments; the last one (the base
/// temporary directory) is replaced by `working_dir`.
pub fn emit_plan(
    working_dir: PathBuf,
    topology: Topology,
    mut variables: VariableMap,
    mut filenames: Vec<PathBuf>,
) -> PlanResult<ExecutionPlan> {
    if filenames.pop().is_none() {
        return Err(PlanError::MissingTmpDir);
    }
    filenames.push(working_dir.clone());

    let base_template = ScriptTemplate::for_base(topology.base);
    let mut program = write_template(&working_dir, base_template)?;
    let mut template = base_template;

    if topology.is_translated() {
        let wrapper = write_template(&working_dir, ScriptTemplate::TranslatedSearch)?;
        variables.set("SEARCH", program.to_string_lossy().into_owned());
        program = wrapper;
        template = ScriptTemplate::TranslatedSearch;
    }

    Ok(ExecutionPlan {
        working_dir,
        topology,
        template,
        program,
        variables,
        filenames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{BaseTopology, TranslatedSides};
    use tempfile::TempDir;

    fn plain() -> Topology {
        Topology { base: BaseTopology::Plain, translated: None }
    }

    #[test]
    fn test_write_template_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), ScriptTemplate::Iterative).unwrap();
        assert_eq!(path, dir.path().join("iterative_search.sh"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ScriptTemplate::Iterative.body());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
        // no staging files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        // a directory squatting on the script name makes the final rename fail
        std::fs::create_dir(dir.path().join("search.sh")).unwrap();
        std::fs::write(dir.path().join("search.sh").join("keep"), b"x").unwrap();

        let err = write_template(dir.path(), ScriptTemplate::Plain).unwrap_err();
        match err {
            PlanError::ScriptWrite { path, .. } => assert_eq!(path, dir.path().join("search.sh")),
            other => panic!("expected a script write error, got {:?}", other),
        }
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("search.sh")]);
    }

    #[test]
    fn test_emit_replaces_tmp_dir() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().to_path_buf();
        let filenames = vec![PathBuf::from("q"), PathBuf::from("t"), PathBuf::from("r"), PathBuf::from("/base")];
        let plan = emit_plan(run.clone(), plain(), VariableMap::new(), filenames).unwrap();
        assert_eq!(plan.filenames.last(), Some(&run));
        assert_eq!(plan.filenames.len(), 4);
        assert_eq!(plan.program, run.join("search.sh"));
        assert_eq!(plan.template, ScriptTemplate::Plain);
        assert!(!plan.variables.contains("SEARCH"));
    }

    #[test]
    fn test_emit_translated_wraps_inner_program() {
        let dir = TempDir::new().unwrap();
        let run = dir.path().to_path_buf();
        let topology = Topology {
            base: BaseTopology::Plain,
            translated: Some(TranslatedSides { query_nucleotide: true, target_nucleotide: false }),
        };
        let filenames = vec![PathBuf::from("q"), PathBuf::from("t"), PathBuf::from("r"), PathBuf::from("/base")];
        let plan = emit_plan(run.clone(), topology, VariableMap::new(), filenames).unwrap();
        assert_eq!(plan.program, run.join("translated_search.sh"));
        assert_eq!(plan.template, ScriptTemplate::TranslatedSearch);
        let inner = run.join("search.sh");
        assert_eq!(plan.variables.get("SEARCH"), Some(inner.to_string_lossy().as_ref()));
        assert!(inner.is_file());
    }

    #[test]
    fn test_emit_without_filenames() {
        let dir = TempDir::new().unwrap();
        let err = emit_plan(dir.path().to_path_buf(), plain(), VariableMap::new(), vec![]).unwrap_err();
        assert!(matches!(err, PlanError::MissingTmpDir));
    }
}
