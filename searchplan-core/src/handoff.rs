//! Transfer of control to the execution engine.
//!
//! A successful hand-off never returns, which the `Infallible` success type
//! makes explicit: the only value an engine can hand back is an error.

use std::convert::Infallible;
use std::process::Command;

use crate::error::HandoffError;
use crate::plan::ExecutionPlan;

/// Something that can run an [`ExecutionPlan`] in place of this process
pub trait ExecutionEngine {
    fn execute(&self, plan: &ExecutionPlan) -> Result<Infallible, HandoffError>;
}

/// Replaces the current process with the plan's script.
///
/// Present variables are exported to the child, omitted ones are removed from
/// the inherited environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEngine;

impl ProcessEngine {
    pub fn command(plan: &ExecutionPlan) -> Command {
        let mut command = Command::new(&plan.program);
        command.args(&plan.filenames);
        for (name, value) in plan.variables.iter() {
            match value {
                Some(value) => {
                    command.env(name, value);
                }
                None => {
                    command.env_remove(name);
                }
            }
        }
        command
    }
}

impl ExecutionEngine for ProcessEngine {
    #[cfg(unix)]
    fn execute(&self, plan: &ExecutionPlan) -> Result<Infallible, HandoffError> {
        use std::os::unix::process::CommandExt;

        log::info!("Handing off to {}", plan.program.display());
        let source = Self::command(plan).exec();
        Err(HandoffError::Exec {
            program: plan.program.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    fn execute(&self, _plan: &ExecutionPlan) -> Result<Infallible, HandoffError> {
        Err(HandoffError::Unsupported)
    }
}

/// Hand `plan` to `engine`. Returns only on failure.
pub fn hand_off(engine: &dyn ExecutionEngine, plan: &ExecutionPlan) -> HandoffError {
    match engine.execute(plan) {
        Ok(never) => match never {},
        Err(err) => err,
    }
}
