//! Search command implementation - plan the search and hand off to the script

use anyhow::Result;

use searchplan_core::{hand_off, Planner, ProcessEngine, SingleWorker};

use super::{build_request, SearchArgs};
use crate::config::Config;
use crate::error::CliError;

pub fn execute(config: &Config, args: SearchArgs) -> Result<()> {
    log::info!("Planning search of {} against {}", args.query_db.display(), args.target_db.display());

    let request = build_request(config, args)?;
    let planner = Planner::new(config.planner_settings());
    let plan = planner.plan(&request, &SingleWorker).map_err(CliError::from)?;

    log::info!("Running {} ({})", plan.program.display(), plan.topology);
    let err = hand_off(&ProcessEngine, &plan);
    Err(CliError::from(err).into())
}
