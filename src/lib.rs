pub mod constants;
pub mod drifter;
pub mod geodesy;
pub mod simulation;
pub mod skill;
pub mod skill_errors;
pub mod time;

pub use constants::DrifterId;
pub use drifter::{get_drifter_data, DrifterData, Trajectory};
pub use simulation::{RunId, RunSource, SimulationRun};
pub use skill::{evaluate_skill, run_skill_analysis, SkillAnalysis, SkillParams, SkillTable};
pub use skill_errors::SkillError;
