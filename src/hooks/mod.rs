mod registry;
mod run;

pub use registry::{HookEntry, HookEvent, HookRegistry};
pub use run::{HookInput, PlannedCheckpoint, plan_checkpoint, run_checkpoint};
