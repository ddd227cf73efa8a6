pub mod pipeline;
pub mod run_log;
pub mod scout;
pub mod sinks;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use pipeline::{PipelineConfig, RunState, StageError};
pub use scout::{RunOutcome, Scout, ScoutStats};
