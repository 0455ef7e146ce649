pub mod args;
pub mod publisher;
pub mod state;

pub use args::{DEFAULT_BUMP, PublishArgs, is_valid_bump};
pub use publisher::{PipelineOptions, PublishOutcome, PublishPipeline, PublishReport, publish};
pub use state::{PipelineState, StateTracker, StateTransition};
