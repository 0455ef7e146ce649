pub mod core;
pub mod detection;
pub mod exec;
pub mod pipeline;
pub mod registry;

pub use crate::core::{
    AutoPublishConfig, PackageManifest, ProcessRunner, PublishError, PublishedRelease,
    RegistryClient, RegistryError, RunContext, StdioMode, VersionControl,
};
pub use crate::detection::{ChangeDetector, ChangeResult, detect_changes};
pub use crate::exec::{CommandError, CommandRunner, GitCli};
pub use crate::pipeline::{
    PipelineOptions, PublishArgs, PublishOutcome, PublishPipeline, PublishReport, publish,
};
pub use crate::registry::NpmRegistryClient;
