pub mod config;
pub mod error;
pub mod manifest;
pub mod traits;

pub use config::{AutoPublishConfig, CONFIG_FILENAME};
pub use error::{PublishError, RegistryError};
pub use manifest::{MANIFEST_FILE, PackageManifest};
pub use traits::{
    ProcessRunner, PublishedRelease, RegistryClient, RunContext, StdioMode, VersionControl,
    remove_dir_recursive,
};
