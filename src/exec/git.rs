//! Git implementation of the version-control port

use crate::core::traits::{ProcessRunner, RunContext, VersionControl};
use crate::exec::CommandError;
use async_trait::async_trait;
use std::sync::Arc;

/// Version control over the git CLI
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
}

impl GitCli {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn stage_all(&self, ctx: &RunContext) -> Result<(), CommandError> {
        self.runner
            .run("git", &["add".to_string(), ".".to_string()], ctx)
            .await
    }

    async fn commit(&self, ctx: &RunContext, message: &str) -> Result<(), CommandError> {
        self.runner
            .run(
                "git",
                &["commit".to_string(), "-m".to_string(), message.to_string()],
                ctx,
            )
            .await
    }
}
