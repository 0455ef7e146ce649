pub mod npm_client;
pub mod npmrc;

pub use npm_client::NpmRegistryClient;
pub use npmrc::{DEFAULT_REGISTRY, NpmrcConfig};
