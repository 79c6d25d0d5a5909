// Infrastructure error conversions
pub mod error;

// Backend implementations
pub mod memory;
pub mod s3;

// Re-export key types
pub use memory::{BackendCall, CallKind, InMemoryBackend};
pub use s3::{ConnectionConfig, ProxyConfig, ProxySettings, ProxyType, S3Client};
