pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - bucket declarations, backend records and errors
pub use domain::{
    BackendError,
    BackendResult,
    BucketConfiguration,
    // Value objects
    BucketName,
    // Models
    BucketSpec,
    BucketState,
    ObjectKey,
    ObjectLockConfiguration,
    ObjectLockStatus,
    ObjectMetadata,
    ObjectStream,
    Operation,
    PutObjectRequest,
    RetentionDuration,
    RetentionMode,
    RetentionSpec,
    // Errors
    StorageError,
    StorageResult,
    ValidationError,
    VersioningConfiguration,
    VersioningStatus,
};

// Port types - interfaces for external systems
pub use ports::{BucketService, ObjectService, StorageBackend};

// Service implementations - business logic
pub use services::{BucketOutcome, BucketReconciler, ReconcileAction, ReconcileReport, StorageService};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, AppBuilder, AppConfig, AppError, AppServices,
    BackendKind,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{
    ConnectionConfig, InMemoryBackend, ProxyConfig, ProxySettings, ProxyType, S3Client,
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, AppBuilder, AppConfig, AppServices, BucketReconciler,
        BucketService, BucketSpec, ConnectionConfig, InMemoryBackend, ObjectService, S3Client,
        StorageBackend, StorageError, StorageService,
    };
}
