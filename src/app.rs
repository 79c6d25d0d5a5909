use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::{
    adapters::outbound::storage::{ConnectionConfig, InMemoryBackend, S3Client},
    domain::{
        errors::StorageError,
        models::BucketSpec,
    },
    ports::storage::StorageBackend,
    services::{BucketOutcome, BucketReconciler, ReconcileReport, StorageService},
};

/// Which backend client the application talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    S3,
    Memory,
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "s3" | "minio" => Ok(BackendKind::S3),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => Err(AppError::Configuration {
                message: format!("Unknown storage backend: {}", other),
            }),
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Reconcile `buckets` when the application is built
    #[serde(default = "default_auto_create_buckets")]
    pub auto_create_buckets: bool,
    #[serde(default)]
    pub buckets: Vec<BucketSpec>,
}

fn default_auto_create_buckets() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            connection: ConnectionConfig::default(),
            auto_create_buckets: default_auto_create_buckets(),
            buckets: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        toml::from_str(content).map_err(|err| AppError::Configuration {
            message: format!("Invalid configuration: {}", err),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| AppError::Configuration {
            message: format!("Cannot read {}: {}", path.display(), err),
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `STORAGE_*` environment variables on top of the file values
    pub fn with_env_overrides(self) -> Result<Self, AppError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("STORAGE_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(url) = lookup("STORAGE_URL") {
            self.connection.url = url;
        }
        if let Some(access_key) = lookup("STORAGE_ACCESS_KEY") {
            self.connection.access_key = access_key;
        }
        if let Some(secret_key) = lookup("STORAGE_SECRET_KEY") {
            self.connection.secret_key = secret_key;
        }
        if let Some(region) = lookup("STORAGE_REGION") {
            self.connection.region = region;
        }
        Ok(self)
    }
}

/// Application services container
pub struct AppServices {
    pub backend: Arc<dyn StorageBackend>,
    pub storage: StorageService,
    pub reconciler: BucketReconciler,
    /// Outcome of start-up reconciliation; `None` when it was disabled
    pub report: Option<ReconcileReport>,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    backend: Option<Arc<dyn StorageBackend>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            backend: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already constructed backend instead of building one from the config
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_buckets(mut self, buckets: Vec<BucketSpec>) -> Self {
        self.config.buckets = buckets;
        self
    }

    /// Build the backend client described by the configuration
    pub fn build_backend(&self) -> Result<Arc<dyn StorageBackend>, AppError> {
        if let Some(backend) = &self.backend {
            return Ok(backend.clone());
        }

        match self.config.backend {
            BackendKind::S3 => {
                let client = S3Client::connect(&self.config.connection)
                    .map_err(AppError::StorageInit)?;
                Ok(Arc::new(client))
            }
            BackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
        }
    }

    /// Build the application, provisioning declared buckets first.
    ///
    /// Any bucket that fails to reconcile fails the build, after every other
    /// bucket has been attempted.
    pub async fn build(self) -> Result<AppServices, AppError> {
        let backend = self.build_backend()?;
        let reconciler = BucketReconciler::new(backend.clone());

        let report = if self.config.auto_create_buckets {
            let report = reconciler.reconcile(&self.config.buckets).await;
            if !report.is_success() {
                return Err(AppError::Provisioning {
                    source: StorageError::Reconciliation {
                        failures: report.failures,
                    },
                    outcomes: report.outcomes,
                });
            }
            Some(report)
        } else {
            info!("Automatic bucket creation disabled");
            None
        };

        Ok(AppServices {
            storage: StorageService::new(backend.clone()),
            reconciler,
            backend,
            report,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {0}")]
    StorageInit(#[source] StorageError),

    /// `outcomes` lists the buckets that were reconciled before failing
    #[error("Bucket provisioning failed: {source}")]
    Provisioning {
        #[source]
        source: StorageError,
        outcomes: Vec<BucketOutcome>,
    },
}

impl AppError {
    /// The underlying storage error, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            AppError::StorageInit(err) | AppError::Provisioning { source: err, .. } => Some(err),
            AppError::Configuration { .. } => None,
        }
    }
}

/// Create an in-memory application for testing and development
pub async fn create_in_memory_app(buckets: Vec<BucketSpec>) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(AppConfig {
            backend: BackendKind::Memory,
            ..AppConfig::default()
        })
        .with_buckets(buckets)
        .build()
        .await
}

/// Create application from `STORAGE_CONFIG` (a TOML file) and `STORAGE_*` variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    let config = match std::env::var("STORAGE_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?,
        Err(_) => AppConfig::default(),
    };

    AppBuilder::new()
        .with_config(config.with_env_overrides()?)
        .build()
        .await
}
