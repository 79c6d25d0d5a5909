use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        errors::{BackendError, StorageError, StorageResult, ValidationError},
        models::{BucketSpec, VersioningConfiguration},
        value_objects::BucketName,
    },
    ports::storage::StorageBackend,
};

/// What reconciliation did for one declared bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileAction {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketOutcome {
    pub bucket: String,
    pub action: ReconcileAction,
}

/// Result of reconciling a whole set of bucket declarations
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub outcomes: Vec<BucketOutcome>,
    pub failures: Vec<StorageError>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the buckets created by this run
    pub fn created(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.action == ReconcileAction::Created)
            .map(|outcome| outcome.bucket.as_str())
    }

    /// Fail with every recorded bucket failure, if any
    pub fn into_result(self) -> StorageResult<Vec<BucketOutcome>> {
        if self.failures.is_empty() {
            Ok(self.outcomes)
        } else {
            Err(StorageError::Reconciliation {
                failures: self.failures,
            })
        }
    }
}

/// Converges the backend to a list of declared buckets.
///
/// Buckets are handled one after another. Within a bucket the steps run in
/// a fixed order: create, versioning, retention, policies. Object lock can
/// only be enabled at creation, so an existing bucket is never touched.
#[derive(Clone)]
pub struct BucketReconciler {
    backend: Arc<dyn StorageBackend>,
}

impl BucketReconciler {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Reconcile every declared bucket in order.
    ///
    /// A failing bucket does not stop the run; its error is collected in the
    /// report and the next bucket is processed.
    pub async fn reconcile(&self, specs: &[BucketSpec]) -> ReconcileReport {
        info!(count = specs.len(), "Reconciling declared buckets");

        let mut report = ReconcileReport::default();
        for spec in specs {
            match self.reconcile_bucket(spec).await {
                Ok(action) => report.outcomes.push(BucketOutcome {
                    bucket: spec.name.clone(),
                    action,
                }),
                Err(err) => {
                    error!(bucket = %spec.name, error = %err, "Bucket reconciliation failed");
                    report.failures.push(err);
                }
            }
        }

        info!(
            created = report.created().count(),
            failed = report.failures.len(),
            "Bucket reconciliation finished"
        );
        report
    }

    /// Reconcile one declared bucket, stopping at the first failing step
    pub async fn reconcile_bucket(&self, spec: &BucketSpec) -> StorageResult<ReconcileAction> {
        let invalid = |err: ValidationError| {
            StorageError::bucket_creation(&spec.name)(BackendError::from(err))
        };
        let name = BucketName::new(spec.name.as_str()).map_err(invalid)?;
        let bucket = name.as_str();

        let exists = self
            .backend
            .bucket_exists(bucket)
            .await
            .map_err(StorageError::bucket_creation(bucket))?;
        if exists {
            debug!(bucket, "Bucket already exists, leaving it untouched");
            return Ok(ReconcileAction::AlreadyExists);
        }

        // Retention is only checked for buckets that are about to be created
        spec.validate().map_err(invalid)?;

        let object_lock = spec.effective_object_lock();
        self.backend
            .make_bucket(bucket, object_lock)
            .await
            .map_err(StorageError::bucket_creation(bucket))?;
        debug!(bucket, object_lock, "Bucket created");

        if spec.effective_versioning() {
            self.backend
                .set_bucket_versioning(bucket, &VersioningConfiguration::enabled())
                .await
                .map_err(StorageError::bucket_creation(bucket))?;
            debug!(bucket, "Versioning enabled");
        }

        match spec.object_lock_configuration() {
            Some(config) => {
                self.backend
                    .set_object_lock_configuration(bucket, &config)
                    .await
                    .map_err(StorageError::bucket_creation(bucket))?;
                debug!(
                    bucket,
                    mode = %config.mode,
                    duration = %config.duration,
                    "Default retention applied"
                );
            }
            None if spec.retention.enabled => {
                warn!(
                    bucket,
                    mode = ?spec.retention.mode,
                    "Retention enabled without a recognized mode and duration, skipping it"
                );
            }
            None => {}
        }

        for (index, policy) in spec.policies.iter().enumerate() {
            self.backend
                .set_bucket_policy(bucket, policy)
                .await
                .map_err(StorageError::bucket_creation(bucket))?;
            debug!(bucket, index, "Bucket policy applied");
        }

        info!(
            bucket,
            versioning = spec.effective_versioning(),
            object_lock,
            policies = spec.policies.len(),
            "Declared bucket provisioned"
        );
        Ok(ReconcileAction::Created)
    }
}
