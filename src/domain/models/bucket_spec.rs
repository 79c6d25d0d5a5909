use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::ValidationError,
    models::retention::{ObjectLockConfiguration, RetentionDuration, RetentionMode},
    value_objects::BucketName,
};

/// Declarative description of a bucket that must exist on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,

    #[serde(default)]
    pub versioning: bool,

    #[serde(default)]
    pub object_locking: bool,

    #[serde(default)]
    pub retention: RetentionSpec,

    /// Policy documents, applied in order
    #[serde(default)]
    pub policies: Vec<String>,
}

/// Retention block of a bucket declaration.
///
/// Mode and unit are kept as raw strings so that an unknown value resolves to
/// "no retention" instead of rejecting the whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionSpec {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub duration: Option<RetentionDurationSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionDurationSpec {
    pub unit: String,
    pub value: u32,
}

impl RetentionSpec {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(mode: &str, unit: &str, value: u32) -> Self {
        Self {
            enabled: true,
            mode: Some(mode.to_string()),
            duration: Some(RetentionDurationSpec {
                unit: unit.to_string(),
                value,
            }),
        }
    }

    pub fn resolve_mode(&self) -> Option<RetentionMode> {
        self.mode.as_deref().and_then(RetentionMode::resolve)
    }

    pub fn resolve_duration(&self) -> Option<RetentionDuration> {
        self.duration
            .as_ref()
            .and_then(|duration| RetentionDuration::resolve(&duration.unit, duration.value))
    }
}

impl BucketSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versioning: false,
            object_locking: false,
            retention: RetentionSpec::disabled(),
            policies: Vec::new(),
        }
    }

    pub fn with_versioning(mut self, versioning: bool) -> Self {
        self.versioning = versioning;
        self
    }

    pub fn with_object_locking(mut self, object_locking: bool) -> Self {
        self.object_locking = object_locking;
        self
    }

    pub fn with_retention(mut self, retention: RetentionSpec) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policies.push(policy.into());
        self
    }

    /// Object lock can only be switched on when the bucket is created
    pub fn effective_object_lock(&self) -> bool {
        self.object_locking || self.retention.enabled
    }

    /// Object lock requires versioning on the backend
    pub fn effective_versioning(&self) -> bool {
        self.versioning || self.effective_object_lock()
    }

    /// The retention rule to apply, if retention is enabled and fully resolvable
    pub fn object_lock_configuration(&self) -> Option<ObjectLockConfiguration> {
        if !self.retention.enabled {
            return None;
        }

        let mode = self.retention.resolve_mode()?;
        let duration = self.retention.resolve_duration()?;
        Some(ObjectLockConfiguration::new(mode, duration))
    }

    /// Check the parts of the declaration that can be verified locally
    pub fn validate(&self) -> Result<BucketName, ValidationError> {
        let name = BucketName::new(self.name.as_str())?;

        if let Some(duration) = self.object_lock_configuration().map(|c| c.duration) {
            if duration.value() == 0 {
                return Err(ValidationError::InvalidField {
                    field: "retention.duration.value".to_string(),
                    value: duration.value().to_string(),
                    expected: "a positive integer".to_string(),
                });
            }
        }

        Ok(name)
    }
}
