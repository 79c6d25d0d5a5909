use serde::{Deserialize, Serialize};

/// Object lock retention mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetentionMode {
    /// Privileged users may shorten or lift the retention
    Governance,
    /// Nobody can shorten or lift the retention
    Compliance,
}

impl RetentionMode {
    /// Resolve a configured mode; anything but the exact wire names is unresolved
    pub fn resolve(value: &str) -> Option<Self> {
        match value {
            "GOVERNANCE" => Some(RetentionMode::Governance),
            "COMPLIANCE" => Some(RetentionMode::Compliance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionMode::Governance => "GOVERNANCE",
            RetentionMode::Compliance => "COMPLIANCE",
        }
    }
}

impl std::fmt::Display for RetentionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default retention period of an object lock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetentionDuration {
    Days(u32),
    Years(u32),
}

impl RetentionDuration {
    /// Resolve a configured unit; only `DAYS` and `YEARS` are recognized
    pub fn resolve(unit: &str, value: u32) -> Option<Self> {
        match unit {
            "DAYS" => Some(RetentionDuration::Days(value)),
            "YEARS" => Some(RetentionDuration::Years(value)),
            _ => None,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            RetentionDuration::Days(_) => "DAYS",
            RetentionDuration::Years(_) => "YEARS",
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            RetentionDuration::Days(value) | RetentionDuration::Years(value) => *value,
        }
    }
}

impl std::fmt::Display for RetentionDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value(), self.unit())
    }
}

/// Default retention rule applied to new object versions of a locked bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLockConfiguration {
    pub mode: RetentionMode,
    pub duration: RetentionDuration,
}

impl ObjectLockConfiguration {
    pub fn new(mode: RetentionMode, duration: RetentionDuration) -> Self {
        Self { mode, duration }
    }
}

/// Object lock state observed on a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectLockStatus {
    pub enabled: bool,
    pub default_retention: Option<ObjectLockConfiguration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersioningStatus {
    Enabled,
    Suspended,
}

impl VersioningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersioningStatus::Enabled => "Enabled",
            VersioningStatus::Suspended => "Suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Enabled" => Some(VersioningStatus::Enabled),
            "Suspended" => Some(VersioningStatus::Suspended),
            _ => None,
        }
    }
}

/// Bucket versioning configuration sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningConfiguration {
    pub status: VersioningStatus,
}

impl VersioningConfiguration {
    pub fn enabled() -> Self {
        Self {
            status: VersioningStatus::Enabled,
        }
    }
}
