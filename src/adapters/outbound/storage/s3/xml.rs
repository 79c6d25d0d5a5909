//! XML bodies of the S3 bucket subresources.

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use std::io::Cursor;

use crate::domain::{
    errors::{BackendError, BackendResult},
    models::{
        BucketState, ObjectLockConfiguration, ObjectLockStatus, RetentionDuration, RetentionMode,
        VersioningConfiguration, VersioningStatus,
    },
};

const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

struct XmlBuilder {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlBuilder {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn root(&mut self, name: &str) -> BackendResult<&mut Self> {
        let mut start = BytesStart::new(name);
        start.push_attribute(("xmlns", S3_NAMESPACE));
        self.writer.write_event(Event::Start(start))?;
        Ok(self)
    }

    fn open(&mut self, name: &str) -> BackendResult<&mut Self> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(self)
    }

    fn close(&mut self, name: &str) -> BackendResult<&mut Self> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(self)
    }

    fn element(&mut self, name: &str, text: &str) -> BackendResult<&mut Self> {
        self.open(name)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> BackendResult<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|err| BackendError::Xml(err.to_string()))
    }
}

/// Body of a bucket creation outside the default region
pub fn create_bucket_configuration(region: &str) -> BackendResult<String> {
    let mut xml = XmlBuilder::new();
    xml.root("CreateBucketConfiguration")?
        .element("LocationConstraint", region)?
        .close("CreateBucketConfiguration")?;
    xml.finish()
}

pub fn versioning_configuration(config: &VersioningConfiguration) -> BackendResult<String> {
    let mut xml = XmlBuilder::new();
    xml.root("VersioningConfiguration")?
        .element("Status", config.status.as_str())?
        .close("VersioningConfiguration")?;
    xml.finish()
}

pub fn object_lock_configuration(config: &ObjectLockConfiguration) -> BackendResult<String> {
    let (unit, value) = match config.duration {
        RetentionDuration::Days(days) => ("Days", days),
        RetentionDuration::Years(years) => ("Years", years),
    };

    let mut xml = XmlBuilder::new();
    xml.root("ObjectLockConfiguration")?
        .element("ObjectLockEnabled", "Enabled")?
        .open("Rule")?
        .open("DefaultRetention")?
        .element("Mode", config.mode.as_str())?
        .element(unit, &value.to_string())?
        .close("DefaultRetention")?
        .close("Rule")?
        .close("ObjectLockConfiguration")?;
    xml.finish()
}

#[derive(Debug, Deserialize)]
struct ListAllMyBucketsResult {
    #[serde(rename = "Buckets", default)]
    buckets: Option<BucketList>,
}

#[derive(Debug, Deserialize)]
struct BucketList {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate", default)]
    creation_date: Option<String>,
}

pub fn parse_list_buckets(body: &str) -> BackendResult<Vec<BucketState>> {
    let result: ListAllMyBucketsResult = from_str(body)?;

    Ok(result
        .buckets
        .map(|list| list.bucket)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            let creation_date = entry
                .creation_date
                .as_deref()
                .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
                .map(|date| date.with_timezone(&Utc));
            BucketState::new(entry.name, creation_date)
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct VersioningResult {
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

/// `None` when versioning was never configured on the bucket
pub fn parse_versioning(body: &str) -> BackendResult<Option<VersioningStatus>> {
    let result: VersioningResult = from_str(body)?;
    Ok(result.status.as_deref().and_then(VersioningStatus::parse))
}

#[derive(Debug, Deserialize)]
struct ObjectLockResult {
    #[serde(rename = "ObjectLockEnabled", default)]
    enabled: Option<String>,
    #[serde(rename = "Rule", default)]
    rule: Option<ObjectLockRule>,
}

#[derive(Debug, Deserialize)]
struct ObjectLockRule {
    #[serde(rename = "DefaultRetention", default)]
    default_retention: Option<DefaultRetention>,
}

#[derive(Debug, Deserialize)]
struct DefaultRetention {
    #[serde(rename = "Mode", default)]
    mode: Option<String>,
    #[serde(rename = "Days", default)]
    days: Option<u32>,
    #[serde(rename = "Years", default)]
    years: Option<u32>,
}

pub fn parse_object_lock(body: &str) -> BackendResult<ObjectLockStatus> {
    let result: ObjectLockResult = from_str(body)?;

    let default_retention = result
        .rule
        .and_then(|rule| rule.default_retention)
        .and_then(|retention| {
            let mode = retention.mode.as_deref().and_then(RetentionMode::resolve)?;
            let duration = match (retention.days, retention.years) {
                (Some(days), _) => RetentionDuration::Days(days),
                (None, Some(years)) => RetentionDuration::Years(years),
                (None, None) => return None,
            };
            Some(ObjectLockConfiguration::new(mode, duration))
        });

    Ok(ObjectLockStatus {
        enabled: result.enabled.as_deref() == Some("Enabled"),
        default_retention,
    })
}

/// Code and message of an S3 error response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Parse an error document; `None` when the body is empty or not one
pub fn parse_error(body: &str) -> Option<ErrorBody> {
    if body.trim().is_empty() {
        return None;
    }
    from_str(body).ok()
}
