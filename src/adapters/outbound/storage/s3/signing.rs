//! AWS Signature Version 4 for S3 requests.
//!
//! Headers are signed as they are at signing time, so every header that must
//! be covered (content type, Content-MD5, `x-amz-meta-*`) has to be set first.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, HOST};
use http::Method;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

use crate::domain::errors::{BackendError, BackendResult};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Payload hash used for streamed bodies whose digest is not known upfront
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Hash of an empty body
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const X_AMZ_DATE: &str = "x-amz-date";
const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";

/// Unreserved characters are left alone, everything else is encoded
pub(crate) const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Lowercase hex SHA-256 of a payload
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Signs requests with a static access key pair
#[derive(Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    region: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key", &self.access_key)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Add `host`, `x-amz-date`, `x-amz-content-sha256` and `authorization`
    /// to `headers`
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        headers: &mut HeaderMap,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> BackendResult<()> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        headers.insert(HOST, header_value(&host_header(url)?)?);
        headers.insert(
            HeaderName::from_static(X_AMZ_DATE),
            header_value(&amz_date)?,
        );
        headers.insert(
            HeaderName::from_static(X_AMZ_CONTENT_SHA256),
            header_value(payload_hash)?,
        );

        let mut canonical_headers = BTreeMap::new();
        for (name, value) in headers.iter() {
            let value = value
                .to_str()
                .map_err(|err| BackendError::Signing(format!("header {}: {}", name, err)))?;
            canonical_headers.insert(name.as_str().to_string(), value.to_string());
        }

        let (canonical, signed_headers) = canonical_request(
            method.as_str(),
            url.path(),
            url.query().unwrap_or(""),
            &canonical_headers,
            payload_hash,
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = string_to_sign(&amz_date, &scope, &canonical);
        let key = signing_key(&self.secret_key, &date, &self.region)?;
        let signature = signature(&key, &string_to_sign)?;

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, scope, signed_headers, signature
        );
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        Ok(())
    }
}

fn header_value(value: &str) -> BackendResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| BackendError::Signing(err.to_string()))
}

fn host_header(url: &Url) -> BackendResult<String> {
    let host = url
        .host_str()
        .ok_or_else(|| BackendError::Signing(format!("URL without host: {}", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Encode each path segment once, keeping the separators
pub(crate) fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(query: &str) -> String {
    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical request and the signed header list.
///
/// `headers` must be keyed by lowercase header name.
pub(crate) fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> (String, String) {
    let canonical_headers = headers
        .iter()
        .map(|(name, value)| {
            let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{}:{}\n", name, collapsed)
        })
        .collect::<String>();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_uri(path),
        canonical_query(query),
        canonical_headers,
        signed_headers,
        payload_hash
    );
    (canonical, signed_headers)
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hash_payload(canonical_request.as_bytes())
    )
}

fn hmac(key: &[u8], data: &[u8]) -> BackendResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|err| BackendError::Signing(err.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn signing_key(secret_key: &str, date: &str, region: &str) -> BackendResult<Vec<u8>> {
    let date_key = hmac(format!("AWS4{}", secret_key).as_bytes(), date.as_bytes())?;
    let region_key = hmac(&date_key, region.as_bytes())?;
    let service_key = hmac(&region_key, SERVICE.as_bytes())?;
    hmac(&service_key, b"aws4_request")
}

fn signature(signing_key: &[u8], string_to_sign: &str) -> BackendResult<String> {
    Ok(hex::encode(hmac(signing_key, string_to_sign.as_bytes())?))
}
