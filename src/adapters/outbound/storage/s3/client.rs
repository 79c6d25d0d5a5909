use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::Method;
use percent_encoding::utf8_percent_encode;
use reqwest::{Body, Client, Response};
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::config::{ConnectionConfig, DEFAULT_REGION};
use super::signing::{hash_payload, RequestSigner, EMPTY_PAYLOAD_SHA256, UNSIGNED_PAYLOAD, URI_ENCODE_SET};
use super::xml;
use crate::{
    adapters::outbound::storage::error::service_error,
    domain::{
        errors::{BackendError, BackendResult, StorageError, StorageResult, ValidationError},
        models::{
            BucketState, ObjectLockConfiguration, ObjectLockStatus, ObjectMetadata, ObjectStream,
            PutObjectRequest, VersioningConfiguration, VersioningStatus,
        },
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::StorageBackend,
};

const OBJECT_LOCK_HEADER: &str = "x-amz-bucket-object-lock-enabled";
const VERSION_ID_HEADER: &str = "x-amz-version-id";
const META_PREFIX: &str = "x-amz-meta-";
const CONTENT_MD5: &str = "content-md5";

enum Payload {
    Empty,
    Buffered(Bytes),
    Streamed { stream: ObjectStream, length: u64 },
}

/// S3 REST client using path-style addressing.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct S3Client {
    endpoint: Url,
    region: String,
    signer: RequestSigner,
    http_client: Client,
    write_timeout: Option<Duration>,
}

impl S3Client {
    /// Validate the connection settings and build the client.
    ///
    /// No request is sent; an unreachable endpoint surfaces on first use.
    pub fn connect(config: &ConnectionConfig) -> StorageResult<Self> {
        let endpoint = config.endpoint()?;
        let proxy = config.proxy.resolve()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout() {
            builder = builder.read_timeout(timeout);
        }

        // Only the configured proxy is used, never one from the environment
        builder = match &proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy.url()).map_err(|_| {
                StorageError::invalid_configuration("proxyHost", "valid host name")
            })?),
            None => builder.no_proxy(),
        };

        let http_client = builder.build().map_err(|err| {
            StorageError::invalid_configuration("url", format!("a usable HTTP endpoint ({})", err))
        })?;

        let region = if config.region.trim().is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            config.region.trim().to_string()
        };

        let proxy_url = proxy.as_ref().map(|proxy| proxy.url());
        info!(
            endpoint = %endpoint,
            region = %region,
            proxy = proxy_url.as_deref(),
            "S3 client configured"
        );

        Ok(Self {
            signer: RequestSigner::new(&config.access_key, &config.secret_key, &region),
            endpoint,
            region,
            http_client,
            write_timeout: config.write_timeout(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, path: &str, subresource: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        let base = self.endpoint.path().trim_end_matches('/');
        url.set_path(&format!("{}/{}", base, path));
        url.set_query(subresource);
        url
    }

    fn bucket_url(&self, bucket: &str, subresource: Option<&str>) -> BackendResult<Url> {
        let bucket = BucketName::new(bucket)?;
        Ok(self.url(bucket.as_str(), subresource))
    }

    fn object_url(&self, bucket: &str, key: &str) -> BackendResult<Url> {
        let bucket = BucketName::new(bucket)?;
        let key = ObjectKey::new(key)?;
        let encoded = key
            .as_str()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, URI_ENCODE_SET).to_string())
            .collect::<Vec<_>>()
            .join("/");
        Ok(self.url(&format!("{}/{}", bucket, encoded), None))
    }

    /// Sign and send a request; any non-2xx response becomes an error
    async fn execute(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        payload: Payload,
    ) -> BackendResult<Response> {
        let payload_hash = match &payload {
            Payload::Empty => EMPTY_PAYLOAD_SHA256.to_string(),
            Payload::Buffered(body) => hash_payload(body),
            Payload::Streamed { length, .. } => {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(*length));
                UNSIGNED_PAYLOAD.to_string()
            }
        };
        self.signer
            .sign(&method, &url, &mut headers, &payload_hash, Utc::now())?;

        let request = self
            .http_client
            .request(method.clone(), url.clone())
            .headers(headers);
        let request = match payload {
            Payload::Empty => request,
            Payload::Buffered(body) => request.body(body),
            Payload::Streamed { stream, .. } => {
                let request = request.body(Body::wrap_stream(stream));
                match self.write_timeout {
                    Some(timeout) => request.timeout(timeout),
                    None => request,
                }
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = service_error(status, &body);
        debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            code = err.code(),
            "S3 request rejected"
        );
        Err(err)
    }

    async fn read_body(response: Response) -> BackendResult<String> {
        Ok(response.text().await?)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn metadata_headers(
    headers: &mut HeaderMap,
    user_metadata: &HashMap<String, String>,
) -> BackendResult<()> {
    for (key, value) in user_metadata {
        let name = HeaderName::from_bytes(format!("{}{}", META_PREFIX, key.to_lowercase()).as_bytes())
            .map_err(|_| ValidationError::InvalidField {
                field: "metadata".to_string(),
                value: key.clone(),
                expected: "a valid HTTP header name".to_string(),
            })?;
        let value = HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidField {
            field: format!("metadata.{}", key),
            value: value.clone(),
            expected: "a visible ASCII header value".to_string(),
        })?;
        headers.insert(name, value);
    }
    Ok(())
}

fn object_metadata(bucket: &str, key: &str, headers: &HeaderMap) -> ObjectMetadata {
    let user_metadata = headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(META_PREFIX)?;
            Some((key.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();

    ObjectMetadata {
        bucket: bucket.to_string(),
        key: key.to_string(),
        size: header_str(headers, CONTENT_LENGTH.as_str())
            .and_then(|length| length.parse().ok())
            .unwrap_or(0),
        etag: header_str(headers, ETAG.as_str()).map(|etag| etag.trim_matches('"').to_string()),
        content_type: header_str(headers, CONTENT_TYPE.as_str()).map(str::to_string),
        last_modified: header_str(headers, LAST_MODIFIED.as_str())
            .and_then(|date| DateTime::parse_from_rfc2822(date).ok())
            .map(|date| date.with_timezone(&Utc)),
        version_id: header_str(headers, VERSION_ID_HEADER).map(str::to_string),
        user_metadata,
    }
}

#[async_trait]
impl StorageBackend for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> BackendResult<bool> {
        let url = self.bucket_url(bucket, None)?;
        match self
            .execute(Method::HEAD, url, HeaderMap::new(), Payload::Empty)
            .await
        {
            Ok(_) => Ok(true),
            Err(BackendError::Service { status: 404, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn make_bucket(&self, bucket: &str, object_lock: bool) -> BackendResult<()> {
        let url = self.bucket_url(bucket, None)?;

        let mut headers = HeaderMap::new();
        if object_lock {
            headers.insert(
                HeaderName::from_static(OBJECT_LOCK_HEADER),
                HeaderValue::from_static("true"),
            );
        }

        let payload = if self.region == DEFAULT_REGION {
            Payload::Empty
        } else {
            Payload::Buffered(Bytes::from(xml::create_bucket_configuration(&self.region)?))
        };

        self.execute(Method::PUT, url, headers, payload).await?;
        Ok(())
    }

    async fn list_buckets(&self) -> BackendResult<Vec<BucketState>> {
        let url = self.url("", None);
        let response = self
            .execute(Method::GET, url, HeaderMap::new(), Payload::Empty)
            .await?;
        xml::parse_list_buckets(&Self::read_body(response).await?)
    }

    async fn remove_bucket(&self, bucket: &str) -> BackendResult<()> {
        let url = self.bucket_url(bucket, None)?;
        self.execute(Method::DELETE, url, HeaderMap::new(), Payload::Empty)
            .await?;
        Ok(())
    }

    async fn set_bucket_versioning(
        &self,
        bucket: &str,
        config: &VersioningConfiguration,
    ) -> BackendResult<()> {
        let url = self.bucket_url(bucket, Some("versioning"))?;
        let body = xml::versioning_configuration(config)?;
        self.execute(Method::PUT, url, HeaderMap::new(), Payload::Buffered(Bytes::from(body)))
            .await?;
        Ok(())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> BackendResult<Option<VersioningStatus>> {
        let url = self.bucket_url(bucket, Some("versioning"))?;
        let response = self
            .execute(Method::GET, url, HeaderMap::new(), Payload::Empty)
            .await?;
        xml::parse_versioning(&Self::read_body(response).await?)
    }

    async fn set_object_lock_configuration(
        &self,
        bucket: &str,
        config: &ObjectLockConfiguration,
    ) -> BackendResult<()> {
        let url = self.bucket_url(bucket, Some("object-lock"))?;
        let body = Bytes::from(xml::object_lock_configuration(config)?);

        // S3 rejects object lock configuration without Content-MD5
        let digest = BASE64.encode(md5::compute(&body).0);
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CONTENT_MD5),
            HeaderValue::from_str(&digest).map_err(|err| BackendError::Signing(err.to_string()))?,
        );

        self.execute(Method::PUT, url, headers, Payload::Buffered(body))
            .await?;
        Ok(())
    }

    async fn get_object_lock_configuration(&self, bucket: &str) -> BackendResult<ObjectLockStatus> {
        let url = self.bucket_url(bucket, Some("object-lock"))?;
        match self
            .execute(Method::GET, url, HeaderMap::new(), Payload::Empty)
            .await
        {
            Ok(response) => xml::parse_object_lock(&Self::read_body(response).await?),
            Err(err) if err.code() == Some("ObjectLockConfigurationNotFoundError") => {
                Ok(ObjectLockStatus::default())
            }
            Err(err) => Err(err),
        }
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> BackendResult<()> {
        let url = self.bucket_url(bucket, Some("policy"))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.execute(
            Method::PUT,
            url,
            headers,
            Payload::Buffered(Bytes::copy_from_slice(policy.as_bytes())),
        )
        .await?;
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> BackendResult<Option<String>> {
        let url = self.bucket_url(bucket, Some("policy"))?;
        match self
            .execute(Method::GET, url, HeaderMap::new(), Payload::Empty)
            .await
        {
            Ok(response) => Ok(Some(Self::read_body(response).await?)),
            Err(err) if err.code() == Some("NoSuchBucketPolicy") => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectMetadata> {
        let url = self.object_url(bucket, key)?;
        let response = self
            .execute(Method::HEAD, url, HeaderMap::new(), Payload::Empty)
            .await?;
        Ok(object_metadata(bucket, key, response.headers()))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<ObjectStream> {
        let url = self.object_url(bucket, key)?;
        let response = self
            .execute(Method::GET, url, HeaderMap::new(), Payload::Empty)
            .await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));
        Ok(Box::pin(stream))
    }

    async fn put_object(&self, request: PutObjectRequest) -> BackendResult<()> {
        let url = self.object_url(&request.bucket, &request.key)?;

        let mut headers = HeaderMap::new();
        if let Some(content_type) = &request.content_type {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_str(content_type).map_err(|_| ValidationError::InvalidField {
                    field: "content_type".to_string(),
                    value: content_type.clone(),
                    expected: "a MIME type".to_string(),
                })?,
            );
        }
        if let Some(user_metadata) = &request.user_metadata {
            metadata_headers(&mut headers, user_metadata)?;
        }

        let payload = Payload::Streamed {
            stream: request.body.stream,
            length: request.body.content_length,
        };
        self.execute(Method::PUT, url, headers, payload).await?;
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> BackendResult<()> {
        let url = self.object_url(bucket, key)?;
        self.execute(Method::DELETE, url, HeaderMap::new(), Payload::Empty)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::s3::config::ProxySettings;
    use crate::domain::models::ObjectBody;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    fn client(url: &str) -> S3Client {
        S3Client::connect(&ConnectionConfig::new(url, "minioadmin", "minioadmin")).unwrap()
    }

    #[test]
    fn test_path_style_urls() {
        let client = client("http://localhost:9000");

        assert_eq!(
            client.bucket_url("logs", Some("versioning")).unwrap().as_str(),
            "http://localhost:9000/logs?versioning"
        );
        assert_eq!(
            client.object_url("logs", "2024/03/app log.txt").unwrap().as_str(),
            "http://localhost:9000/logs/2024/03/app%20log.txt"
        );
        assert_eq!(client.url("", None).as_str(), "http://localhost:9000/");
    }

    #[test]
    fn test_dot_segment_keys_are_rejected_before_sending() {
        let client = client("http://localhost:9000");

        let err = client.object_url("logs", "a/../secret.txt").unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
        assert!(client.object_url("logs", "./a").is_err());

        assert_eq!(
            client.object_url("logs", "a/..b/%2e%2e").unwrap().as_str(),
            "http://localhost:9000/logs/a/..b/%252e%252e"
        );
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let client = client("https://storage.example.com/s3/");
        assert_eq!(
            client.bucket_url("logs", None).unwrap().as_str(),
            "https://storage.example.com/s3/logs"
        );
    }

    #[test]
    fn test_invalid_bucket_is_rejected_before_sending() {
        let client = client("http://localhost:9000");
        assert!(matches!(
            client.bucket_url("Bad_Name", None),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_connect_validates_proxy() {
        let config = ConnectionConfig::new("http://localhost:9000", "a", "b")
            .with_proxy(ProxySettings::new("SOCKS", "proxy.local", "1080"));
        let err = S3Client::connect(&config).unwrap_err();
        assert!(err.to_string().contains("proxyType"));

        let config = ConnectionConfig::new("http://localhost:9000", "a", "b")
            .with_proxy(ProxySettings::new("HTTP", "proxy.local", "3128"));
        assert!(S3Client::connect(&config).is_ok());
    }

    #[test]
    fn test_blank_region_falls_back_to_default() {
        let config = ConnectionConfig::new("http://localhost:9000", "a", "b").with_region(" ");
        assert_eq!(S3Client::connect(&config).unwrap().region(), "us-east-1");
    }

    #[test]
    fn test_object_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        headers.insert(ETAG, HeaderValue::from_static("\"9b2cf535f27731c974343645a3985328\""));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        headers.insert(
            LAST_MODIFIED,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        headers.insert("x-amz-meta-owner", HeaderValue::from_static("data-team"));

        let metadata = object_metadata("logs", "report.csv", &headers);
        assert_eq!(metadata.size, 42);
        assert_eq!(metadata.etag.as_deref(), Some("9b2cf535f27731c974343645a3985328"));
        assert_eq!(metadata.content_type.as_deref(), Some("text/csv"));
        assert!(metadata.last_modified.is_some());
        assert_eq!(metadata.version_id, None);
        assert_eq!(
            metadata.user_metadata.get("owner").map(String::as_str),
            Some("data-team")
        );
    }

    #[test]
    fn test_metadata_headers_reject_invalid_keys() {
        let mut headers = HeaderMap::new();
        let metadata = HashMap::from([("bad key".to_string(), "v".to_string())]);
        assert!(matches!(
            metadata_headers(&mut headers, &metadata),
            Err(BackendError::Validation(_))
        ));
    }

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        method: String,
        target: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    }

    enum Reply {
        Respond(u16, &'static str),
        Stall,
    }

    async fn read_request(reader: &mut BufReader<TcpStream>) -> RecordedRequest {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let mut request_line = line.split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();

        let mut headers = HashMap::new();
        loop {
            line.clear();
            reader.read_line(&mut line).await.unwrap();
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                headers.insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        let length = headers
            .get("content-length")
            .and_then(|length| length.parse().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).await.unwrap();

        RecordedRequest {
            method,
            target,
            headers,
            body,
        }
    }

    /// Answer one connection per reply, in order, recording each request
    async fn serve(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<RecordedRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let log = recorded.clone();

        tokio::spawn(async move {
            for reply in replies {
                let (socket, _) = listener.accept().await.unwrap();
                let mut reader = BufReader::new(socket);
                let request = read_request(&mut reader).await;
                let head = request.method == "HEAD";
                log.lock().unwrap().push(request);

                let (status, body) = match reply {
                    Reply::Respond(status, body) => (status, body),
                    Reply::Stall => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        continue;
                    }
                };
                let mut response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                if !head {
                    response.push_str(body);
                }
                let socket = reader.get_mut();
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (url, recorded)
    }

    const NO_OBJECT_LOCK: &str = "<Error><Code>ObjectLockConfigurationNotFoundError</Code>\
        <Message>Object Lock configuration does not exist for this bucket</Message></Error>";
    const NO_POLICY: &str = "<Error><Code>NoSuchBucketPolicy</Code>\
        <Message>The bucket policy does not exist</Message></Error>";
    const NO_BUCKET: &str = "<Error><Code>NoSuchBucket</Code>\
        <Message>The specified bucket does not exist</Message></Error>";
    const ACCESS_DENIED: &str =
        "<Error><Code>AccessDenied</Code><Message>Access Denied.</Message></Error>";

    #[tokio::test]
    async fn test_bucket_exists_maps_missing_bucket_to_false() {
        let (url, recorded) = serve(vec![Reply::Respond(404, ""), Reply::Respond(200, "")]).await;
        let client = client(&url);

        assert!(!client.bucket_exists("missing").await.unwrap());
        assert!(client.bucket_exists("logs").await.unwrap());

        let requests = recorded.lock().unwrap().clone();
        assert_eq!(requests[0].method, "HEAD");
        assert_eq!(requests[0].target, "/missing");
        assert!(requests[0].headers["authorization"]
            .starts_with("AWS4-HMAC-SHA256 Credential=minioadmin/"));
        assert_eq!(
            requests[0].headers["x-amz-content-sha256"],
            EMPTY_PAYLOAD_SHA256
        );
        assert_eq!(requests[1].target, "/logs");
    }

    #[tokio::test]
    async fn test_missing_bucket_configuration_maps_to_defaults() {
        let (url, recorded) = serve(vec![
            Reply::Respond(404, NO_OBJECT_LOCK),
            Reply::Respond(404, NO_POLICY),
        ])
        .await;
        let client = client(&url);

        assert_eq!(
            client.get_object_lock_configuration("logs").await.unwrap(),
            ObjectLockStatus::default()
        );
        assert_eq!(client.get_bucket_policy("logs").await.unwrap(), None);

        let targets = recorded
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.target.clone())
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["/logs?object-lock", "/logs?policy"]);
    }

    #[tokio::test]
    async fn test_error_documents_become_service_errors() {
        let (url, _) = serve(vec![
            Reply::Respond(403, ACCESS_DENIED),
            Reply::Respond(404, NO_BUCKET),
        ])
        .await;
        let client = client(&url);

        match client.list_buckets().await.unwrap_err() {
            BackendError::Service { status, code, .. } => {
                assert_eq!(status, 403);
                assert_eq!(code, "AccessDenied");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Only a missing policy maps to None, a missing bucket stays an error
        let err = client.get_bucket_policy("ghost").await.unwrap_err();
        assert_eq!(err.code(), Some("NoSuchBucket"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_streamed_put_sends_length_and_unsigned_payload() {
        let (url, recorded) = serve(vec![Reply::Respond(200, "")]).await;
        let client = client(&url);

        client
            .put_object(PutObjectRequest {
                bucket: "logs".to_string(),
                key: "2024/app log.txt".to_string(),
                body: ObjectBody::from_bytes("hello world"),
                content_type: Some("text/plain".to_string()),
                user_metadata: Some(HashMap::from([(
                    "Owner".to_string(),
                    "data-team".to_string(),
                )])),
            })
            .await
            .unwrap();

        let request = recorded.lock().unwrap()[0].clone();
        assert_eq!(request.method, "PUT");
        assert_eq!(request.target, "/logs/2024/app%20log.txt");
        assert_eq!(request.headers["content-length"], "11");
        assert_eq!(request.headers["x-amz-content-sha256"], UNSIGNED_PAYLOAD);
        assert_eq!(request.headers["content-type"], "text/plain");
        assert_eq!(request.headers["x-amz-meta-owner"], "data-team");
        assert_eq!(request.body, b"hello world");
    }

    #[tokio::test]
    async fn test_streamed_put_is_bounded_by_write_timeout() {
        let (url, _) = serve(vec![Reply::Stall]).await;
        let config = ConnectionConfig {
            write_timeout_secs: 1,
            ..ConnectionConfig::new(url, "minioadmin", "minioadmin")
        };
        let client = S3Client::connect(&config).unwrap();

        let err = client
            .put_object(PutObjectRequest {
                bucket: "logs".to_string(),
                key: "slow.bin".to_string(),
                body: ObjectBody::from_bytes("payload"),
                content_type: None,
                user_metadata: None,
            })
            .await
            .unwrap_err();

        match err {
            BackendError::Transport(message) => assert!(message.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_timeouts_still_reach_the_server() {
        let (url, _) = serve(vec![Reply::Respond(200, "")]).await;
        let config = ConnectionConfig {
            connect_timeout_secs: 0,
            read_timeout_secs: 0,
            write_timeout_secs: 0,
            ..ConnectionConfig::new(url, "minioadmin", "minioadmin")
        };

        let client = S3Client::connect(&config).unwrap();
        assert!(client.bucket_exists("logs").await.unwrap());
    }
}
