//! Azure-compatible REST bindings for the log blob and result queue.
//!
//! Thin wire adapters: SharedKey request signing plus the three requests the
//! orchestrator needs (create/append the run's append blob, enqueue the
//! result message). Nothing here knows about build semantics.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::error::StorageError;
use crate::sink::{LogSink, ResultQueue};

type HmacSha256 = Hmac<Sha256>;

const STORAGE_API_VERSION: &str = "2017-04-17";

/// Container holding all run logs.
pub const LOG_CONTAINER: &str = "logs";
/// Queue the per-run result message is posted to.
pub const RESULT_QUEUE: &str = "buildresults";

/// Shared-key credentials for one storage account.
#[derive(Clone)]
pub struct StorageCredentials {
    account: String,
    key: Vec<u8>,
}

impl StorageCredentials {
    pub fn new(account: &str, base64_key: &str) -> Result<Self, StorageError> {
        Ok(Self {
            account: account.to_string(),
            key: BASE64.decode(base64_key)?,
        })
    }

    /// Parse `AccountName=...;AccountKey=...` connection strings.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, StorageError> {
        let mut account = None;
        let mut key = None;
        for element in connection_string.split(';') {
            match element.split_once('=') {
                Some(("AccountName", value)) => account = Some(value.to_string()),
                Some(("AccountKey", value)) => key = Some(value.to_string()),
                _ => {}
            }
        }
        let account = account.ok_or(StorageError::ConnectionString("AccountName"))?;
        let key = key.ok_or(StorageError::ConnectionString("AccountKey"))?;
        Self::new(&account, &key)
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn sign(&self, string_to_sign: &str) -> String {
        // new_from_slice accepts any key length for HMAC.
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(string_to_sign.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Build the SharedKey string-to-sign for one request.
///
/// `ms_headers` must contain every `x-ms-*` header sent with the request;
/// they are canonicalized in sorted order. `params` are the query parameters,
/// canonicalized as `\nname:value` pairs appended to the resource.
fn string_to_sign(
    method: &str,
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, &str)],
    account: &str,
    resource: &str,
    params: &[(&str, &str)],
) -> String {
    let mut sorted: Vec<_> = ms_headers.to_vec();
    sorted.sort_by_key(|(name, _)| *name);
    let canonical_headers: String = sorted
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    let mut canonical_resource = format!("/{account}/{resource}");
    let mut sorted_params: Vec<_> = params.to_vec();
    sorted_params.sort_by_key(|(name, _)| *name);
    for (name, value) in sorted_params {
        canonical_resource.push_str(&format!("\n{name}:{value}"));
    }

    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    format!(
        "{method}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}{canonical_resource}"
    )
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Append blob holding one run's build log.
pub struct AppendBlobClient {
    http: reqwest::Client,
    credentials: StorageCredentials,
    endpoint: String,
    blob: String,
}

impl AppendBlobClient {
    pub fn new(http: reqwest::Client, credentials: StorageCredentials, blob: &str) -> Self {
        let endpoint = format!("https://{}.blob.core.windows.net", credentials.account());
        Self {
            http,
            credentials,
            endpoint,
            blob: blob.to_string(),
        }
    }

    /// Point the client at a non-default endpoint (emulators, tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Create the log container (publicly readable blobs, idempotent) and the
    /// run's empty append blob.
    pub async fn create(&self) -> Result<(), StorageError> {
        debug!(blob = %self.blob, "creating append blob");
        let status = self
            .request(
                "PUT",
                LOG_CONTAINER,
                &[("restype", "container")],
                &[("x-ms-blob-public-access", "blob")],
                "",
                Vec::new(),
            )
            .await?;
        // 409: container already exists, which is fine.
        if status != 201 && status != 409 {
            return Err(StorageError::Status {
                operation: "create container",
                status,
            });
        }

        let resource = format!("{LOG_CONTAINER}/{}", self.blob);
        let status = self
            .request(
                "PUT",
                &resource,
                &[],
                &[
                    ("x-ms-blob-content-type", "text/plain; charset=utf-8"),
                    ("x-ms-blob-type", "AppendBlob"),
                ],
                "",
                Vec::new(),
            )
            .await?;
        if status != 201 {
            return Err(StorageError::Status {
                operation: "create blob",
                status,
            });
        }
        Ok(())
    }

    async fn request(
        &self,
        method: &str,
        resource: &str,
        params: &[(&str, &str)],
        extra_ms_headers: &[(&str, &str)],
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<u16, StorageError> {
        let date = rfc1123_now();
        let mut ms_headers = vec![
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];
        ms_headers.extend_from_slice(extra_ms_headers);

        let signature = self.credentials.sign(&string_to_sign(
            method,
            body.len(),
            content_type,
            &ms_headers,
            self.credentials.account(),
            resource,
            params,
        ));

        let mut url = format!("{}/{resource}", self.endpoint);
        for (i, (name, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&format!("{name}={value}"));
        }

        let mut req = self
            .http
            .request(method.parse().unwrap_or(reqwest::Method::PUT), url)
            .header(
                "Authorization",
                format!(
                    "SharedKey {}:{signature}",
                    self.credentials.account()
                ),
            );
        for (name, value) in &ms_headers {
            req = req.header(*name, *value);
        }
        if !content_type.is_empty() {
            req = req.header("Content-Type", content_type);
        }
        let response = req.body(body).send().await?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl LogSink for AppendBlobClient {
    async fn append(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let resource = format!("{LOG_CONTAINER}/{}", self.blob);
        let status = self
            .request(
                "PUT",
                &resource,
                &[("comp", "appendblock")],
                &[],
                "",
                bytes.to_vec(),
            )
            .await?;
        if status != 201 {
            return Err(StorageError::Status {
                operation: "append block",
                status,
            });
        }
        Ok(())
    }

    fn url(&self) -> String {
        format!("{}/{LOG_CONTAINER}/{}", self.endpoint, self.blob)
    }
}

/// Result queue binding.
pub struct QueueClient {
    http: reqwest::Client,
    credentials: StorageCredentials,
    endpoint: String,
    queue: String,
}

impl QueueClient {
    pub fn from_connection_string(
        http: reqwest::Client,
        connection_string: &str,
        queue: &str,
    ) -> Result<Self, StorageError> {
        let credentials = StorageCredentials::from_connection_string(connection_string)?;
        let endpoint = format!("https://{}.queue.core.windows.net", credentials.account());
        Ok(Self {
            http,
            credentials,
            endpoint,
            queue: queue.to_string(),
        })
    }

    /// Point the client at a non-default endpoint (emulators, tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ResultQueue for QueueClient {
    async fn enqueue(&self, message: &str) -> Result<(), StorageError> {
        // Queue message bodies are base64-wrapped in the XML envelope; the
        // base64 alphabet needs no XML escaping.
        debug!(queue = %self.queue, "enqueueing result message");
        let body = format!(
            "<QueueMessage><MessageText>{}</MessageText></QueueMessage>",
            BASE64.encode(message)
        );
        let date = rfc1123_now();
        let ms_headers = [
            ("x-ms-date", date.as_str()),
            ("x-ms-version", STORAGE_API_VERSION),
        ];
        let resource = format!("{}/messages", self.queue);
        let signature = self.credentials.sign(&string_to_sign(
            "POST",
            body.len(),
            "application/xml",
            &ms_headers,
            self.credentials.account(),
            &resource,
            &[],
        ));

        let response = self
            .http
            .post(format!("{}/{resource}", self.endpoint))
            .header(
                "Authorization",
                format!("SharedKey {}:{signature}", self.credentials.account()),
            )
            .header("x-ms-date", date.as_str())
            .header("x-ms-version", STORAGE_API_VERSION)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status != 201 {
            return Err(StorageError::Status {
                operation: "enqueue message",
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_string() {
        let creds =
            StorageCredentials::from_connection_string("AccountName=yottaci;AccountKey=c2VjcmV0")
                .unwrap();
        assert_eq!(creds.account(), "yottaci");
    }

    #[test]
    fn connection_string_missing_key_is_an_error() {
        let err = StorageCredentials::from_connection_string("AccountName=yottaci").unwrap_err();
        assert!(matches!(err, StorageError::ConnectionString("AccountKey")));
    }

    #[test]
    fn string_to_sign_canonicalizes_headers_and_params() {
        let signed = string_to_sign(
            "PUT",
            0,
            "",
            &[
                ("x-ms-version", "2017-04-17"),
                ("x-ms-date", "Thu, 01 Jan 2026 00:00:00 GMT"),
                ("x-ms-blob-type", "AppendBlob"),
            ],
            "yottaci",
            "logs/7-1",
            &[("comp", "appendblock")],
        );

        let expected = "PUT\n\n\n\n\n\n\n\n\n\n\n\n\
            x-ms-blob-type:AppendBlob\n\
            x-ms-date:Thu, 01 Jan 2026 00:00:00 GMT\n\
            x-ms-version:2017-04-17\n\
            /yottaci/logs/7-1\ncomp:appendblock";
        assert_eq!(signed, expected);
    }

    #[test]
    fn string_to_sign_omits_zero_content_length() {
        let with_body = string_to_sign("POST", 42, "application/xml", &[], "a", "q/messages", &[]);
        assert!(with_body.contains("\n42\n"));
        let empty = string_to_sign("POST", 0, "application/xml", &[], "a", "q/messages", &[]);
        assert!(!empty.contains("\n0\n"));
    }

    #[test]
    fn signature_is_deterministic() {
        let creds = StorageCredentials::new("yottaci", "c2VjcmV0").unwrap();
        assert_eq!(creds.sign("payload"), creds.sign("payload"));
        assert_ne!(creds.sign("payload"), creds.sign("other"));
    }

    #[test]
    fn debug_redacts_key() {
        let creds = StorageCredentials::new("yottaci", "c2VjcmV0").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }
}
