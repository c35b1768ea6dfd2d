use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::auth::{AccessMode, EnvTokenSource, StoreAuth, TokenSource};
use crate::client::{BlobStore, ByteStream, StoreProvider};
use crate::error::StoreError;
use crate::locator::BlobLocator;

/// Production store client speaking plain HTTP to a blob endpoint.
///
/// Objects live at `<endpoint>/<container>/<key>`. Delegated-identity access
/// sends a bearer token; shared-credential access appends a SAS-style query
/// string to the object URL.
pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
    auth: StoreAuth,
}

impl HttpBlobStore {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, auth: StoreAuth) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_owned();
        Self {
            client,
            endpoint,
            auth,
        }
    }

    fn object_url(&self, locator: &BlobLocator) -> String {
        let mut url = format!("{}/{}/{}", self.endpoint, locator.container, locator.key);
        if let StoreAuth::Sas(query) = &self.auth {
            url.push('?');
            url.push_str(query.trim_start_matches('?'));
        }
        url
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, StoreError> {
        match &self.auth {
            StoreAuth::Bearer(source) => Ok(request.bearer_auth(source.token()?)),
            StoreAuth::Sas(_) => Ok(request),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn exists(&self, locator: &BlobLocator) -> Result<bool, StoreError> {
        let response = self
            .authorize(self.client.head(self.object_url(locator)))?
            .send()
            .await
            .map_err(StoreError::Request)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if status.is_success() {
            Ok(true)
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                locator: locator.to_string(),
            })
        }
    }

    async fn download_to(
        &self,
        locator: &BlobLocator,
        destination: &Path,
    ) -> Result<(), StoreError> {
        let response = self
            .authorize(self.client.get(self.object_url(locator)))?
            .send()
            .await
            .map_err(StoreError::Request)?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                locator: locator.to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(StoreError::Request)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(%locator, written, "downloaded object");
        Ok(())
    }

    async fn upload_overwrite(
        &self,
        locator: &BlobLocator,
        content: ByteStream,
    ) -> Result<(), StoreError> {
        let response = self
            .authorize(self.client.put(self.object_url(locator)))?
            .header("x-ms-blob-type", "BlockBlob")
            .body(reqwest::Body::wrap_stream(content))
            .send()
            .await
            .map_err(StoreError::Request)?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                locator: locator.to_string(),
            });
        }
        debug!(%locator, "uploaded object");
        Ok(())
    }
}

/// Builds [`HttpBlobStore`] clients for either access mode against one
/// endpoint.
pub struct HttpStoreProvider {
    client: reqwest::Client,
    endpoint: String,
    shared_credential: Option<String>,
    token_source: Arc<dyn TokenSource>,
}

impl HttpStoreProvider {
    pub fn new(endpoint: impl Into<String>, shared_credential: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            shared_credential,
            token_source: Arc::new(EnvTokenSource::new()),
        }
    }

    pub fn with_token_source(mut self, token_source: Arc<dyn TokenSource>) -> Self {
        self.token_source = token_source;
        self
    }
}

impl StoreProvider for HttpStoreProvider {
    fn connect(&self, mode: &AccessMode) -> Result<Arc<dyn BlobStore>, StoreError> {
        let auth = match mode {
            AccessMode::Delegated => StoreAuth::Bearer(self.token_source.clone()),
            AccessMode::SharedKey => {
                let credential = self.shared_credential.clone().ok_or_else(|| {
                    StoreError::Credential("shared credential not configured".into())
                })?;
                StoreAuth::Sas(credential)
            }
        };
        Ok(Arc::new(HttpBlobStore::new(
            self.client.clone(),
            self.endpoint.clone(),
            auth,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_joins_endpoint_container_and_key() {
        let store = HttpBlobStore::new(
            reqwest::Client::new(),
            "https://acct.example.net/",
            StoreAuth::Bearer(Arc::new(EnvTokenSource::new())),
        );
        let locator = BlobLocator::new("incoming", "a/archive.zip");
        assert_eq!(
            store.object_url(&locator),
            "https://acct.example.net/incoming/a/archive.zip"
        );
    }

    #[test]
    fn object_url_appends_sas_query() {
        let store = HttpBlobStore::new(
            reqwest::Client::new(),
            "https://acct.example.net",
            StoreAuth::Sas("?sig=abc&se=2026".into()),
        );
        let locator = BlobLocator::new("incoming", "archive.zip");
        assert_eq!(
            store.object_url(&locator),
            "https://acct.example.net/incoming/archive.zip?sig=abc&se=2026"
        );
    }

    #[test]
    fn provider_requires_shared_credential_for_shared_key_mode() {
        let provider = HttpStoreProvider::new("https://acct.example.net", None);
        assert!(matches!(
            provider.connect(&AccessMode::SharedKey),
            Err(StoreError::Credential(_))
        ));
        assert!(provider.connect(&AccessMode::Delegated).is_ok());
    }

    #[test]
    fn provider_with_shared_credential_connects() {
        let provider =
            HttpStoreProvider::new("https://acct.example.net", Some("sig=abc".into()));
        assert!(provider.connect(&AccessMode::SharedKey).is_ok());
    }
}
