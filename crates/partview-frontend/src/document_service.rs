//! Document retrieval from the PDM backend and the local filesystem.

use std::time::Duration;

use partview_core::{
    DocumentInfo, DocumentRef, DocumentSource, FileDocumentSource, LoadError, ResolvedDocument,
};
use serde::Deserialize;

use crate::config::ApiConfig;

/// Document service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("Server returned no download URL for document {0}")]
    MissingDownloadUrl(u64),
}

impl From<ServiceError> for LoadError {
    fn from(e: ServiceError) -> Self {
        LoadError::Transport(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct DownloadUrl {
    url: String,
}

/// Talks to the PDM REST API.
pub struct HttpDocumentSource {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    max_document_bytes: u64,
}

impl HttpDocumentSource {
    pub fn new(config: &ApiConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.effective_token(),
            max_document_bytes: config.max_document_bytes,
        }
    }

    fn document_url(&self, id: u64) -> String {
        format!("{}/api/documents/{}", self.base_url, id)
    }

    fn download_url_endpoint(&self, id: u64) -> String {
        format!("{}/api/documents/{}/download-url", self.base_url, id)
    }

    fn get(&self, url: &str) -> Result<ureq::http::Response<ureq::Body>, ServiceError> {
        let mut request = self.agent.get(url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.call().map_err(|source| ServiceError::Request {
            url: url.to_string(),
            source,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ServiceError> {
        let mut response = self.get(url)?;
        response
            .body_mut()
            .read_json()
            .map_err(|source| ServiceError::Request {
                url: url.to_string(),
                source,
            })
    }

    fn document_info(&self, id: u64) -> Result<DocumentInfo, ServiceError> {
        self.get_json(&self.document_url(id))
    }

    fn download_url(&self, id: u64) -> Result<String, ServiceError> {
        let response: DownloadUrl = self.get_json(&self.download_url_endpoint(id))?;
        if response.url.trim().is_empty() {
            return Err(ServiceError::MissingDownloadUrl(id));
        }
        Ok(join_url(&self.base_url, &response.url))
    }
}

impl DocumentSource for HttpDocumentSource {
    fn resolve(&self, reference: &DocumentRef) -> Result<ResolvedDocument, LoadError> {
        let DocumentRef::Remote { id } = reference else {
            return Err(LoadError::Transport(format!(
                "{} is not a server document",
                reference
            )));
        };

        let info = self.document_info(*id)?;
        tracing::debug!(
            "Document {}: {} ({:?})",
            info.id,
            info.file_name,
            info.conversion_status
        );
        info.check_viewable()?;

        Ok(ResolvedDocument {
            reference: reference.clone(),
            location: self.download_url(*id)?,
            display_name: info.display_name(),
        })
    }

    fn fetch(&self, document: &ResolvedDocument) -> Result<Vec<u8>, LoadError> {
        let url = document.location.as_str();
        let mut response = self.get(url)?;
        response
            .body_mut()
            .with_config()
            .limit(self.max_document_bytes)
            .read_to_vec()
            .map_err(|source| {
                ServiceError::Request {
                    url: url.to_string(),
                    source,
                }
                .into()
            })
    }
}

/// Routes server documents to HTTP and paths to the filesystem.
pub struct DocumentService {
    http: HttpDocumentSource,
    files: FileDocumentSource,
}

impl DocumentService {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: HttpDocumentSource::new(config),
            files: FileDocumentSource::new(),
        }
    }

    fn source_for(&self, reference: &DocumentRef) -> &dyn DocumentSource {
        match reference {
            DocumentRef::Remote { .. } => &self.http,
            DocumentRef::Local { .. } => &self.files,
        }
    }
}

impl DocumentSource for DocumentService {
    fn resolve(&self, reference: &DocumentRef) -> Result<ResolvedDocument, LoadError> {
        self.source_for(reference).resolve(reference)
    }

    fn fetch(&self, document: &ResolvedDocument) -> Result<Vec<u8>, LoadError> {
        self.source_for(&document.reference).fetch(document)
    }
}

/// Join a possibly relative URL onto the service base URL.
fn join_url(base_url: &str, url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}
