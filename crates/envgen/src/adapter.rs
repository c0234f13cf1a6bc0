// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Import and export of variable maps through external media.
//!
//! Adapters move flat `name -> string` maps. Use
//! [`ResolvedVariables::to_string_map`](crate::ResolvedVariables::to_string_map)
//! to export and [`ValueSources::with_imported`](crate::ValueSources::with_imported)
//! to feed an import back into resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;

use crate::dotenv;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./adapter_test.rs"]
mod adapter_test;

pub type VariableMap = IndexMap<String, String>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A medium variables can be imported from and exported to.
#[async_trait]
pub trait ConfigAdapter: Send + Sync {
    /// Short name of the medium, used in errors.
    fn medium(&self) -> &str;

    /// Whether import and export can work right now.
    fn is_supported(&self) -> bool;

    async fn import_config(&self) -> Result<VariableMap>;

    async fn export_config(&self, values: &VariableMap) -> Result<()>;
}

/// Reads and writes `.env` files at a selected path.
#[derive(Debug, Clone, Default)]
pub struct FileAdapter {
    path: Option<PathBuf>,
}

impl FileAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.select(path);
        self
    }

    /// Choose the file used by later imports and exports.
    pub fn select<P: Into<PathBuf>>(&mut self, path: P) {
        self.path = Some(path.into());
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn selected(&self) -> Result<&Path> {
        match self.path.as_deref() {
            Some(path) if self.is_supported() => Ok(path),
            Some(path) => Err(Error::CapabilityUnavailable {
                medium: self.medium().to_string(),
                message: format!("directory of {} does not exist", path.display()),
            }),
            None => Err(Error::CapabilityUnavailable {
                medium: self.medium().to_string(),
                message: "no file selected".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ConfigAdapter for FileAdapter {
    fn medium(&self) -> &str {
        "file"
    }

    fn is_supported(&self) -> bool {
        self.path.as_deref().is_some_and(|path| match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        })
    }

    async fn import_config(&self) -> Result<VariableMap> {
        let path = self.selected()?;
        let content = tokio::fs::read_to_string(path).await.map_err(|e| Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        let values = dotenv::parse(&content)?;
        tracing::debug!(path = %path.display(), count = values.len(), "imported variables");
        Ok(values)
    }

    async fn export_config(&self, values: &VariableMap) -> Result<()> {
        let path = self.selected()?;
        let content = dotenv::render(values.iter().map(|(k, v)| (k.as_str(), v.clone())));
        tokio::fs::write(path, content).await.map_err(|e| Error::WriteFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        tracing::debug!(path = %path.display(), count = values.len(), "exported variables");
        Ok(())
    }
}

/// Fetches (`GET`) and stores (`PUT`) a JSON object of strings at an
/// endpoint.
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    endpoint: Option<String>,
    client: Client,
    timeout: Duration,
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self {
            endpoint: None,
            client: Client::builder()
                .user_agent(concat!("envgen/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpAdapter {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    /// Limit each request to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn url(&self) -> Result<&str> {
        match self.endpoint.as_deref() {
            Some(url) if self.is_supported() => Ok(url),
            Some(url) => Err(Error::CapabilityUnavailable {
                medium: self.medium().to_string(),
                message: format!("{url:?} is not an http(s) URL"),
            }),
            None => Err(Error::CapabilityUnavailable {
                medium: self.medium().to_string(),
                message: "no endpoint configured".to_string(),
            }),
        }
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl ConfigAdapter for HttpAdapter {
    fn medium(&self) -> &str {
        "http"
    }

    fn is_supported(&self) -> bool {
        self.endpoint
            .as_deref()
            .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"))
    }

    async fn import_config(&self) -> Result<VariableMap> {
        let url = self.url()?;
        tracing::debug!(%url, "fetching variables");
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        check_status(url, &response)?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::InvalidJson {
            origin: url.to_string(),
            error: e,
        })
    }

    async fn export_config(&self, values: &VariableMap) -> Result<()> {
        let url = self.url()?;
        tracing::debug!(%url, count = values.len(), "sending variables");
        let response = self
            .client
            .put(url)
            .timeout(self.timeout)
            .json(values)
            .send()
            .await?;
        check_status(url, &response)
    }
}
