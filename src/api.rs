//! HTTP client for the dashboard backend's REST endpoints.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{
    multipart::{Form, Part},
    Response,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::{
    error::ApiError,
    model::{
        DirectoryListing, DriveList, ErrorBody, MetricsSnapshot, PathRequest, RenameRequest,
        WriteRequest,
    },
};

/// Typed access to the backend. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!("{} cannot be a base URL", base)));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("vpscope/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a push channel on the same host, with the scheme switched to ws/wss.
    pub fn socket_url(&self, path: &str) -> Result<Url, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut url = self.endpoint(&segments)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ApiError::InvalidRequest(format!("cannot derive {} URL from {}", scheme, url)))?;
        Ok(url)
    }

    /// Inline-renderable stream of a file, for viewers.
    pub fn view_url(&self, path: &str) -> Result<Url, ApiError> {
        self.endpoint(&["files", "view", path])
    }

    pub fn download_url(&self, path: &str) -> Result<Url, ApiError> {
        self.endpoint(&["files", "download", path])
    }

    pub async fn list_directory(&self, path: &str) -> Result<DirectoryListing, ApiError> {
        debug!(path, "listing directory");
        let url = self.endpoint(&["files", "list"])?;
        let response = self.http.get(url).query(&[("path", path)]).send().await?;
        let listing: DirectoryListing = read_json(response).await?;
        Ok(listing.normalized())
    }

    pub async fn drives(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["files", "drives"])?;
        let response = self.http.get(url).send().await?;
        let list: DriveList = read_json(response).await?;
        Ok(list.drives)
    }

    pub async fn read_file(&self, path: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["files", "read"])?;
        let response = self.http.get(url).query(&[("path", path)]).send().await?;
        Ok(check(response).await?.text().await?)
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["files", "write"])?;
        let response = self
            .http
            .post(url)
            .json(&WriteRequest { path, content })
            .send()
            .await?;
        check(response).await?;
        info!(path, bytes = content.len(), "file written");
        Ok(())
    }

    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["files", "rename"])?;
        let response = self
            .http
            .post(url)
            .json(&RenameRequest { old_path, new_path })
            .send()
            .await?;
        check(response).await?;
        info!(old_path, new_path, "renamed");
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["files", "delete"])?;
        let response = self.http.post(url).json(&PathRequest { path }).send().await?;
        check(response).await?;
        info!(path, "deleted");
        Ok(())
    }

    pub async fn make_dir(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["files", "mkdir"])?;
        let response = self.http.post(url).json(&PathRequest { path }).send().await?;
        check(response).await?;
        info!(path, "directory created");
        Ok(())
    }

    /// Upload local files into the remote directory `dir`, one `file` part each.
    pub async fn upload(&self, dir: &str, files: &[PathBuf]) -> Result<(), ApiError> {
        if files.is_empty() {
            return Err(ApiError::InvalidRequest("no files selected".to_string()));
        }
        let mut form = Form::new();
        for file in files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ApiError::InvalidRequest(format!("{} is not a file", file.display())))?;
            let bytes = tokio::fs::read(file).await?;
            form = form.part("file", Part::bytes(bytes).file_name(name));
        }
        form = form.text("path", dir.to_string());

        let url = self.endpoint(&["files", "upload"])?;
        let response = self.http.post(url).multipart(form).send().await?;
        check(response).await?;
        info!(dir, count = files.len(), "uploaded");
        Ok(())
    }

    /// Save a remote file into `dest_dir`, never overwriting an existing local file.
    pub async fn download(&self, path: &str, dest_dir: &Path) -> Result<PathBuf, ApiError> {
        let url = self.download_url(path)?;
        let response = check(self.http.get(url).send().await?).await?;
        let bytes = response.bytes().await?;

        let leaf = path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .unwrap_or("download");
        tokio::fs::create_dir_all(dest_dir).await?;
        let target = free_name(dest_dir, leaf).await?;
        tokio::fs::write(&target, &bytes).await?;
        info!(path, saved = %target.display(), bytes = bytes.len(), "downloaded");
        Ok(target)
    }

    pub async fn metrics(&self) -> Result<MetricsSnapshot, ApiError> {
        let url = self.endpoint(&["system", "metrics"])?;
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

async fn free_name(dir: &Path, leaf: &str) -> Result<PathBuf, ApiError> {
    let candidate = dir.join(leaf);
    if !tokio::fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }
    let (stem, ext) = match leaf.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (leaf, None),
    };
    for n in 1.. {
        let name = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(name);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    unreachable!("unbounded range always yields a free name")
}

/// Turn a non-2xx response into `ApiError::Backend`, preferring the `{error}` body.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => err.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check(response).await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    // Some handlers report failures inside a 200 body.
    if let Ok(err) = serde_json::from_str::<ErrorBody>(&body) {
        return Err(ApiError::Backend {
            status,
            message: err.error,
        });
    }
    Ok(serde_json::from_str(&body)?)
}
