use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{bail, Context};
use http::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::{debug, info};
use yolo_codebase::assets::WeightArtifact;
use yolo_codebase::GenericResult;

/// What to do when the destination file is already there
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExistingPolicy {
    #[default]
    Overwrite,
    Skip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded(u64),
    AlreadyPresent,
}

/// Downloads release artifacts over plain, unauthenticated HTTP
pub struct ReleaseClient {
    client: Client,
}

impl ReleaseClient {
    pub fn new() -> GenericResult<Self> {
        // Weight files are hundreds of megabytes, never cut a download short
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("Could not create the HTTP client")?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn fetch(&self, artifact: &WeightArtifact, policy: ExistingPolicy) -> GenericResult<FetchOutcome> {
        if policy == ExistingPolicy::Skip && artifact.local_path.exists() {
            debug!("{} already exists", artifact.local_path.display());
            return Ok(FetchOutcome::AlreadyPresent);
        }

        info!("Downloading {}", artifact.url);
        let mut response = self.client.get(&artifact.url)
            .send()
            .with_context(|| format!("Request to {} failed", artifact.url))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => bail!("{} was not found on the server", artifact.url),
            status => bail!("Invalid response from {}: {}", artifact.url, status),
        }

        let partial = partial_path(artifact);
        match store(&mut response, &partial, &artifact.local_path) {
            Ok(written) => Ok(FetchOutcome::Downloaded(written)),
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e.context(format!("Could not store {}", artifact.local_path.display())))
            }
        }
    }
}

/// Streams the body next to the destination, then moves it into place
fn store(response: &mut Response, partial: &Path, destination: &Path) -> GenericResult<u64> {
    let mut file = File::create(partial)?;
    let written = response.copy_to(&mut file)?;
    drop(file);
    fs::rename(partial, destination)?;
    Ok(written)
}

fn partial_path(artifact: &WeightArtifact) -> PathBuf {
    let mut name = artifact.local_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use yolo_codebase::assets::{release_artifacts, WeightVariant};
    use crate::client::{ExistingPolicy, FetchOutcome};
    use crate::test_server::{local_client, TestServer};

    #[test]
    fn test_download_writes_file() {
        let server = TestServer::start(vec![("/v0.1/yolov7_training.pt", 200, b"weights".to_vec())]);
        let dir = tempfile::tempdir().unwrap();
        let artifact = &release_artifacts(&[WeightVariant::Base], &server.url("/v0.1"), dir.path()).remove(0);

        let outcome = local_client().fetch(artifact, ExistingPolicy::Overwrite).unwrap();
        assert_eq!(outcome, FetchOutcome::Downloaded(7));
        assert_eq!(fs::read(dir.path().join("yolov7_training.pt")).unwrap(), b"weights");
        assert!(!dir.path().join("yolov7_training.pt.part").exists());
    }

    #[test]
    fn test_any_success_status_is_accepted() {
        let server = TestServer::start(vec![("/yolov7_training.pt", 203, b"mirrored".to_vec())]);
        let dir = tempfile::tempdir().unwrap();
        let artifact = &release_artifacts(&[WeightVariant::Base], &server.url(""), dir.path()).remove(0);

        let outcome = local_client().fetch(artifact, ExistingPolicy::Overwrite).unwrap();
        assert_eq!(outcome, FetchOutcome::Downloaded(8));
        assert_eq!(fs::read(&artifact.local_path).unwrap(), b"mirrored");
    }

    #[test]
    fn test_server_error_fails() {
        let server = TestServer::start(vec![("/yolov7_training.pt", 500, b"oops".to_vec())]);
        let dir = tempfile::tempdir().unwrap();
        let artifact = &release_artifacts(&[WeightVariant::Base], &server.url(""), dir.path()).remove(0);

        assert!(local_client().fetch(artifact, ExistingPolicy::Overwrite).is_err());
        assert!(!artifact.local_path.exists());
    }

    #[test]
    fn test_overwrite_replaces_existing() {
        let server = TestServer::start(vec![("/yolov7x_training.pt", 200, b"new".to_vec())]);
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("yolov7x_training.pt"), b"old contents").unwrap();
        let artifact = &release_artifacts(&[WeightVariant::X], &server.url(""), dir.path()).remove(0);

        local_client().fetch(artifact, ExistingPolicy::Overwrite).unwrap();
        assert_eq!(fs::read(&artifact.local_path).unwrap(), b"new");
    }

    #[test]
    fn test_skip_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("yolov7-w6_training.pt"), b"old").unwrap();
        // Nothing listens here; skipping must not make a request
        let artifact = &release_artifacts(&[WeightVariant::W6], "http://127.0.0.1:9", dir.path()).remove(0);

        let outcome = local_client().fetch(artifact, ExistingPolicy::Skip).unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(fs::read(&artifact.local_path).unwrap(), b"old");
    }

    #[test]
    fn test_not_found_leaves_nothing() {
        let server = TestServer::start(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let artifact = &release_artifacts(&[WeightVariant::E6], &server.url(""), dir.path()).remove(0);

        let result = local_client().fetch(artifact, ExistingPolicy::Overwrite);
        assert!(result.is_err());
        assert!(!artifact.local_path.exists());
    }
}
