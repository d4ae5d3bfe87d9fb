//! # Resource sync
//!
//! Brings local resources up to date with the latest release on the
//! repository host. Resources are processed one at a time; a failure is
//! logged, reported and skipped, and never stops the remaining resources.
//! Failed downloads are not retried.
//!
//! For each resource:
//!
//! 1. Look up the latest release (no release: skipped).
//! 2. Compare its tag with `version.txt` (equal: up to date).
//! 3. Download the release archive next to the resource directory.
//! 4. Extract it into the resource directory.
//! 5. Record the tag in `version.txt`.

use crate::resources::{ResourceError, ResourceId, ResourceStore};
use serde::Deserialize;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// The parts of a release the sync needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub zipball_url: String,
}

/// Where releases come from.
pub trait ReleaseSource {
    /// Latest release of a repository, or `None` when it has none.
    fn latest_release(&self, id: &ResourceId) -> Result<Option<Release>, SyncError>;

    /// Download `url` to the file `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<(), SyncError>;
}

/// Gitea API client for git.door43.org (or another host).
pub struct Door43Client {
    client: reqwest::blocking::Client,
    api_base: String,
}

impl Door43Client {
    pub fn new(api_base: &str) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("book-package-reader/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn release_url(&self, id: &ResourceId) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.api_base, id.owner, id.repo)
    }
}

impl ReleaseSource for Door43Client {
    fn latest_release(&self, id: &ResourceId) -> Result<Option<Release>, SyncError> {
        let response = self.client.get(self.release_url(id)).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release = response.error_for_status()?.json()?;
        Ok(Some(release))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), SyncError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(dest)?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}

/// Progress reported while syncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Checking(ResourceId),
    Downloading { id: ResourceId, version: String },
    Extracting { id: ResourceId },
    UpToDate { id: ResourceId, version: String },
    Updated { id: ResourceId, version: String },
    Skipped { id: ResourceId },
    Failed { id: ResourceId, message: String },
    Complete { updated: usize, failed: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated(String),
    UpToDate(String),
    /// The repository has no release.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<(ResourceId, SyncOutcome)>,
}

impl SyncReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

/// Sync every resource in `ids`, in order.
pub fn sync_resources(
    store: &ResourceStore,
    source: &dyn ReleaseSource,
    ids: &[ResourceId],
    mut on_event: impl FnMut(&SyncEvent),
) -> SyncReport {
    let mut report = SyncReport::default();

    for id in ids {
        let outcome = match sync_resource(store, source, id, &mut on_event) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Failed to sync {id}: {e}");
                on_event(&SyncEvent::Failed {
                    id: id.clone(),
                    message: e.to_string(),
                });
                SyncOutcome::Failed(e.to_string())
            }
        };
        report.outcomes.push((id.clone(), outcome));
    }

    on_event(&SyncEvent::Complete {
        updated: report.updated(),
        failed: report.failed(),
    });
    report
}

fn sync_resource(
    store: &ResourceStore,
    source: &dyn ReleaseSource,
    id: &ResourceId,
    on_event: &mut impl FnMut(&SyncEvent),
) -> Result<SyncOutcome, SyncError> {
    log::info!("Checking {id}");
    on_event(&SyncEvent::Checking(id.clone()));

    let Some(release) = source.latest_release(id)? else {
        log::warn!("No release found for {id}");
        on_event(&SyncEvent::Skipped { id: id.clone() });
        return Ok(SyncOutcome::Skipped);
    };

    if store.installed_version(id)?.as_deref() == Some(release.tag_name.as_str()) {
        log::info!("{id} is up to date ({})", release.tag_name);
        on_event(&SyncEvent::UpToDate {
            id: id.clone(),
            version: release.tag_name.clone(),
        });
        return Ok(SyncOutcome::UpToDate(release.tag_name));
    }

    log::info!("Downloading {id} {}", release.tag_name);
    on_event(&SyncEvent::Downloading {
        id: id.clone(),
        version: release.tag_name.clone(),
    });
    let archive = store.archive_path(id);
    source.download(&release.zipball_url, &archive)?;

    on_event(&SyncEvent::Extracting { id: id.clone() });
    extract_archive(&archive, &store.resource_dir(id))?;
    store.write_version(id, &release.tag_name)?;
    if let Err(e) = fs::remove_file(&archive) {
        log::debug!("Could not remove {}: {e}", archive.display());
    }

    log::info!("Updated {id} to {}", release.tag_name);
    on_event(&SyncEvent::Updated {
        id: id.clone(),
        version: release.tag_name.clone(),
    });
    Ok(SyncOutcome::Updated(release.tag_name))
}

/// Extract a zip archive into `dest`.
///
/// Entries whose paths would land outside `dest` are rejected by the
/// archive reader.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), SyncError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;
    zip.extract(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create_test_data_dir;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};

    /// Zip archive bytes holding `files`.
    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[derive(Default)]
    struct FakeSource {
        releases: HashMap<String, Release>,
        archives: HashMap<String, Vec<u8>>,
        broken: Vec<String>,
        downloads: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn with_release(mut self, id: &ResourceId, tag: &str, files: &[(&str, &str)]) -> Self {
            let url = format!("https://example.test/{id}/{tag}.zip");
            self.releases.insert(
                id.to_string(),
                Release {
                    tag_name: tag.to_string(),
                    zipball_url: url.clone(),
                },
            );
            self.archives.insert(url, zip_bytes(files));
            self
        }

        fn with_broken(mut self, id: &ResourceId) -> Self {
            self.broken.push(id.to_string());
            self
        }
    }

    impl ReleaseSource for FakeSource {
        fn latest_release(&self, id: &ResourceId) -> Result<Option<Release>, SyncError> {
            if self.broken.contains(&id.to_string()) {
                return Err(SyncError::Io(std::io::Error::other("connection reset")));
            }
            Ok(self.releases.get(&id.to_string()).cloned())
        }

        fn download(&self, url: &str, dest: &Path) -> Result<(), SyncError> {
            self.downloads.borrow_mut().push(url.to_string());
            let bytes = self
                .archives
                .get(url)
                .ok_or_else(|| SyncError::Io(std::io::Error::other("not found")))?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(dest, bytes)?;
            Ok(())
        }
    }

    fn ult() -> ResourceId {
        ResourceId::new("unfoldingWord", "en_ult")
    }

    fn tn() -> ResourceId {
        ResourceId::new("unfoldingWord", "en_tn")
    }

    #[test]
    fn test_sync_downloads_and_extracts() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let source = FakeSource::default().with_release(&ult(), "v86", &[("en_ult/43-JHN.usfm", "\\id JHN\n")]);

        let mut events = Vec::new();
        let report = sync_resources(&store, &source, &[ult()], |e| events.push(e.clone()));

        assert_eq!(report.outcomes, vec![(ult(), SyncOutcome::Updated("v86".to_string()))]);
        assert_eq!(store.installed_version(&ult()).unwrap(), Some("v86".to_string()));
        let book = store.resource_dir(&ult()).join("en_ult/43-JHN.usfm");
        assert_eq!(fs::read_to_string(book).unwrap(), "\\id JHN\n");
        assert!(!store.archive_path(&ult()).exists());
        assert_eq!(
            events,
            vec![
                SyncEvent::Checking(ult()),
                SyncEvent::Downloading {
                    id: ult(),
                    version: "v86".to_string()
                },
                SyncEvent::Extracting { id: ult() },
                SyncEvent::Updated {
                    id: ult(),
                    version: "v86".to_string()
                },
                SyncEvent::Complete { updated: 1, failed: 0 },
            ]
        );
    }

    #[test]
    fn test_up_to_date_resource_is_not_downloaded() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        store.write_version(&ult(), "v86").unwrap();
        let source = FakeSource::default().with_release(&ult(), "v86", &[("a.usfm", "")]);

        let report = sync_resources(&store, &source, &[ult()], |_| {});

        assert_eq!(report.outcomes[0].1, SyncOutcome::UpToDate("v86".to_string()));
        assert!(source.downloads.borrow().is_empty());
    }

    #[test]
    fn test_newer_release_replaces_version() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        store.write_version(&ult(), "v85").unwrap();
        let source = FakeSource::default().with_release(&ult(), "v86", &[("a.usfm", "")]);

        let report = sync_resources(&store, &source, &[ult()], |_| {});

        assert_eq!(report.updated(), 1);
        assert_eq!(store.installed_version(&ult()).unwrap(), Some("v86".to_string()));
    }

    #[test]
    fn test_sync_continues_after_failure() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let source = FakeSource::default()
            .with_broken(&tn())
            .with_release(&ult(), "v1", &[("x.usfm", "")]);

        let report = sync_resources(&store, &source, &[tn(), ult()], |_| {});

        assert!(matches!(report.outcomes[0].1, SyncOutcome::Failed(_)));
        assert_eq!(report.outcomes[1].1, SyncOutcome::Updated("v1".to_string()));
        assert!(report.has_failures());
        assert_eq!(store.installed_version(&tn()).unwrap(), None);
    }

    #[test]
    fn test_resource_without_release_is_skipped() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());

        let mut events = Vec::new();
        let report = sync_resources(&store, &FakeSource::default(), &[ult()], |e| events.push(e.clone()));

        assert_eq!(report.outcomes[0].1, SyncOutcome::Skipped);
        assert!(!report.has_failures());
        assert!(events.contains(&SyncEvent::Skipped { id: ult() }));
    }

    #[test]
    fn test_corrupt_archive_fails_without_version() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let mut source = FakeSource::default().with_release(&ult(), "v2", &[]);
        let url = source.releases[&ult().to_string()].zipball_url.clone();
        source.archives.insert(url, b"not a zip".to_vec());

        let report = sync_resources(&store, &source, &[ult()], |_| {});

        assert_eq!(report.failed(), 1);
        assert_eq!(store.installed_version(&ult()).unwrap(), None);
    }

    #[test]
    fn test_release_url() {
        let client = Door43Client::new("https://git.door43.org/api/v1/").unwrap();
        assert_eq!(
            client.release_url(&ult()),
            "https://git.door43.org/api/v1/repos/unfoldingWord/en_ult/releases/latest"
        );
    }

    #[test]
    fn test_release_json() {
        let json = r#"{"id": 1, "tag_name": "v86", "zipball_url": "https://git.door43.org/unfoldingWord/en_ult/archive/v86.zip", "draft": false}"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v86");
    }
}
