use lutris_web::error::AppError;
use lutris_web::installers::{InstallerDocument, InstallerId, InstallerRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

const DOCUMENT_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Installer document loaded from disk, with the file it came from.
#[derive(Debug, Clone)]
pub(crate) struct SeededInstaller {
    pub(crate) path: PathBuf,
    pub(crate) slug: String,
    pub(crate) document_id: Option<InstallerId>,
}

#[derive(Debug, Default)]
pub(crate) struct SeedReport {
    pub(crate) installers: Vec<SeededInstaller>,
    pub(crate) failures: Vec<(PathBuf, String)>,
}

impl SeedReport {
    pub(crate) fn path_for(&self, slug: &str) -> Option<&SeededInstaller> {
        self.installers.iter().find(|seeded| seeded.slug == slug)
    }
}

/// Installer documents under `root`, sorted so ids are stable between runs.
pub(crate) fn installer_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();
    files.sort();
    files
}

pub(crate) fn read_document(path: &Path) -> Result<InstallerDocument, String> {
    let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_yaml::from_str(&text).map_err(|err| err.to_string())
}

/// Load every installer document under `root` into `repository`.
///
/// Unreadable or conflicting documents are reported and skipped.
pub(crate) fn seed_installers<R>(repository: &R, root: &Path) -> Result<SeedReport, AppError>
where
    R: InstallerRepository,
{
    if !root.is_dir() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("installer directory {} does not exist", root.display()),
        )));
    }

    let mut report = SeedReport::default();
    for path in installer_files(root) {
        let loaded = read_document(&path).and_then(|document| {
            let document_id = document.id;
            let installer = document
                .into_installer(repository.next_id().map_err(|err| err.to_string())?)
                .map_err(|err| err.to_string())?;
            let installer = repository
                .insert(installer)
                .map_err(|err| err.to_string())?;
            Ok(SeededInstaller {
                path: path.clone(),
                slug: installer.slug,
                document_id,
            })
        });

        match loaded {
            Ok(seeded) => report.installers.push(seeded),
            Err(reason) => {
                warn!(path = %path.display(), error = %reason, "skipping installer document");
                report.failures.push((path, reason));
            }
        }
    }

    info!(
        loaded = report.installers.len(),
        failed = report.failures.len(),
        root = %root.display(),
        "installer documents loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lutris_web::installers::InMemoryInstallerRepository;
    use std::fs;

    const DOCUMENT: &str = r#"
game_slug: quake
name: Quake
version: GOG
runner: linux
script:
  game:
    exe: game/quake
"#;

    #[test]
    fn documents_are_loaded_recursively_and_failures_kept() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("q")).expect("sub dir");
        fs::write(dir.path().join("q").join("quake-gog.yml"), DOCUMENT).expect("write");
        fs::write(
            dir.path().join("quake-copy.yaml"),
            DOCUMENT,
        )
        .expect("write");
        fs::write(dir.path().join("broken.json"), "{\"name\": ").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let repository = InMemoryInstallerRepository::default();
        let report = seed_installers(&repository, dir.path()).expect("seed runs");

        assert_eq!(report.installers.len(), 1);
        assert_eq!(report.installers[0].slug, "quake-gog");
        assert!(report.path_for("quake-gog").is_some());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(repository.list().expect("list").len(), 1);
    }

    #[test]
    fn missing_directories_are_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repository = InMemoryInstallerRepository::default();
        let result = seed_installers(&repository, &dir.path().join("absent"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
