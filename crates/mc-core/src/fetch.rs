//! Download a template archive and unpack it as a new project directory.

use crate::archive;
use crate::error::{McError, Result};
use crate::io;
use crate::template::{self, ArchiveSource, Template};
use std::path::{Path, PathBuf};

pub struct ArchiveFetcher {
    client: reqwest::blocking::Client,
}

impl Default for ArchiveFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Resolve `template_or_url` against `templates` and unpack it into
    /// `target_dir`, replacing the template placeholder with `app_name`.
    pub fn fetch(
        &self,
        templates: &[Template],
        template_or_url: &str,
        target_dir: &Path,
        app_name: &str,
    ) -> Result<ArchiveSource> {
        validate_target(target_dir)?;
        let source = template::resolve(templates, template_or_url)?;
        self.fetch_source(&source, target_dir, app_name)?;
        Ok(source)
    }

    pub fn fetch_source(
        &self,
        source: &ArchiveSource,
        target_dir: &Path,
        app_name: &str,
    ) -> Result<()> {
        validate_target(target_dir)?;

        // Unpack next to the target so the final rename stays on one filesystem.
        let parent = match target_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        io::ensure_dir(&parent)?;
        let tmp = tempfile::Builder::new()
            .prefix(".mobilecaddy-")
            .tempdir_in(&parent)?;

        let zip_path = tmp.path().join("template.zip");
        self.download(source.url(), &zip_path)?;

        let extract_dir = tmp.path().join("extract");
        archive::extract(&zip_path, &extract_dir)?;
        let root = single_root(&extract_dir)?;

        std::fs::rename(&root, target_dir).map_err(|e| McError::Rename(e.to_string()))?;
        tracing::info!(target = %target_dir.display(), "template unpacked");

        if let Some(placeholder) = source.placeholder() {
            let changed = io::replace_in_tree(target_dir, placeholder, app_name)?;
            tracing::debug!(placeholder, app_name, changed, "placeholder replaced");
        }
        Ok(())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let fail = |cause: String| McError::Download {
            url: url.to_string(),
            cause,
        };
        tracing::debug!(url, "downloading archive");
        let resp = self.client.get(url).send().map_err(|e| fail(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(fail(format!("HTTP {}", resp.status())));
        }
        let bytes = resp.bytes().map_err(|e| fail(e.to_string()))?;
        std::fs::write(dest, &bytes).map_err(|e| fail(e.to_string()))?;
        Ok(())
    }
}

/// A new project may not be created in `.` or over an existing path.
pub fn validate_target(target_dir: &Path) -> Result<()> {
    if target_dir == Path::new(".") || target_dir.as_os_str().is_empty() || target_dir.exists() {
        return Err(McError::InvalidTarget(target_dir.to_path_buf()));
    }
    Ok(())
}

fn single_root(dir: &Path) -> Result<PathBuf> {
    let entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Err(McError::Extract(format!(
            "expected a single top-level folder, found {} entries",
            entries.len()
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Zip bytes for a template laid out under one root folder.
    pub(crate) fn template_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        for (rel, content) in files {
            let path = src.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        let zip_path = dir.path().join("t.zip");
        archive::zip_dir(&src, &zip_path).unwrap();
        std::fs::read(zip_path).unwrap()
    }

    fn shell_template(url: String) -> Template {
        Template {
            id: "ionic-shell".into(),
            repo: url,
            name: "mobilecaddy-shell-ionic".into(),
            desc: "shell".into(),
        }
    }

    #[test]
    fn dot_and_existing_targets_are_rejected_before_download() {
        let dir = TempDir::new().unwrap();
        let fetcher = ArchiveFetcher::new();
        let templates = vec![shell_template("http://127.0.0.1:9/never.zip".into())];

        let err = fetcher
            .fetch(&templates, "ionic-shell", Path::new("."), "app")
            .unwrap_err();
        assert!(matches!(err, McError::InvalidTarget(_)));

        let err = fetcher
            .fetch(&templates, "ionic-shell", dir.path(), "app")
            .unwrap_err();
        assert!(matches!(err, McError::InvalidTarget(_)));
    }

    #[test]
    fn fetch_unpacks_and_replaces_placeholder() {
        let zip = template_zip(&[
            (
                "shell-ionic-master/package.json",
                r#"{"name":"mobilecaddy-shell-ionic","version":"0.0.1"}"#,
            ),
            (
                "shell-ionic-master/src/index.html",
                "<title>mobilecaddy-shell-ionic</title><p>mobilecaddy</p>",
            ),
        ]);
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/master.zip")
            .with_status(200)
            .with_body(zip)
            .create();

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("my-app");
        let templates = vec![shell_template(format!("{}/master.zip", server.url()))];
        let source = ArchiveFetcher::new()
            .fetch(&templates, "ionic-shell", &target, "my-app")
            .unwrap();

        assert_eq!(source.placeholder(), Some("mobilecaddy-shell-ionic"));
        let pkg = std::fs::read_to_string(target.join("package.json")).unwrap();
        assert!(pkg.contains(r#""name":"my-app""#));
        let html = std::fs::read_to_string(target.join("src/index.html")).unwrap();
        assert_eq!(html, "<title>my-app</title><p>mobilecaddy</p>");

        // No temp folders left next to the target.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".mobilecaddy-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn http_error_is_download_error() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.zip").with_status(404).create();
        let dir = TempDir::new().unwrap();
        let source = ArchiveSource::Url(format!("{}/missing.zip", server.url()));
        let err = ArchiveFetcher::new()
            .fetch_source(&source, &dir.path().join("app"), "app")
            .unwrap_err();
        assert!(matches!(err, McError::Download { .. }));
        assert!(!dir.path().join("app").exists());
    }

    #[test]
    fn archive_with_several_roots_is_extract_error() {
        let zip = template_zip(&[("a/one.txt", "1"), ("b/two.txt", "2")]);
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/two-roots.zip")
            .with_status(200)
            .with_body(zip)
            .create();
        let dir = TempDir::new().unwrap();
        let source = ArchiveSource::Url(format!("{}/two-roots.zip", server.url()));
        let err = ArchiveFetcher::new()
            .fetch_source(&source, &dir.path().join("app"), "app")
            .unwrap_err();
        assert!(matches!(err, McError::Extract(_)));
    }
}
