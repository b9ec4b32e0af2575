//! Zip creation and extraction.

use crate::error::{McError, Result};
use crate::io;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path};
use zip::write::SimpleFileOptions;

/// Zip every file under `src` into `dest`, with entry names relative to
/// `src` and `/`-separated. Returns the size of the written archive.
pub fn zip_dir(src: &Path, dest: &Path) -> Result<u64> {
    let file = File::create(dest)?;
    let mut zw = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries = 0usize;
    for path in io::walk_files(src)? {
        let rel = path.strip_prefix(src).unwrap_or(&path);
        zw.start_file(entry_name(rel), options)?;
        let data = std::fs::read(&path)?;
        zw.write_all(&data)?;
        entries += 1;
    }
    let mut file = zw.finish()?;
    file.flush()?;
    let size = file.metadata()?.len();
    tracing::debug!(entries, size, dest = %dest.display(), "wrote zip");
    Ok(size)
}

fn entry_name(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Extract `archive` into `dest`. Any failure is an `Extract` error.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| McError::Extract(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| McError::Extract(e.to_string()))?;
    io::ensure_dir(dest)?;
    zip.extract(dest)
        .map_err(|e| McError::Extract(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn zip_then_extract_preserves_layout() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("mc-tmp");
        std::fs::create_dir_all(src.join("build")).unwrap();
        std::fs::write(src.join("index.html"), "<html></html>").unwrap();
        std::fs::write(src.join("build/app.js"), "console.log(1)").unwrap();

        let zip_path = dir.path().join("MyApp_001.zip");
        let size = zip_dir(&src, &zip_path).unwrap();
        assert_eq!(size, std::fs::metadata(&zip_path).unwrap().len());

        let out = dir.path().join("out");
        extract(&zip_path, &out).unwrap();
        assert_eq!(
            std::fs::read_to_string(out.join("build/app.js")).unwrap(),
            "console.log(1)"
        );
        assert!(out.join("index.html").exists());
    }

    #[test]
    fn extract_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.zip");
        std::fs::write(&bogus, "this is not a zip").unwrap();
        let err = extract(&bogus, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, McError::Extract(_)));
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let rel = Path::new("assets").join("fonts").join("a.WOFF");
        assert_eq!(entry_name(&rel), "assets/fonts/a.WOFF");
    }
}
