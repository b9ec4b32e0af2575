//! Uppercase font file extensions in the staged bundle and rewrite the
//! stylesheet references to them. The org serves static-resource fonts
//! only when the extension is uppercase.

use crate::error::Result;
use crate::{io, paths};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "eot", "svg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl FontRename {
    fn old_name(&self) -> String {
        file_name(&self.from)
    }

    fn new_name(&self) -> String {
        file_name(&self.to)
    }
}

fn file_name(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Stylesheets in a staging tree that may reference font files.
pub fn stylesheets(staging: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = io::files_in(&staging.join(paths::STAGED_BUILD_DIR), |n| n.contains(".css"))?;
    sheets.extend(io::files_in(&staging.join(paths::STAGED_FONTS_DIR), |n| {
        n.ends_with(".scss")
    })?);
    Ok(sheets)
}

/// Font files directly in `font_dir` with a lowercase font extension.
pub fn plan_renames(font_dir: &Path) -> Result<Vec<FontRename>> {
    let files = io::files_in(font_dir, |name| {
        name.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && FONT_EXTENSIONS.contains(&ext))
    })?;
    Ok(files
        .into_iter()
        .filter_map(|from| {
            let name = file_name(&from);
            let (stem, ext) = name.rsplit_once('.')?;
            let to = from.with_file_name(format!("{stem}.{}", ext.to_uppercase()));
            Some(FontRename { from, to })
        })
        .collect())
}

/// Rewrite every reference to a renamed font in `css`, dropping a
/// `?v=` cache-busting suffix that directly follows it.
pub fn rewrite_refs(css: &str, renames: &[FontRename]) -> String {
    if renames.is_empty() {
        return css.to_string();
    }
    let map: HashMap<String, String> = renames
        .iter()
        .map(|r| (r.old_name(), r.new_name()))
        .collect();
    // Longest names first so `a.woff2` wins over `a.woff`.
    let mut olds: Vec<&String> = map.keys().collect();
    olds.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = olds
        .iter()
        .map(|o| regex::escape(o))
        .collect::<Vec<_>>()
        .join("|");
    // A name only matches whole: at the start or after a path or quote
    // delimiter, so `a.woff` leaves `ba.woff` alone.
    let Ok(re) = Regex::new(&format!(r#"(^|[/("'])({alternation})(\?v=[^)"'\s]*)?"#)) else {
        return css.to_string();
    };
    re.replace_all(css, |caps: &Captures| {
        let name = map.get(&caps[2]).map_or(&caps[2], String::as_str);
        format!("{}{name}", &caps[1])
    })
    .into_owned()
}

/// Rename the fonts in `font_dir` and rewrite `sheets` to match. All
/// rewritten content is computed first; if a rename or a write fails,
/// completed renames are undone before the error is returned.
pub fn uppercase_fonts(font_dir: &Path, sheets: &[PathBuf]) -> Result<Vec<FontRename>> {
    let renames = plan_renames(font_dir)?;
    if renames.is_empty() {
        return Ok(renames);
    }

    let mut rewritten = Vec::new();
    for sheet in sheets {
        let css = std::fs::read_to_string(sheet)?;
        let out = rewrite_refs(&css, &renames);
        if out != css {
            rewritten.push((sheet.clone(), out));
        }
    }

    let mut done: Vec<&FontRename> = Vec::new();
    let result = (|| -> Result<()> {
        for r in &renames {
            std::fs::rename(&r.from, &r.to)?;
            done.push(r);
        }
        for (sheet, css) in &rewritten {
            io::atomic_write(sheet, css.as_bytes())?;
        }
        Ok(())
    })();

    if let Err(e) = result {
        for r in done.iter().rev() {
            if let Err(undo) = std::fs::rename(&r.to, &r.from) {
                tracing::warn!(font = %r.to.display(), error = %undo, "could not undo font rename");
            }
        }
        return Err(e);
    }

    tracing::debug!(
        fonts = renames.len(),
        stylesheets = rewritten.len(),
        "font extensions uppercased"
    );
    Ok(renames)
}
