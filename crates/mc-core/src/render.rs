//! Apex page rendering.
//!
//! Each page template is copied into the staging tree under its resource
//! name and then run through an ordered list of substitutions. The deploy
//! list is built by [`deploy_substitutions`]; the order matters, since
//! later replacements embed names that earlier ones produced.

use crate::error::{McError, Result};
use crate::manifest::ResourceNames;
use crate::{io, paths};
use regex::{NoExpand, Regex};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const APP_RESOURCE_TOKEN: &str = "<MY_APP_RESOURCE>";
pub const CACHE_RESOURCE_TOKEN: &str = "<MY_CACHE_RESOURCE>";
pub const SW_RESOURCE_TOKEN: &str = "<MY_SW_RESOURCE>";
pub const VERSION_INFO_MARKER: &str = "<!-- MOBILECADDY-VSN-INFO -->";
pub const BUILD_SCRIPTS_MARKER: &str = "<!-- BUILD-SCRIPTS-DO-NOT-REMOVE -->";

/// Build scripts the pages load some other way.
const EXCLUDED_SCRIPTS: &[&str] = &["sw-toolbox.js", "polyfills.js", "vendor.js", "main.js"];

/// Packages listed in the version-info comment block.
const VERSION_INFO_PACKAGES: &[(&str, &str)] = &[
    ("mobilecaddy-angular", "mobilecaddy-angular"),
    ("mobilecaddy-utils", "mobilecaddy-utils"),
    ("ionic", "ionic-angular"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Start,
    Cache,
    ServiceWorker,
}

impl PageKind {
    pub fn description(&self) -> &'static str {
        match self {
            PageKind::Start => "MobileCaddy StartPage",
            PageKind::Cache => "MobileCaddy CachePage",
            PageKind::ServiceWorker => "MobileCaddy ServiceWorker",
        }
    }
}

/// A page template and the name of the page rendered from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    pub source: PathBuf,
    pub name: String,
    pub kind: PageKind,
}

/// A page written into the staging tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderedPage {
    pub name: String,
    pub path: PathBuf,
    pub kind: PageKind,
}

/// Replace every match of `pattern` with `replacement` in the pages named
/// by `pages` (all rendered pages when empty). The replacement is literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub pages: Vec<String>,
    /// An optional substitution may match nothing.
    pub optional: bool,
}

impl Substitution {
    /// Literal token replacement across all pages.
    pub fn token(token: &str, replacement: impl Into<String>) -> Self {
        Self {
            pattern: regex::escape(token),
            replacement: replacement.into(),
            pages: Vec::new(),
            optional: false,
        }
    }

    pub fn in_page(mut self, page: &str) -> Self {
        self.pages.push(page.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Copy each template into `staging` as `<name>.apex` and apply
/// `substitutions` in order.
pub fn render(
    staging: &Path,
    templates: &[PageTemplate],
    substitutions: &[Substitution],
) -> Result<Vec<RenderedPage>> {
    let mut pages = Vec::with_capacity(templates.len());
    for t in templates {
        if !t.source.is_file() {
            return Err(McError::TemplateNotFound(t.source.clone()));
        }
        let path = paths::staged_page(staging, &t.name);
        std::fs::copy(&t.source, &path)?;
        tracing::debug!(page = %t.name, source = %t.source.display(), "page staged");
        pages.push(RenderedPage {
            name: t.name.clone(),
            path,
            kind: t.kind,
        });
    }

    for sub in substitutions {
        apply(sub, &pages)?;
    }
    Ok(pages)
}

fn apply(sub: &Substitution, pages: &[RenderedPage]) -> Result<()> {
    let re = Regex::new(&sub.pattern).map_err(|e| McError::SubstitutionFailed {
        pattern: sub.pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut matched = 0;
    for page in pages
        .iter()
        .filter(|p| sub.pages.is_empty() || sub.pages.contains(&p.name))
    {
        let content = std::fs::read_to_string(&page.path)?;
        let hits = re.find_iter(&content).count();
        if hits == 0 {
            continue;
        }
        let out = re.replace_all(&content, NoExpand(&sub.replacement));
        std::fs::write(&page.path, out.as_bytes())?;
        matched += hits;
    }

    if matched == 0 && !sub.optional {
        return Err(McError::SubstitutionFailed {
            pattern: sub.pattern.clone(),
            reason: "no match in any target page".to_string(),
        });
    }
    tracing::debug!(pattern = %sub.pattern, matched, "substitution applied");
    Ok(())
}

/// The page templates a deploy renders. The service-worker page is only
/// rendered when the project ships its template.
pub fn deploy_pages(root: &Path, names: &ResourceNames) -> Vec<PageTemplate> {
    let mut pages = vec![
        PageTemplate {
            source: root.join(paths::START_PAGE_TEMPLATE),
            name: names.app.clone(),
            kind: PageKind::Start,
        },
        PageTemplate {
            source: root.join(paths::CACHE_PAGE_TEMPLATE),
            name: names.cache_page.clone(),
            kind: PageKind::Cache,
        },
    ];
    let sw = root.join(paths::SW_PAGE_TEMPLATE);
    if sw.is_file() {
        pages.push(PageTemplate {
            source: sw,
            name: names.sw_page.clone(),
            kind: PageKind::ServiceWorker,
        });
    }
    pages
}

/// Script file names in the staged build directory that the pages must
/// load, sorted by name.
pub fn build_scripts(build_dir: &Path) -> Result<Vec<String>> {
    let files = io::files_in(build_dir, |name| {
        Path::new(name).extension().is_some_and(|e| e == "js") && !EXCLUDED_SCRIPTS.contains(&name)
    })?;
    Ok(files
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect())
}

/// Comment block naming installed framework versions.
pub fn version_info_block(installed: &BTreeMap<String, String>) -> String {
    let mut block = String::from("<!--");
    for (label, package) in VERSION_INFO_PACKAGES {
        let vsn = installed.get(*package).map(String::as_str).unwrap_or("unknown");
        block.push_str(&format!("\n  // {label} v{vsn}"));
    }
    block.push_str("\n-->");
    block
}

/// The ordered substitutions for a deploy.
pub fn deploy_substitutions(
    names: &ResourceNames,
    installed: &BTreeMap<String, String>,
    scripts: &[String],
) -> Vec<Substitution> {
    let app = &names.app;
    let start_scripts: String = scripts
        .iter()
        .map(|f| format!("\n    <script src=\"{{!URLFOR($Resource.{app}, 'build/{f}')}}\"></script>"))
        .collect();
    let cache_entries: String = scripts
        .iter()
        .map(|f| format!("\n{{!URLFOR($Resource.{app}, 'build/{f}')}}"))
        .collect();

    vec![
        Substitution::token(APP_RESOURCE_TOKEN, app.clone()),
        Substitution::token(CACHE_RESOURCE_TOKEN, names.cache_page.clone()),
        Substitution::token(SW_RESOURCE_TOKEN, names.sw_page.clone()).optional(),
        Substitution::token(VERSION_INFO_MARKER, version_info_block(installed)).optional(),
        Substitution::token(BUILD_SCRIPTS_MARKER, start_scripts).in_page(app),
        Substitution::token(BUILD_SCRIPTS_MARKER, cache_entries).in_page(&names.cache_page),
    ]
}

/// Set every `<title>…</title>` in `file` to `title`. A missing file is
/// skipped; returns whether the file changed.
pub fn replace_title(file: &Path, title: &str) -> Result<bool> {
    if !file.is_file() {
        return Ok(false);
    }
    let re = Regex::new(r"<title>.*</title>").map_err(|e| McError::SubstitutionFailed {
        pattern: "<title>".into(),
        reason: e.to_string(),
    })?;
    let content = std::fs::read_to_string(file)?;
    let replacement = format!("<title>{title}</title>");
    let out = re.replace_all(&content, NoExpand(&replacement));
    if out == content {
        return Ok(false);
    }
    io::atomic_write(file, out.as_bytes())?;
    Ok(true)
}

/// Retitle the entry HTML and the start-page template.
pub fn replace_titles(root: &Path, title: &str) -> Result<()> {
    for file in [paths::entry_html(root), root.join(paths::START_PAGE_TEMPLATE)] {
        if replace_title(&file, title)? {
            tracing::debug!(file = %file.display(), title, "title replaced");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const START: &str = "<apex:page>\n<title>x</title>\n<!-- MOBILECADDY-VSN-INFO -->\n\
        <link href=\"{!URLFOR($Resource.<MY_APP_RESOURCE>, 'build/main.css')}\"/>\n\
        <!-- BUILD-SCRIPTS-DO-NOT-REMOVE -->\n</apex:page>\n";
    const CACHE: &str = "CACHE MANIFEST\n# <MY_CACHE_RESOURCE>\n\
        {!URLFOR($Resource.<MY_APP_RESOURCE>, 'build/main.css')}\n\
        <!-- BUILD-SCRIPTS-DO-NOT-REMOVE -->\n";

    fn names() -> ResourceNames {
        ResourceNames {
            app: "MyApp_001".into(),
            cache_page: "MyAppCache_001".into(),
            sw_page: "MyAppSW_001".into(),
            bundle_file: "MyApp_001.zip".into(),
        }
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(paths::TEMPLATES_DIR)).unwrap();
        std::fs::write(dir.path().join(paths::START_PAGE_TEMPLATE), START).unwrap();
        std::fs::write(dir.path().join(paths::CACHE_PAGE_TEMPLATE), CACHE).unwrap();
        std::fs::create_dir_all(dir.path().join("mc-tmp/build")).unwrap();
        dir
    }

    #[test]
    fn build_scripts_skip_denylist_and_non_js() {
        let dir = TempDir::new().unwrap();
        for f in ["main.js", "vendor.js", "polyfills.js", "sw-toolbox.js", "app.js", "0.js", "main.css", "app.js.map"] {
            std::fs::write(dir.path().join(f), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.js")).unwrap();
        assert_eq!(build_scripts(dir.path()).unwrap(), ["0.js", "app.js"]);
    }

    #[test]
    fn deploy_render_fills_every_placeholder() {
        let dir = project();
        let staging = dir.path().join("mc-tmp");
        std::fs::write(staging.join("build/app.js"), "").unwrap();
        std::fs::write(staging.join("build/main.js"), "").unwrap();
        let scripts = build_scripts(&staging.join("build")).unwrap();

        let mut installed = BTreeMap::new();
        installed.insert("mobilecaddy-utils".to_string(), "1.4.0".to_string());
        let pages = render(
            &staging,
            &deploy_pages(dir.path(), &names()),
            &deploy_substitutions(&names(), &installed, &scripts),
        )
        .unwrap();
        assert_eq!(pages.len(), 2);

        let start = std::fs::read_to_string(staging.join("MyApp_001.apex")).unwrap();
        assert!(!start.contains("<MY_APP_RESOURCE>"));
        assert!(!start.contains("BUILD-SCRIPTS"));
        assert!(start.contains("$Resource.MyApp_001, 'build/main.css'"));
        assert_eq!(start.matches("<script src=").count(), 1);
        assert!(start.contains(
            "<script src=\"{!URLFOR($Resource.MyApp_001, 'build/app.js')}\"></script>"
        ));
        assert!(start.contains("// mobilecaddy-utils v1.4.0"));
        assert!(start.contains("// ionic vunknown"));

        let cache = std::fs::read_to_string(staging.join("MyAppCache_001.apex")).unwrap();
        assert!(cache.contains("# MyAppCache_001"));
        assert!(cache.contains("\n{!URLFOR($Resource.MyApp_001, 'build/app.js')}"));
        assert!(!cache.contains("<script"));
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("mc-tmp")).unwrap();
        let err = render(
            &dir.path().join("mc-tmp"),
            &deploy_pages(dir.path(), &names()),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, McError::TemplateNotFound(_)));
    }

    #[test]
    fn required_pattern_without_match_fails() {
        let dir = project();
        std::fs::write(
            dir.path().join(paths::CACHE_PAGE_TEMPLATE),
            "# <MY_CACHE_RESOURCE>\n",
        )
        .unwrap();
        let err = render(
            &dir.path().join("mc-tmp"),
            &deploy_pages(dir.path(), &names()),
            &deploy_substitutions(&names(), &BTreeMap::new(), &[]),
        )
        .unwrap_err();
        match err {
            McError::SubstitutionFailed { pattern, .. } => {
                assert!(pattern.contains("BUILD"), "{pattern}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_pattern_fails() {
        let dir = project();
        let err = render(
            &dir.path().join("mc-tmp"),
            &deploy_pages(dir.path(), &names()),
            &[Substitution {
                pattern: "(unclosed".into(),
                replacement: String::new(),
                pages: Vec::new(),
                optional: true,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, McError::SubstitutionFailed { .. }));
    }

    #[test]
    fn sw_page_rendered_only_when_template_exists() {
        let dir = project();
        assert_eq!(deploy_pages(dir.path(), &names()).len(), 2);
        std::fs::write(dir.path().join(paths::SW_PAGE_TEMPLATE), "<MY_SW_RESOURCE>").unwrap();
        let pages = deploy_pages(dir.path(), &names());
        assert_eq!(pages[2].name, "MyAppSW_001");
        assert_eq!(pages[2].kind, PageKind::ServiceWorker);
    }

    #[test]
    fn titles_are_replaced_literally() {
        let dir = project();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("src/index.html"),
            "<head><title>shell</title></head>",
        )
        .unwrap();
        replace_titles(dir.path(), "Cost $1 app").unwrap();
        let html = std::fs::read_to_string(dir.path().join("src/index.html")).unwrap();
        assert_eq!(html, "<head><title>Cost $1 app</title></head>");
        let start = std::fs::read_to_string(dir.path().join(paths::START_PAGE_TEMPLATE)).unwrap();
        assert!(start.contains("<title>Cost $1 app</title>"));
    }
}
