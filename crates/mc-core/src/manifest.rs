//! The project's `package.json`, read once per command and passed to every
//! stage that needs it. All remote artifact names derive from it.

use crate::error::{McError, Result};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Dependency names that identify the Ionic/Angular generation of a project.
const ANGULAR_DEPENDENCIES: &[&str] = &["ionic-angular", "@ionic/angular"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mobilecaddy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_app_vsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc_utils_resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sf_mobile_application: Option<String>,
    /// Container generation tag (e.g. `3GC`); suffixes every artifact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc_container_vsn: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Deterministic names of everything a deploy produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNames {
    /// Static resource holding the zipped bundle; also the start page name.
    pub app: String,
    pub cache_page: String,
    pub sw_page: String,
    pub bundle_file: String,
}

/// Which project-initialization path a scaffolded template needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    /// Ionic 2+ (webpack / app-scripts build).
    Modern { major: u64 },
    /// Ionic 1 or no Ionic/Angular dependency at all.
    Legacy,
}

impl ProjectManifest {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::manifest_path(root);
        if !path.exists() {
            return Err(McError::ManifestNotFound(root.to_path_buf()));
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn sf_app_name(&self) -> Result<&str> {
        required(&self.sf_app_name, "sf_app_name")
    }

    pub fn sf_app_vsn(&self) -> Result<&str> {
        required(&self.sf_app_vsn, "sf_app_vsn")
    }

    pub fn container_version(&self) -> Option<&str> {
        self.mc_container_vsn.as_deref().filter(|s| !s.is_empty())
    }

    pub fn resource_names(&self) -> Result<ResourceNames> {
        let app_name = self.sf_app_name()?;
        let vsn = self.sf_app_vsn()?;
        let suffix = self
            .container_version()
            .map(|c| format!("_{c}"))
            .unwrap_or_default();
        let app = format!("{app_name}_{vsn}{suffix}");
        Ok(ResourceNames {
            bundle_file: format!("{app}.zip"),
            cache_page: format!("{app_name}Cache_{vsn}{suffix}"),
            sw_page: format!("{app_name}SW_{vsn}{suffix}"),
            app,
        })
    }

    /// Declared version range for `name` in dependencies or devDependencies.
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
            .map(String::as_str)
    }

    pub fn framework(&self) -> Framework {
        ANGULAR_DEPENDENCIES
            .iter()
            .filter_map(|dep| self.dependency(dep))
            .filter_map(parse_major)
            .next()
            .filter(|major| *major >= 2)
            .map(|major| Framework::Modern { major })
            .unwrap_or(Framework::Legacy)
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| McError::ManifestField(name.to_string()))
}

/// Major component of a semver-like range such as `^3.9.2` or `~1.3.0`.
pub fn parse_major(range: &str) -> Option<u64> {
    let trimmed = range.trim_start_matches(|c: char| "^~>=<v ".contains(c));
    let digits: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Set the `name` field of `package.json`, keeping every other key in place.
pub fn set_name(root: &Path, app_name: &str) -> Result<()> {
    let path = paths::manifest_path(root);
    if !path.exists() {
        return Err(McError::ManifestNotFound(root.to_path_buf()));
    }
    let data = std::fs::read_to_string(&path)?;
    let mut value: serde_json::Value = serde_json::from_str(&data)?;
    let Some(obj) = value.as_object_mut() else {
        return Err(McError::ManifestField("name".to_string()));
    };
    obj.insert(
        "name".to_string(),
        serde_json::Value::String(app_name.to_string()),
    );
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    io::atomic_write(&path, out.as_bytes())
}

/// Installed package versions read from `node_modules/*/package.json`
/// (and one level into `@scope/` directories). Unreadable entries are skipped.
pub fn installed_versions(root: &Path) -> Result<BTreeMap<String, String>> {
    let modules = root.join(paths::NODE_MODULES_DIR);
    let mut versions = BTreeMap::new();
    if !modules.is_dir() {
        return Ok(versions);
    }
    for entry in std::fs::read_dir(&modules)? {
        let entry = entry?;
        let dir = entry.path();
        if entry.file_name().to_string_lossy().starts_with('@') && dir.is_dir() {
            for scoped in std::fs::read_dir(&dir)? {
                read_package_version(&scoped?.path(), &mut versions);
            }
        } else {
            read_package_version(&dir, &mut versions);
        }
    }
    Ok(versions)
}

fn read_package_version(dir: &Path, out: &mut BTreeMap<String, String>) {
    #[derive(Deserialize)]
    struct Pkg {
        name: String,
        version: String,
    }
    let Ok(data) = std::fs::read_to_string(dir.join(paths::MANIFEST_FILE)) else {
        return;
    };
    if let Ok(pkg) = serde_json::from_str::<Pkg>(&data) {
        out.insert(pkg.name, pkg.version);
    }
}

/// The `window.DEVICE_APP_NAME = '...'` value declared in the entry HTML,
/// with non-word characters stripped. Empty if not declared.
pub fn device_app_name(root: &Path) -> Result<String> {
    let path = root.join(paths::SRC_INDEX_HTML);
    if !path.exists() {
        return Ok(String::new());
    }
    let content = std::fs::read_to_string(&path)?;
    let name = content
        .lines()
        .filter(|l| l.contains("window.DEVICE_APP_NAME"))
        .filter_map(|l| l.split('=').nth(1))
        .last()
        .map(|v| {
            v.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect()
        })
        .unwrap_or_default();
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(json: &str) -> ProjectManifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resource_names_derive_from_sf_fields() {
        let m = manifest(r#"{"name":"shell","version":"1.0.0","sf_app_name":"MyApp","sf_app_vsn":"002"}"#);
        let names = m.resource_names().unwrap();
        assert_eq!(names.app, "MyApp_002");
        assert_eq!(names.cache_page, "MyAppCache_002");
        assert_eq!(names.sw_page, "MyAppSW_002");
        assert_eq!(names.bundle_file, "MyApp_002.zip");
    }

    #[test]
    fn container_version_suffixes_every_name() {
        let m = manifest(
            r#"{"sf_app_name":"MyApp","sf_app_vsn":"002","mc_container_vsn":"3GC"}"#,
        );
        let names = m.resource_names().unwrap();
        assert_eq!(names.app, "MyApp_002_3GC");
        assert_eq!(names.cache_page, "MyAppCache_002_3GC");
        assert_eq!(names.bundle_file, "MyApp_002_3GC.zip");
    }

    #[test]
    fn missing_sf_fields_are_reported_by_name() {
        let m = manifest(r#"{"name":"shell","sf_app_vsn":"001"}"#);
        let err = m.resource_names().unwrap_err();
        assert!(matches!(err, McError::ManifestField(f) if f == "sf_app_name"));
    }

    #[test]
    fn framework_follows_angular_major() {
        let m = manifest(r#"{"dependencies":{"ionic-angular":"^3.9.2"}}"#);
        assert_eq!(m.framework(), Framework::Modern { major: 3 });
        let m = manifest(r#"{"devDependencies":{"@ionic/angular":"~4.1.0"}}"#);
        assert_eq!(m.framework(), Framework::Modern { major: 4 });
        let m = manifest(r#"{"dependencies":{"ionic-angular":"1.3.1"}}"#);
        assert_eq!(m.framework(), Framework::Legacy);
        let m = manifest(r#"{"dependencies":{"lodash":"4.0.0"}}"#);
        assert_eq!(m.framework(), Framework::Legacy);
    }

    #[test]
    fn parse_major_strips_range_operators() {
        assert_eq!(parse_major("^3.9.2"), Some(3));
        assert_eq!(parse_major(">=12.1"), Some(12));
        assert_eq!(parse_major("latest"), None);
    }

    #[test]
    fn set_name_keeps_other_keys_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name":"mobilecaddy-shell-ionic","version":"1.0.0","sf_app_name":"Shell"}"#,
        )
        .unwrap();
        set_name(dir.path(), "my-app").unwrap();
        let text = std::fs::read_to_string(dir.path().join("package.json")).unwrap();
        let name_pos = text.find("\"name\"").unwrap();
        let version_pos = text.find("\"version\"").unwrap();
        assert!(name_pos < version_pos);
        let m = ProjectManifest::load(dir.path()).unwrap();
        assert_eq!(m.name, "my-app");
        assert_eq!(m.sf_app_name.as_deref(), Some("Shell"));
    }

    #[test]
    fn installed_versions_reads_node_modules() {
        let dir = TempDir::new().unwrap();
        let nm = dir.path().join("node_modules");
        std::fs::create_dir_all(nm.join("mobilecaddy-utils")).unwrap();
        std::fs::create_dir_all(nm.join("@ionic/core")).unwrap();
        std::fs::create_dir_all(nm.join("broken")).unwrap();
        std::fs::write(
            nm.join("mobilecaddy-utils/package.json"),
            r#"{"name":"mobilecaddy-utils","version":"1.4.0"}"#,
        )
        .unwrap();
        std::fs::write(
            nm.join("@ionic/core/package.json"),
            r#"{"name":"@ionic/core","version":"4.0.0"}"#,
        )
        .unwrap();
        std::fs::write(nm.join("broken/package.json"), "not json").unwrap();

        let versions = installed_versions(dir.path()).unwrap();
        assert_eq!(versions.get("mobilecaddy-utils").map(String::as_str), Some("1.4.0"));
        assert_eq!(versions.get("@ionic/core").map(String::as_str), Some("4.0.0"));
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn device_app_name_is_parsed_from_entry_html() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("src/index.html"),
            "<script>\n  window.DEVICE_APP_NAME = 'Expenses-App';\n</script>",
        )
        .unwrap();
        assert_eq!(device_app_name(dir.path()).unwrap(), "ExpensesApp");
    }
}
