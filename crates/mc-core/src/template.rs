use crate::error::{McError, Result};
use serde::{Deserialize, Serialize};

/// A project template: a zip archive plus the placeholder token that is
/// replaced by the real app name once the archive is unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    /// Archive URL.
    pub repo: String,
    /// Placeholder token used throughout the template's files.
    pub name: String,
    pub desc: String,
}

/// Templates shipped with the tool, used when the remote list is unavailable.
pub fn known_templates() -> Vec<Template> {
    vec![
        Template {
            id: "ionic-shell".into(),
            repo: "http://github.com/MobileCaddy/shell-ionic/archive/master.zip".into(),
            name: "mobilecaddy-shell-ionic".into(),
            desc: "Empty Ionic skeleton project".into(),
        },
        Template {
            id: "ionic-seed-expenses".into(),
            repo: "https://github.com/MobileCaddy/seed-expenses-ionic/archive/master.zip".into(),
            name: "mobilecaddy-seed-expenses-ionic".into(),
            desc: "Ionic Time & Expenses App".into(),
        },
    ]
}

/// Fetch the template list from `url`, falling back to [`known_templates`]
/// on any transport error, non-200 status or malformed body.
pub fn fetch_list(url: &str) -> Vec<Template> {
    match try_fetch_list(url) {
        Ok(list) => list,
        Err(e) => {
            tracing::debug!(error = %e, url, "template list unavailable, using built-in list");
            known_templates()
        }
    }
}

fn try_fetch_list(url: &str) -> Result<Vec<Template>> {
    let resp = reqwest::blocking::get(url)?;
    if resp.status() != reqwest::StatusCode::OK {
        return Err(McError::Network(format!("template list returned {}", resp.status())));
    }
    let body = resp.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// Where a new project's archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Template(Template),
    /// A direct archive URL; no placeholder substitution is known for it.
    Url(String),
}

impl ArchiveSource {
    pub fn url(&self) -> &str {
        match self {
            ArchiveSource::Template(t) => &t.repo,
            ArchiveSource::Url(u) => u,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match self {
            ArchiveSource::Template(t) => Some(&t.name),
            ArchiveSource::Url(_) => None,
        }
    }
}

/// Match `input` against template ids, else accept it as an http(s) URL.
pub fn resolve(templates: &[Template], input: &str) -> Result<ArchiveSource> {
    if let Some(t) = templates.iter().find(|t| t.id == input) {
        return Ok(ArchiveSource::Template(t.clone()));
    }
    match reqwest::Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(ArchiveSource::Url(input.to_string()))
        }
        _ => Err(McError::UnknownTemplate(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_id() {
        let src = resolve(&known_templates(), "ionic-shell").unwrap();
        assert_eq!(src.placeholder(), Some("mobilecaddy-shell-ionic"));
        assert!(src.url().ends_with("master.zip"));
    }

    #[test]
    fn resolves_url() {
        let src = resolve(&known_templates(), "https://example.com/app.zip").unwrap();
        assert_eq!(src, ArchiveSource::Url("https://example.com/app.zip".into()));
        assert_eq!(src.placeholder(), None);
    }

    #[test]
    fn rejects_unknown_non_url() {
        for input in ["no-such-template", "ftp://example.com/a.zip", "example.com/a.zip"] {
            let err = resolve(&known_templates(), input).unwrap_err();
            assert!(matches!(err, McError::UnknownTemplate(_)), "{input}");
        }
    }

    #[test]
    fn remote_list_is_used_when_available() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/templates.json")
            .with_status(200)
            .with_body(
                r#"[{"id":"ionic3-shell","repo":"https://example.com/s.zip","name":"mc-shell","desc":"Ionic 3 shell"}]"#,
            )
            .create();
        let list = fetch_list(&format!("{}/templates.json", server.url()));
        mock.assert();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "ionic3-shell");
    }

    #[test]
    fn non_200_falls_back_to_builtin_list() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/templates.json").with_status(500).create();
        let list = fetch_list(&format!("{}/templates.json", server.url()));
        assert_eq!(list, known_templates());
    }

    #[test]
    fn malformed_body_falls_back_to_builtin_list() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/templates.json")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create();
        let list = fetch_list(&format!("{}/templates.json", server.url()));
        assert_eq!(list, known_templates());
    }
}
