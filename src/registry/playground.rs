//! # Playground entity model.
//!
//! A [`Playground`] is either a cloned GitHub repository or a running container.
//! Variant-specific data lives in [`PlaygroundSource`], a tagged sum type; the
//! discriminant is serialized as `"type"` next to the common fields:
//!
//! ```text
//! {"id":"7f0c…","type":"github","createdAt":"2026-01-02T03:04:05Z",
//!  "repoUrl":"https://github.com/u/r","path":"/home/u/.playgrounds/7f0c…","runCommand":"npm run dev"}
//! {"id":"a91e…","type":"docker","createdAt":"…","image":"redis:latest","containerId":"f00d…","port":6379}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique, immutable identifier of a playground.
///
/// Cheap to clone (`Arc<str>` inside); used as the key of the registry and of
/// the supervision table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaygroundId(Arc<str>);

impl PlaygroundId {
    /// Generates a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Borrows the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaygroundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaygroundId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for PlaygroundId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for PlaygroundId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Variant tag of a playground, never changes after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaygroundKind {
    Github,
    Docker,
}

impl PlaygroundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaygroundKind::Github => "github",
            PlaygroundKind::Docker => "docker",
        }
    }
}

/// Variant-specific payload of a playground.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaygroundSource {
    /// A repository cloned to a local directory.
    Github(GithubSource),
    /// A container started from an image.
    Docker(DockerSource),
}

/// Payload of a `github` playground.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubSource {
    /// Source repository URL.
    pub repo_url: String,
    /// Local checkout directory; the dev process runs here.
    pub path: PathBuf,
    /// Declared dev command, used when `start_dev` gets no explicit command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
    /// Declared dev server port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Catalog entry this playground was installed from.
    #[serde(
        default,
        rename = "appStoreId",
        alias = "appId",
        skip_serializing_if = "Option::is_none"
    )]
    pub app_id: Option<String>,
}

/// Payload of a `docker` playground.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerSource {
    /// Image reference the container was started from.
    pub image: String,
    /// Runtime-assigned container identifier.
    pub container_id: String,
    /// Published port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// A registered playground.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playground {
    /// Unique identifier (immutable).
    pub id: PlaygroundId,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
    /// Variant payload.
    #[serde(flatten)]
    pub source: PlaygroundSource,
}

impl Playground {
    /// Creates a playground stamped with the current time.
    pub fn new(id: PlaygroundId, source: PlaygroundSource) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            source,
        }
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> PlaygroundKind {
        match self.source {
            PlaygroundSource::Github(_) => PlaygroundKind::Github,
            PlaygroundSource::Docker(_) => PlaygroundKind::Docker,
        }
    }

    /// Local working directory, for `github` playgrounds.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            PlaygroundSource::Github(g) => Some(&g.path),
            PlaygroundSource::Docker(_) => None,
        }
    }

    /// Declared run command, if any.
    pub fn run_command(&self) -> Option<&str> {
        match &self.source {
            PlaygroundSource::Github(g) => g.run_command.as_deref(),
            PlaygroundSource::Docker(_) => None,
        }
    }

    /// Container identifier, for `docker` playgrounds.
    pub fn container_id(&self) -> Option<&str> {
        match &self.source {
            PlaygroundSource::Docker(d) => Some(&d.container_id),
            PlaygroundSource::Github(_) => None,
        }
    }

    /// Declared port of either variant.
    pub fn port(&self) -> Option<u16> {
        match &self.source {
            PlaygroundSource::Github(g) => g.port,
            PlaygroundSource::Docker(d) => d.port,
        }
    }
}

/// Live status reported by `list`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaygroundStatus {
    Running,
    Stopped,
    Unknown,
}

/// A registry record overlaid with its live status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundWithStatus {
    #[serde(flatten)]
    pub playground: Playground,
    /// Container state for `docker`, dev-process liveness for `github`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaygroundStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_record_uses_flat_camel_case_shape() {
        let pg = Playground::new(
            PlaygroundId::from("abc"),
            PlaygroundSource::Github(GithubSource {
                repo_url: "https://github.com/u/r".into(),
                path: PathBuf::from("/tmp/abc"),
                run_command: Some("npm run dev".into()),
                port: Some(3000),
                app_id: None,
            }),
        );
        let v = serde_json::to_value(&pg).unwrap();
        assert_eq!(v["type"], "github");
        assert_eq!(v["id"], "abc");
        assert_eq!(v["repoUrl"], "https://github.com/u/r");
        assert_eq!(v["runCommand"], "npm run dev");
        assert!(v.get("appStoreId").is_none());
        assert!(v.get("createdAt").is_some());

        let back: Playground = serde_json::from_value(v).unwrap();
        assert_eq!(back, pg);
        assert_eq!(back.kind(), PlaygroundKind::Github);
    }

    #[test]
    fn docker_record_parses_from_stored_json() {
        let raw = r#"{"id":"d1","type":"docker","createdAt":"2026-01-02T03:04:05Z",
                      "image":"redis:latest","containerId":"f00d","port":6379}"#;
        let pg: Playground = serde_json::from_str(raw).unwrap();
        assert_eq!(pg.kind(), PlaygroundKind::Docker);
        assert_eq!(pg.container_id(), Some("f00d"));
        assert_eq!(pg.port(), Some(6379));
        assert!(pg.path().is_none());
        assert!(pg.run_command().is_none());
    }

    #[test]
    fn installed_app_is_stored_as_app_store_id() {
        let raw = r#"{"id":"g1","type":"github","createdAt":"2026-01-02T03:04:05Z",
                      "repoUrl":"https://github.com/u/todo","path":"/tmp/g1","appStoreId":"todo"}"#;
        let pg: Playground = serde_json::from_str(raw).unwrap();
        match &pg.source {
            PlaygroundSource::Github(g) => assert_eq!(g.app_id.as_deref(), Some("todo")),
            other => panic!("unexpected {other:?}"),
        }
        let v = serde_json::to_value(&pg).unwrap();
        assert_eq!(v["appStoreId"], "todo");
        assert!(v.get("appId").is_none());

        let legacy = raw.replace("appStoreId", "appId");
        let pg: Playground = serde_json::from_str(&legacy).unwrap();
        assert_eq!(serde_json::to_value(&pg).unwrap()["appStoreId"], "todo");
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(PlaygroundId::generate(), PlaygroundId::generate());
    }
}
