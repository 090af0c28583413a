use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::script::{InstallerScript, ScriptError};
use crate::catalog::{slugify, GameSlug, Runner};

/// Identifier wrapper for stored installers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstallerId(pub u64);

impl fmt::Display for InstallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A published (or unpublished) installer and the YAML text of its script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installer {
    pub id: InstallerId,
    pub game_slug: GameSlug,
    pub game_name: String,
    pub slug: String,
    pub version: String,
    pub runner: Runner,
    pub description: String,
    pub notes: String,
    pub credits: String,
    pub content: String,
    pub published: bool,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Installer {
    pub fn script(&self) -> Result<InstallerScript, ScriptError> {
        InstallerScript::parse(&self.content)
    }

    pub fn set_script(&mut self, script: &InstallerScript) -> Result<(), ScriptError> {
        self.content = script.to_yaml()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Client facing representation: metadata plus the parsed script.
    pub fn as_document(&self) -> InstallerDocument {
        let script = self
            .script()
            .ok()
            .and_then(|script| script.to_json())
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        InstallerDocument {
            id: Some(self.id),
            game_slug: self.game_slug.clone(),
            name: self.game_name.clone(),
            slug: self.slug.clone(),
            version: self.version.clone(),
            runner: self.runner.clone(),
            description: self.description.clone(),
            notes: self.notes.clone(),
            credits: self.credits.clone(),
            published: self.published,
            user: self.user.clone(),
            script,
        }
    }
}

/// Serialized installer as served over HTTP and stored on disk by the maintenance commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallerDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InstallerId>,
    pub game_slug: GameSlug,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub version: String,
    pub runner: Runner,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub credits: String,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub user: String,
    pub script: serde_json::Value,
}

fn default_published() -> bool {
    true
}

impl InstallerDocument {
    /// Rebuild an installer record, re-serialising the script as YAML.
    pub fn into_installer(self, id: InstallerId) -> Result<Installer, ScriptError> {
        let value = serde_yaml::to_value(&self.script)?;
        let script = InstallerScript::from_value(value)?;
        let slug = if self.slug.is_empty() {
            installer_slug(&self.name, &self.version)
        } else {
            self.slug
        };
        let now = Utc::now();

        Ok(Installer {
            id,
            game_slug: self.game_slug,
            game_name: self.name,
            slug,
            version: self.version,
            runner: self.runner,
            description: self.description,
            notes: self.notes,
            credits: self.credits,
            content: script.to_yaml()?,
            published: self.published,
            user: self.user,
            created_at: now,
            updated_at: now,
        })
    }
}

pub fn installer_slug(game_name: &str, version: &str) -> String {
    slugify(&format!("{game_name}-{version}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installer(content: &str) -> Installer {
        let now = Utc::now();
        Installer {
            id: InstallerId(7),
            game_slug: GameSlug("quake".to_string()),
            game_name: "Quake".to_string(),
            slug: installer_slug("Quake", "GOG"),
            version: "GOG".to_string(),
            runner: Runner::Linux,
            description: String::new(),
            notes: String::new(),
            credits: String::new(),
            content: content.to_string(),
            published: true,
            user: "strider".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn as_document_embeds_parsed_script() {
        let document = installer("game:\n  exe: quake\n").as_document();
        assert_eq!(document.slug, "quake-gog");
        assert_eq!(document.script["game"]["exe"], "quake");
    }

    #[test]
    fn as_document_falls_back_to_empty_script() {
        let document = installer("game: [unclosed").as_document();
        assert!(document.script.as_object().is_some_and(|map| map.is_empty()));
    }

    #[test]
    fn document_round_trips_into_installer() {
        let document = installer("game:\n  exe: quake\n").as_document();
        let mut document = document;
        document.slug.clear();
        let rebuilt = document.into_installer(InstallerId(9)).expect("rebuilds");
        assert_eq!(rebuilt.slug, "quake-gog");
        assert_eq!(rebuilt.script().expect("parses").game_value("exe").as_deref(), Some("quake"));
    }
}
