//! Catalog vocabulary shared by installers: games, runners and slugs.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

const MAX_SLUG_LENGTH: usize = 50;

/// Identifier wrapper for catalog games.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameSlug(pub String);

impl fmt::Display for GameSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry an installer belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub slug: GameSlug,
    pub name: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl Game {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: GameSlug(slugify(&name)),
            name,
            year: None,
            platforms: Vec::new(),
        }
    }
}

/// Execution backend an installer targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Runner {
    Linux,
    Wine,
    WineSteam,
    Steam,
    Dosbox,
    ScummVm,
    Libretro,
    Mame,
    Web,
    Browser,
    Other(String),
}

impl Runner {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linux" => Self::Linux,
            "wine" => Self::Wine,
            "winesteam" => Self::WineSteam,
            "steam" => Self::Steam,
            "dosbox" => Self::Dosbox,
            "scummvm" => Self::ScummVm,
            "libretro" => Self::Libretro,
            "mame" => Self::Mame,
            "web" => Self::Web,
            "browser" => Self::Browser,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::Wine => "wine",
            Self::WineSteam => "winesteam",
            Self::Steam => "steam",
            Self::Dosbox => "dosbox",
            Self::ScummVm => "scummvm",
            Self::Libretro => "libretro",
            Self::Mame => "mame",
            Self::Web => "web",
            Self::Browser => "browser",
            Self::Other(slug) => slug,
        }
    }

    /// Runners that are no longer accepted for new submissions.
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::WineSteam)
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Serialize for Runner {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.slug())
    }
}

impl<'de> Deserialize<'de> for Runner {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// First free variant of `base` among `taken`: `base`, then `base-2`, `base-3`...
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    let mut base = base.to_string();
    if let Some((cut, _)) = base.char_indices().nth(MAX_SLUG_LENGTH) {
        base.truncate(cut);
        while base.ends_with('-') {
            base.pop();
        }
    }

    if !taken.contains(&base) {
        return base;
    }

    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
