use serde::{Deserialize, Serialize};

/// Wine builds that are no longer shipped to clients.
pub const DEFAULT_DEPRECATED_WINE_VERSIONS: [&str; 6] = [
    "staging-2.21-x86_64",
    "tkg-osu-4.6-x86_64",
    "esync-staging-3.7-x86_64",
    "lutris-3.16-4-x86_64",
    "lutris-4.21-x86_64",
    "lutris-mono-x86_64",
];

/// Tunables shared by the validation rules and the corpus fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub deprecated_wine_versions: Vec<String>,
    pub default_wine_arch: String,
}

impl ValidationConfig {
    pub fn is_deprecated_wine(&self, version: &str) -> bool {
        self.deprecated_wine_versions
            .iter()
            .any(|deprecated| deprecated == version.trim())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            deprecated_wine_versions: DEFAULT_DEPRECATED_WINE_VERSIONS
                .iter()
                .map(|version| version.to_string())
                .collect(),
            default_wine_arch: "win64".to_string(),
        }
    }
}
