use super::{FixError, FixOutcome, InstallerFix};
use crate::installers::domain::Installer;
use crate::installers::script::scalar_string;
use crate::installers::validation::ValidationConfig;

/// Drops pinned wine builds that are no longer distributed so clients fall back to the default.
pub struct RemoveDeprecatedWine {
    config: ValidationConfig,
}

impl RemoveDeprecatedWine {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl InstallerFix for RemoveDeprecatedWine {
    fn name(&self) -> &'static str {
        "remove-deprecated-wine"
    }

    fn apply(&self, installer: &mut Installer) -> Result<FixOutcome, FixError> {
        let mut script = installer.script()?;
        let Some(wine) = script.section_mut("wine") else {
            return Ok(FixOutcome::Unchanged);
        };

        let version = match wine.get("version").and_then(scalar_string) {
            Some(version) if self.config.is_deprecated_wine(&version) => version,
            _ => return Ok(FixOutcome::Unchanged),
        };

        wine.remove("version");
        let mut changes = vec![format!("removed deprecated wine version {version}")];
        if wine.is_empty() {
            script.remove("wine");
            changes.push("removed empty wine section".to_string());
        }

        installer.set_script(&script)?;
        Ok(FixOutcome::Changed(changes))
    }
}
