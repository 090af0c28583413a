use serde_yaml::Value;

use super::{FixError, FixOutcome, InstallerFix};
use crate::catalog::Runner;
use crate::installers::domain::Installer;
use crate::installers::validation::ValidationConfig;

/// Fills in the wine prefix architecture where older scripts left it implicit.
pub struct FixWineArch {
    default_arch: String,
}

impl FixWineArch {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            default_arch: config.default_wine_arch.clone(),
        }
    }
}

impl InstallerFix for FixWineArch {
    fn name(&self) -> &'static str {
        "wine-arch"
    }

    fn apply(&self, installer: &mut Installer) -> Result<FixOutcome, FixError> {
        if installer.runner != Runner::Wine {
            return Ok(FixOutcome::Unchanged);
        }

        let mut script = installer.script()?;
        if script.game().is_none() {
            return Ok(FixOutcome::Unchanged);
        }

        let prefix_arch = script
            .tasks()
            .into_iter()
            .filter(|task| task.task_name().as_deref() == Some("create_prefix"))
            .find_map(|task| task.arch());

        let mut changes = Vec::new();
        let game_arch = match script.game_value("arch") {
            Some(arch) => arch,
            None => {
                let arch = prefix_arch.unwrap_or_else(|| self.default_arch.clone());
                if let Some(game) = script.section_mut("game") {
                    game.insert(Value::from("arch"), Value::from(arch.as_str()));
                }
                changes.push(format!("set game.arch to {arch}"));
                arch
            }
        };

        let mut patched = 0;
        if let Some(steps) = script.tasks_mut() {
            for step in steps.iter_mut() {
                let Some(body) = step
                    .as_mapping_mut()
                    .and_then(|step| step.get_mut("task"))
                    .and_then(Value::as_mapping_mut)
                else {
                    continue;
                };
                let is_prefix = body.get("name").and_then(Value::as_str) == Some("create_prefix");
                if is_prefix && !body.contains_key("arch") {
                    body.insert(Value::from("arch"), Value::from(game_arch.as_str()));
                    patched += 1;
                }
            }
        }
        if patched > 0 {
            changes.push(format!("set arch on {patched} create_prefix task(s)"));
        }

        if changes.is_empty() {
            return Ok(FixOutcome::Unchanged);
        }

        installer.set_script(&script)?;
        Ok(FixOutcome::Changed(changes))
    }
}
