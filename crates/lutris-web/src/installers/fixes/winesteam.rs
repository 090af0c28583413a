use serde_yaml::{Mapping, Value};

use super::{FixError, FixOutcome, InstallerFix};
use crate::catalog::Runner;
use crate::installers::domain::Installer;
use crate::installers::script::Task;

const WINE_TASKS: [&str; 10] = [
    "create_prefix",
    "winetricks",
    "winekill",
    "wineexec",
    "winecfg",
    "set_regedit",
    "set_regedit_file",
    "delete_registry_key",
    "install_cab_component",
    "winesteam_install",
];

const KEPT_GAME_KEYS: [&str; 2] = ["appid", "args"];

/// Moves Windows Steam installers off the WineSteam runner onto Steam with Proton.
pub struct WinesteamToProton;

impl InstallerFix for WinesteamToProton {
    fn name(&self) -> &'static str {
        "winesteam-to-proton"
    }

    fn apply(&self, installer: &mut Installer) -> Result<FixOutcome, FixError> {
        if installer.runner != Runner::WineSteam {
            return Ok(FixOutcome::Unchanged);
        }

        let mut script = installer.script()?;
        if script.game_value("appid").is_none() {
            return Ok(FixOutcome::Skipped("no steam appid".to_string()));
        }
        let downloads_files = script
            .get("files")
            .and_then(Value::as_sequence)
            .is_some_and(|files| !files.is_empty());
        if downloads_files {
            return Ok(FixOutcome::Skipped(
                "installer downloads files, needs manual review".to_string(),
            ));
        }

        let mut changes = vec!["runner winesteam -> steam".to_string()];

        for section in ["winesteam", "wine"] {
            if script.remove(section).is_some() {
                changes.push(format!("removed {section} section"));
            }
        }

        let mut emptied = false;
        if let Some(steps) = script.tasks_mut() {
            let before = steps.len();
            steps.retain(|step| !is_wine_task(step));
            let removed = before - steps.len();
            if removed > 0 {
                changes.push(format!("removed {removed} wine task(s)"));
            }
            emptied = steps.is_empty();
        }
        if emptied {
            script.remove("installer");
        }

        if let Some(game) = script.section_mut("game") {
            let trimmed: Mapping = game
                .iter()
                .filter(|(key, _)| {
                    key.as_str()
                        .is_some_and(|key| KEPT_GAME_KEYS.contains(&key))
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if trimmed.len() != game.len() {
                changes.push("kept only appid and args in game section".to_string());
                *game = trimmed;
            }
        }

        if installer.version.to_ascii_lowercase().contains("winesteam") {
            changes.push(format!("version {} -> Steam", installer.version));
            installer.version = "Steam".to_string();
        }

        installer.runner = Runner::Steam;
        installer.set_script(&script)?;
        Ok(FixOutcome::Changed(changes))
    }
}

fn is_wine_task(step: &Value) -> bool {
    Task::from_value(step)
        .ok()
        .and_then(|task| task.task_name())
        .is_some_and(|name| WINE_TASKS.contains(&name.as_str()))
}
