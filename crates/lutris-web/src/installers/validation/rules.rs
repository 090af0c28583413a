use std::collections::HashSet;

use super::super::script::{kind_of, scalar_string, FileEntry, FileSource, InstallerScript, Task};
use super::config::ValidationConfig;
use crate::catalog::Runner;

pub(crate) const ALLOWED_KEYS: [&str; 11] = [
    "game",
    "files",
    "installer",
    "system",
    "wine",
    "variables",
    "require-binaries",
    "requires",
    "extends",
    "custom-name",
    "install_complete_text",
];

pub(crate) const KNOWN_DIRECTIVES: [&str; 14] = [
    "chmodx",
    "copy",
    "execute",
    "extract",
    "input_menu",
    "insert-disc",
    "merge",
    "mkdir",
    "move",
    "rename",
    "task",
    "write_config",
    "write_file",
    "write_json",
];

const WINE_ARCHES: [&str; 2] = ["win32", "win64"];

pub(crate) struct RuleContext<'a> {
    pub script: &'a InstallerScript,
    pub runner: Option<&'a Runner>,
    pub config: &'a ValidationConfig,
}

pub(crate) type Rule = fn(&RuleContext<'_>) -> Vec<String>;

pub(crate) const RULES: [(&str, Rule); 8] = [
    ("keys", validate_keys),
    ("non_empty", validate_not_empty),
    ("files", validate_files),
    ("tasks", validate_tasks),
    ("runner_requirements", validate_runner_requirements),
    ("deprecated_runner", validate_runner_not_deprecated),
    ("deprecated_wine", validate_wine_version),
    ("wine_arch", validate_wine_arch),
];

fn validate_keys(ctx: &RuleContext<'_>) -> Vec<String> {
    let runner_key = ctx.runner.map(Runner::slug);
    ctx.script
        .top_level_keys()
        .into_iter()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()) && Some(key.as_str()) != runner_key)
        .map(|key| format!("unknown top-level key: {key}"))
        .collect()
}

fn validate_not_empty(ctx: &RuleContext<'_>) -> Vec<String> {
    let has_content = ["game", "files", "installer", "extends"]
        .iter()
        .any(|key| ctx.script.contains(key));
    if has_content {
        Vec::new()
    } else {
        vec!["script needs at least one of game, files, installer or extends".to_string()]
    }
}

fn validate_files(ctx: &RuleContext<'_>) -> Vec<String> {
    let Some(files) = ctx.script.get("files") else {
        return Vec::new();
    };
    let Some(entries) = files.as_sequence() else {
        return vec![format!("files must be a list, found {}", kind_of(files))];
    };

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (index, raw) in entries.iter().enumerate() {
        let entry = match FileEntry::from_value(raw) {
            Ok(entry) => entry,
            Err(reason) => {
                errors.push(format!("files[{index}]: {reason}"));
                continue;
            }
        };

        if !seen.insert(entry.id.clone()) {
            errors.push(format!("duplicate file id: {}", entry.id));
        }
        if entry.id.contains('-') {
            errors.push(format!("dashes are not allowed in file ids: {}", entry.id));
        }

        match &entry.source {
            FileSource::Url(url) if url.trim().is_empty() => {
                errors.push(format!("file {} has no source", entry.id));
            }
            FileSource::Url(_) => {}
            FileSource::Detailed { url, filename } => {
                if url.as_deref().map_or(true, |url| url.trim().is_empty()) {
                    errors.push(format!("file {} is missing a url", entry.id));
                }
                if filename
                    .as_deref()
                    .map_or(true, |name| name.trim().is_empty())
                {
                    errors.push(format!("file {} is missing a filename", entry.id));
                }
            }
        }
    }
    errors
}

fn validate_tasks(ctx: &RuleContext<'_>) -> Vec<String> {
    let Some(installer) = ctx.script.get("installer") else {
        return Vec::new();
    };
    let Some(steps) = installer.as_sequence() else {
        return vec![format!(
            "installer must be a list, found {}",
            kind_of(installer)
        )];
    };

    let mut errors = Vec::new();
    for (index, raw) in steps.iter().enumerate() {
        let task = match Task::from_value(raw) {
            Ok(task) => task,
            Err(reason) => {
                errors.push(format!("installer[{index}]: {reason}"));
                continue;
            }
        };

        if !KNOWN_DIRECTIVES.contains(&task.directive.as_str()) {
            errors.push(format!(
                "installer[{index}]: unknown directive {}",
                task.directive
            ));
        } else if task.directive == "task" && task.task_name().is_none() {
            errors.push(format!("installer[{index}]: task is missing a name"));
        }
    }
    errors
}

fn validate_runner_requirements(ctx: &RuleContext<'_>) -> Vec<String> {
    let Some(runner) = ctx.runner else {
        return Vec::new();
    };

    let required: &[&str] = match runner {
        Runner::Linux | Runner::Wine if ctx.script.game().is_some() => &["exe"],
        Runner::Steam => &["appid"],
        Runner::ScummVm => &["game_id"],
        Runner::Libretro => &["core", "main_file"],
        Runner::Dosbox | Runner::Mame => &["main_file"],
        _ => &[],
    };

    required
        .iter()
        .filter(|key| {
            ctx.script
                .game_value(key)
                .map_or(true, |value| value.trim().is_empty())
        })
        .map(|key| format!("{runner} installers need game.{key}"))
        .collect()
}

fn validate_runner_not_deprecated(ctx: &RuleContext<'_>) -> Vec<String> {
    match ctx.runner {
        Some(runner) if runner.is_deprecated() => vec![format!(
            "the {runner} runner is deprecated, migrate the installer to Steam (Proton)"
        )],
        _ => Vec::new(),
    }
}

fn validate_wine_version(ctx: &RuleContext<'_>) -> Vec<String> {
    match ctx.script.wine_version() {
        Some(version) if ctx.config.is_deprecated_wine(&version) => {
            vec![format!("wine version {version} is deprecated")]
        }
        _ => Vec::new(),
    }
}

fn validate_wine_arch(ctx: &RuleContext<'_>) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(arch) = ctx.script.game().and_then(|game| game.get("arch")) {
        match scalar_string(arch) {
            Some(arch) if WINE_ARCHES.contains(&arch.as_str()) => {}
            Some(arch) => errors.push(format!("unsupported game.arch: {arch}")),
            None => errors.push(format!("game.arch must be text, found {}", kind_of(arch))),
        }
    }

    for task in ctx.script.tasks() {
        if task.task_name().as_deref() != Some("create_prefix") {
            continue;
        }
        if let Some(arch) = task.arch() {
            if !WINE_ARCHES.contains(&arch.as_str()) {
                errors.push(format!("unsupported create_prefix arch: {arch}"));
            }
        }
    }

    errors
}
