use super::common::*;
use crate::installers::script::{FileSource, InstallerScript, ScriptError};

#[test]
fn full_documents_are_unwrapped_to_their_script() {
    let document = r#"
game_slug: quake
version: GOG
runner: linux
script:
  game:
    exe: game/quake
"#;
    let (script, runner) = InstallerScript::parse_document(document).expect("parses");
    assert_eq!(runner.as_deref(), Some("linux"));
    assert_eq!(script.game_value("exe").as_deref(), Some("game/quake"));
    assert!(!script.contains("game_slug"));
}

#[test]
fn a_plain_script_key_is_not_mistaken_for_a_document() {
    let script = InstallerScript::parse("script:\n  game:\n    exe: a\n").expect("parses");
    assert!(script.contains("script"));
}

#[test]
fn json_scripts_are_accepted() {
    let script =
        InstallerScript::parse(r#"{"game": {"appid": 22330}, "installer": []}"#).expect("parses");
    assert_eq!(script.game_value("appid").as_deref(), Some("22330"));
    assert!(script.tasks().is_empty());
}

#[test]
fn non_mapping_roots_and_blank_text_are_rejected() {
    assert!(matches!(
        InstallerScript::parse("- game\n- files\n"),
        Err(ScriptError::NotAMapping("a list"))
    ));
    assert!(matches!(InstallerScript::parse("   \n"), Err(ScriptError::Empty)));
    assert!(matches!(InstallerScript::parse("~\n"), Err(ScriptError::Empty)));
}

#[test]
fn files_and_tasks_expose_well_formed_entries() {
    let script = InstallerScript::parse(LINUX_SCRIPT).expect("parses");
    let files = script.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, "gogsetup");
    assert_eq!(
        files[0].source,
        FileSource::Detailed {
            url: Some("N/A:Select the GOG installer".to_string()),
            filename: Some("gog_quake.sh".to_string()),
        }
    );

    let directives: Vec<_> = script
        .tasks()
        .into_iter()
        .map(|task| task.directive)
        .collect();
    assert_eq!(directives, vec!["extract".to_string(), "move".to_string()]);
}

#[test]
fn wine_details_are_read_from_sections_and_tasks() {
    let script = InstallerScript::parse(WINE_SCRIPT).expect("parses");
    assert_eq!(script.wine_version().as_deref(), Some("lutris-7.2-x86_64"));
    let tasks = script.tasks();
    assert_eq!(tasks[0].task_name().as_deref(), Some("create_prefix"));
    assert_eq!(tasks[0].arch().as_deref(), Some("win64"));
    assert_eq!(tasks[1].task_name().as_deref(), Some("wineexec"));
}

#[test]
fn serialised_yaml_parses_back_to_the_same_script() {
    let script = InstallerScript::parse(WINESTEAM_SCRIPT).expect("parses");
    let yaml = script.to_yaml().expect("serialises");
    assert_eq!(InstallerScript::parse(&yaml).expect("reparses"), script);
}
