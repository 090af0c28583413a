use std::collections::HashSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::catalog::{Game, GameSlug, Runner};
use crate::installers::domain::{installer_slug, Installer, InstallerId};
use crate::installers::memory::{
    InMemoryHistoryRepository, InMemoryInstallerRepository, InMemoryNotifier,
    InMemoryRevisionRepository,
};
use crate::installers::moderation::{DraftRequest, HistoryEntry, ModerationService};
use crate::installers::repository::{
    HistoryRepository, InstallerRepository, RepositoryError,
};
use crate::installers::validation::ValidationConfig;

pub(super) const WINE_SCRIPT: &str = r#"
files:
- setup: https://example.com/downloads/setup.exe
game:
  exe: drive_c/Game/game.exe
  prefix: $GAMEDIR
  arch: win64
installer:
- task:
    name: create_prefix
    prefix: $GAMEDIR
    arch: win64
- task:
    name: wineexec
    executable: setup
    prefix: $GAMEDIR
wine:
  version: lutris-7.2-x86_64
"#;

pub(super) const LINUX_SCRIPT: &str = r#"
files:
- gogsetup:
    url: N/A:Select the GOG installer
    filename: gog_quake.sh
game:
  exe: game/quake
installer:
- extract:
    file: gogsetup
    dst: $CACHE
- move:
    src: $CACHE/data/noarch
    dst: $GAMEDIR
"#;

pub(super) const WINESTEAM_SCRIPT: &str = r#"
game:
  appid: 22330
  args: -nosplash
  prefix: $GAMEDIR
  arch: win32
installer:
- task:
    name: create_prefix
    arch: win32
- task:
    name: winetricks
    app: vcrun2008
- write_config:
    file: $GAMEDIR/config.ini
    section: Display
    key: Width
    value: 1920
winesteam:
  steamless_binary: true
wine:
  version: staging-2.21-x86_64
"#;

pub(super) const LEGACY_WINE_SCRIPT: &str = r#"
game:
  exe: drive_c/Legacy/legacy.exe
  prefix: $GAMEDIR
installer:
- task:
    name: create_prefix
    prefix: $GAMEDIR
- task:
    name: winetricks
    app: d3dx9
    prefix: $GAMEDIR
wine:
  version: lutris-4.21-x86_64
"#;

pub(super) fn validation_config() -> ValidationConfig {
    ValidationConfig::default()
}

pub(super) fn installer(id: u64, runner: Runner, version: &str, content: &str) -> Installer {
    let now = Utc::now();
    Installer {
        id: InstallerId(id),
        game_slug: GameSlug("the-elder-scrolls-iv".to_string()),
        game_name: "The Elder Scrolls IV".to_string(),
        slug: format!("{}-{id}", installer_slug("The Elder Scrolls IV", version)),
        version: version.to_string(),
        runner,
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

pub(super) fn game() -> Game {
    Game::new("Quake")
}

pub(super) fn draft_request(content: &str) -> DraftRequest {
    DraftRequest {
        installer_id: None,
        game: game(),
        version: "GOG".to_string(),
        runner: Runner::Linux,
        description: "GOG release".to_string(),
        notes: String::new(),
        credits: String::new(),
        content: content.to_string(),
    }
}

pub(super) type MemoryService = ModerationService<
    InMemoryInstallerRepository,
    InMemoryRevisionRepository,
    InMemoryHistoryRepository,
    InMemoryNotifier,
>;

pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) installers: Arc<InMemoryInstallerRepository>,
    pub(super) history: Arc<InMemoryHistoryRepository>,
    pub(super) notifier: Arc<InMemoryNotifier>,
}

pub(super) fn harness() -> Harness {
    let installers = Arc::new(InMemoryInstallerRepository::default());
    let revisions = Arc::new(InMemoryRevisionRepository::default());
    let history = Arc::new(InMemoryHistoryRepository::default());
    let notifier = Arc::new(InMemoryNotifier::default());
    let service = Arc::new(ModerationService::new(
        installers.clone(),
        revisions,
        history.clone(),
        notifier.clone(),
        validation_config(),
    ));

    Harness {
        service,
        installers,
        history,
        notifier,
    }
}

pub(super) fn seeded_installers(installers: &[Installer]) -> Arc<InMemoryInstallerRepository> {
    let repository = Arc::new(InMemoryInstallerRepository::default());
    for installer in installers {
        repository
            .insert(installer.clone())
            .expect("seed installer");
    }
    repository
}

/// History store that refuses every write.
pub(super) struct UnavailableHistory;

impl HistoryRepository for UnavailableHistory {
    fn record(&self, _entry: HistoryEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("history offline".to_string()))
    }

    fn for_installer(&self, _id: InstallerId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("history offline".to_string()))
    }
}

/// Installer store that serves reads but refuses every update.
pub(super) struct ReadOnlyInstallers(pub(super) Arc<InMemoryInstallerRepository>);

impl InstallerRepository for ReadOnlyInstallers {
    fn next_id(&self) -> Result<InstallerId, RepositoryError> {
        self.0.next_id()
    }

    fn insert(&self, installer: Installer) -> Result<Installer, RepositoryError> {
        self.0.insert(installer)
    }

    fn update(&self, _installer: Installer) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("installers are read-only".to_string()))
    }

    fn fetch(&self, id: InstallerId) -> Result<Option<Installer>, RepositoryError> {
        self.0.fetch(id)
    }

    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Installer>, RepositoryError> {
        self.0.fetch_by_slug(slug)
    }

    fn list(&self) -> Result<Vec<Installer>, RepositoryError> {
        self.0.list()
    }

    fn for_game(&self, game: &GameSlug) -> Result<Vec<Installer>, RepositoryError> {
        self.0.for_game(game)
    }

    fn slugs(&self) -> Result<HashSet<String>, RepositoryError> {
        self.0.slugs()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
