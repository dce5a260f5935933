use std::path::{Component, Path, PathBuf};

use bevy_utils::hashbrown::HashMap;
use bimap::BiHashMap;
use educe::Educe;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};
use thiserror::Error;
use walkdir::WalkDir;

use crate::identifier::AssetGuid;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed asset sidecar {path:?}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Missing guid or type name in {0:?}")]
    IncompleteSidecar(PathBuf),
    #[error("Duplicate guid {0}")]
    DuplicateGuid(AssetGuid),
    #[error("Path {0} is already indexed under another guid")]
    DuplicatePath(SmolStr),
    #[error("Invalid asset database config")]
    Config(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDatabaseConfig {
    /// Roots scanned for sidecars, recursively.
    pub directories: Vec<PathBuf>,
    pub meta_extension: String,
    /// Build output lives here and is never indexed, at any depth under a root.
    pub excluded_dir: PathBuf,
}

impl Default for AssetDatabaseConfig {
    fn default() -> Self {
        Self {
            directories: vec![],
            meta_extension: "meta".into(),
            excluded_dir: PathBuf::from("Cache").join("Staging"),
        }
    }
}

impl AssetDatabaseConfig {
    pub fn from_json(json: &str) -> Result<Self, DatabaseError> {
        serde_json::from_str(json).map_err(DatabaseError::Config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Sidecar written next to every asset file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssetHolder {
    guid: Option<String>,
    type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub guid: AssetGuid,
    pub name: SmolStr,
    pub type_name: SmolStr,
    /// Starts with the scanned root's directory name, always with forward slashes.
    pub path: SmolStr,
}

type PathResolver = Box<dyn Fn(&str) -> String>;

/// Index of every asset GUID known to the project.
#[derive(Educe, Default)]
#[educe(Debug)]
pub struct AssetDatabase {
    config: AssetDatabaseConfig,
    assets: HashMap<AssetGuid, AssetInfo>,
    paths: BiHashMap<AssetGuid, SmolStr>,
    #[educe(Debug(ignore))]
    path_resolver: Option<PathResolver>,
}

impl AssetDatabase {
    pub fn new(config: AssetDatabaseConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AssetDatabaseConfig {
        &self.config
    }

    /// Maps stored paths before they are handed out, e.g. to make them absolute.
    pub fn set_path_resolver(&mut self, resolver: impl Fn(&str) -> String + 'static) {
        self.path_resolver = Some(Box::new(resolver));
    }

    /// Drops the index and rebuilds it from the sidecars under the configured
    /// directories. Returns the number of indexed assets.
    pub fn reload(&mut self) -> usize {
        self.assets.clear();
        self.paths.clear();

        let directories = self.config.directories.clone();
        let excluded_dir = self.config.excluded_dir.clone();
        let excluded: Vec<_> = excluded_dir.components().collect();
        for root in &directories {
            let walker = WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                    !contains_components(relative, &excluded)
                });

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!("[AssetDatabase] Skipping unreadable entry under {root:?}: {err}");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !self.is_sidecar(entry.path()) {
                    continue;
                }

                match self.index_sidecar(root, entry.path()) {
                    Ok(()) => {}
                    Err(DatabaseError::DuplicateGuid(guid)) => {
                        warn!(
                            "[AssetDatabase] Duplicate guid found for '{guid}' at {0:?}, skipping...",
                            entry.path()
                        );
                    }
                    Err(err) => {
                        warn!("[AssetDatabase] {err}. Skipping...");
                    }
                }
            }
        }

        info!(
            "[AssetDatabase] Reloaded Asset Database with {0} assets",
            self.assets.len()
        );
        self.assets.len()
    }

    fn is_sidecar(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|extension| extension == self.config.meta_extension.as_str())
    }

    fn index_sidecar(&mut self, root: &Path, sidecar: &Path) -> Result<(), DatabaseError> {
        let json = std::fs::read_to_string(sidecar).map_err(|source| DatabaseError::Io {
            path: sidecar.to_path_buf(),
            source,
        })?;
        let holder: AssetHolder =
            serde_json::from_str(&json).map_err(|source| DatabaseError::Sidecar {
                path: sidecar.to_path_buf(),
                source,
            })?;
        let (Some(guid), Some(type_name)) = (holder.guid, holder.type_name) else {
            return Err(DatabaseError::IncompleteSidecar(sidecar.to_path_buf()));
        };
        if guid.is_empty() || type_name.is_empty() {
            return Err(DatabaseError::IncompleteSidecar(sidecar.to_path_buf()));
        }

        let relative = sidecar.strip_prefix(root).unwrap_or(sidecar).with_extension("");
        let name = relative
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_smolstr())
            .unwrap_or_default();
        let asset_path = match root.file_name() {
            Some(root_name) => Path::new(root_name).join(&relative),
            None => relative,
        };
        let path = asset_path
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        self.insert(AssetInfo {
            guid: guid.into(),
            name,
            type_name: type_name.into(),
            path: path.into(),
        })
    }

    pub fn insert(&mut self, info: AssetInfo) -> Result<(), DatabaseError> {
        if self.assets.contains_key(&info.guid) {
            return Err(DatabaseError::DuplicateGuid(info.guid));
        }
        if self
            .paths
            .insert_no_overwrite(info.guid.clone(), info.path.clone())
            .is_err()
        {
            return Err(DatabaseError::DuplicatePath(info.path));
        }
        self.assets.insert(info.guid.clone(), info);
        Ok(())
    }

    pub fn remove(&mut self, guid: &AssetGuid) -> Option<AssetInfo> {
        self.paths.remove_by_left(guid);
        self.assets.remove(guid)
    }

    fn resolve(&self, path: &str) -> String {
        match &self.path_resolver {
            Some(resolver) => resolver(path),
            None => path.to_string(),
        }
    }

    pub fn asset_info(&self, guid: &AssetGuid) -> Option<&AssetInfo> {
        self.assets.get(guid)
    }

    pub fn asset_path(&self, guid: &AssetGuid) -> Option<String> {
        let path = self.paths.get_by_left(guid)?;
        Some(self.resolve(path))
    }

    /// Like [`Self::asset_path`], but only if the stored path starts with
    /// `prefix`, with or without its root directory name.
    pub fn asset_path_with_prefix(&self, guid: &AssetGuid, prefix: &str) -> Option<String> {
        let path = self.paths.get_by_left(guid)?;
        if !matches_prefix(path, prefix) {
            return None;
        }
        Some(self.resolve(path))
    }

    /// Location of the asset file on disk, searched across the configured
    /// directories in order.
    pub fn resolve_full_path(&self, guid: &AssetGuid, prefix: &str) -> Option<PathBuf> {
        let path = self.paths.get_by_left(guid)?.as_str();
        if !matches_prefix(path, prefix) {
            return None;
        }
        self.config.directories.iter().find_map(|root| {
            let relative = root
                .file_name()
                .and_then(|root_name| path.strip_prefix(root_name.to_str()?)?.strip_prefix('/'))
                .unwrap_or(path);
            let target = root.join(relative);
            target.exists().then_some(target)
        })
    }

    pub fn asset_type(&self, guid: &AssetGuid) -> Option<&str> {
        self.assets.get(guid).map(|info| info.type_name.as_str())
    }

    pub fn asset_name(&self, guid: &AssetGuid) -> Option<&str> {
        self.assets.get(guid).map(|info| info.name.as_str())
    }

    /// Reverse lookup, `path` is compared against the stored relative path.
    pub fn asset_guid(&self, path: &str) -> Option<&AssetGuid> {
        self.paths.get_by_right(path)
    }

    /// Assets of the given type, sorted by path.
    pub fn assets_of_type(&self, type_name: &str) -> Vec<&AssetInfo> {
        let mut found: Vec<_> = self
            .assets
            .values()
            .filter(|info| info.type_name.as_str() == type_name)
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn contains_components(path: &Path, sequence: &[Component]) -> bool {
    if sequence.is_empty() {
        return false;
    }
    let components: Vec<_> = path.components().collect();
    components
        .windows(sequence.len())
        .any(|window| window == sequence)
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
        || path
            .split_once('/')
            .is_some_and(|(_, rest)| rest.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_meta(root: &Path, relative: &str, json: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    fn database_for(root: &Path) -> AssetDatabase {
        AssetDatabase::new(AssetDatabaseConfig {
            directories: vec![root.to_path_buf()],
            ..Default::default()
        })
    }

    #[test]
    fn reload_indexes_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let root = &dir.path().join("Assets");
        write_meta(
            root,
            "Materials/stone.mat.meta",
            r#"{ "guid": "g-stone", "typeName": "Material" }"#,
        );
        write_meta(
            root,
            "Scripts/boss_loot.asset.meta",
            r#"{ "guid": "g-loot", "typeName": "LootTable" }"#,
        );
        fs::write(root.join("Materials/stone.mat"), "{}").unwrap();

        let mut database = database_for(root);
        assert_eq!(database.reload(), 2);

        let stone = AssetGuid::from("g-stone");
        assert_eq!(
            database.asset_path(&stone).as_deref(),
            Some("Assets/Materials/stone.mat")
        );
        assert_eq!(database.asset_name(&stone), Some("stone"));
        assert_eq!(database.asset_type(&stone), Some("Material"));
        assert_eq!(
            database.asset_path_with_prefix(&stone, "Materials/").as_deref(),
            Some("Assets/Materials/stone.mat")
        );
        assert_eq!(
            database.resolve_full_path(&stone, ""),
            Some(root.join("Materials").join("stone.mat"))
        );
        assert_eq!(database.resolve_full_path(&stone, "Scripts/"), None);

        let loot = AssetGuid::from("g-loot");
        assert_eq!(database.asset_guid("Assets/Scripts/boss_loot.asset"), Some(&loot));
        assert_eq!(database.resolve_full_path(&loot, ""), None);
        assert_eq!(
            database
                .assets_of_type("LootTable")
                .into_iter()
                .map(|info| info.name.as_str())
                .collect::<Vec<_>>(),
            vec!["boss_loot"]
        );
    }

    #[test]
    fn reload_skips_bad_sidecars_duplicates_and_staging() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_meta(root, "a.asset.meta", r#"{ "guid": "same", "typeName": "Quest" }"#);
        write_meta(root, "b.asset.meta", r#"{ "guid": "same", "typeName": "Quest" }"#);
        write_meta(root, "no_type.asset.meta", r#"{ "guid": "lonely" }"#);
        write_meta(root, "empty.asset.meta", r#"{ "guid": "", "typeName": "Quest" }"#);
        write_meta(root, "garbage.asset.meta", "not json");
        write_meta(
            root,
            "Cache/Staging/built.asset.meta",
            r#"{ "guid": "staged", "typeName": "Quest" }"#,
        );
        write_meta(root, "notes.txt", r#"{ "guid": "txt", "typeName": "Quest" }"#);

        let mut database = database_for(root);
        assert_eq!(database.reload(), 1);
        assert!(database.asset_info(&"same".into()).is_some());
        assert!(database.asset_info(&"lonely".into()).is_none());
        assert!(database.asset_info(&"staged".into()).is_none());
        assert!(database.asset_info(&"txt".into()).is_none());
    }

    #[test]
    fn reload_skips_nested_staging() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_meta(
            root,
            "Packages/Cache/Staging/built.asset.meta",
            r#"{ "guid": "staged", "typeName": "Quest" }"#,
        );
        write_meta(root, "Packages/Staging/kept.asset.meta", r#"{ "guid": "kept", "typeName": "Quest" }"#);
        write_meta(root, "Cache/cached.asset.meta", r#"{ "guid": "cached", "typeName": "Quest" }"#);

        let mut database = database_for(root);
        assert_eq!(database.reload(), 2);
        assert!(database.asset_info(&"staged".into()).is_none());
        assert!(database.asset_info(&"kept".into()).is_some());
        assert!(database.asset_info(&"cached".into()).is_some());
    }

    #[test]
    fn reload_indexes_every_directory() {
        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("Game");
        let shared = dir.path().join("Shared");
        write_meta(&game, "x.asset.meta", r#"{ "guid": "ga", "typeName": "Quest" }"#);
        write_meta(&shared, "x.asset.meta", r#"{ "guid": "gb", "typeName": "Quest" }"#);
        write_meta(&shared, "copy.asset.meta", r#"{ "guid": "ga", "typeName": "Quest" }"#);
        fs::write(shared.join("x.asset"), "{}").unwrap();

        let mut database = AssetDatabase::new(AssetDatabaseConfig {
            directories: vec![game.clone(), shared.clone()],
            ..Default::default()
        });
        assert_eq!(database.reload(), 2);

        let (ga, gb) = (AssetGuid::from("ga"), AssetGuid::from("gb"));
        assert_eq!(database.asset_path(&ga).as_deref(), Some("Game/x.asset"));
        assert_eq!(database.asset_path(&gb).as_deref(), Some("Shared/x.asset"));
        assert_eq!(database.asset_guid("Shared/x.asset"), Some(&gb));
        assert_eq!(database.asset_name(&gb), Some("x"));

        assert_eq!(database.resolve_full_path(&gb, "x."), Some(shared.join("x.asset")));
        assert_eq!(database.resolve_full_path(&ga, ""), None);
    }

    #[test]
    fn reload_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_meta(root, "a.asset.meta", r#"{ "guid": "first", "typeName": "Quest" }"#);

        let mut database = database_for(root);
        database.reload();
        fs::remove_file(root.join("a.asset.meta")).unwrap();
        write_meta(root, "b.asset.meta", r#"{ "guid": "second", "typeName": "Quest" }"#);

        assert_eq!(database.reload(), 1);
        assert!(database.asset_info(&"first".into()).is_none());
        assert_eq!(database.asset_name(&"second".into()), Some("b"));
    }

    #[test]
    fn missing_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut database = database_for(&dir.path().join("does-not-exist"));
        assert_eq!(database.reload(), 0);
        assert!(database.is_empty());
    }

    #[test]
    fn insert_and_lookups() {
        let mut database = AssetDatabase::default();
        let info = AssetInfo {
            guid: "shader-guid".into(),
            name: "lit".into(),
            type_name: "Shader".into(),
            path: "Shaders/lit.stsh".into(),
        };
        database.insert(info.clone()).unwrap();
        assert_eq!(database.asset_type(&info.guid), Some("Shader"));

        assert!(matches!(
            database.insert(info.clone()),
            Err(DatabaseError::DuplicateGuid(_))
        ));
        assert!(matches!(
            database.insert(AssetInfo {
                guid: "other".into(),
                ..info.clone()
            }),
            Err(DatabaseError::DuplicatePath(_))
        ));

        let guid = info.guid.clone();
        assert_eq!(
            database.asset_path_with_prefix(&guid, "Shaders/").as_deref(),
            Some("Shaders/lit.stsh")
        );
        assert_eq!(database.asset_path_with_prefix(&guid, "Textures/"), None);

        database.set_path_resolver(|path| format!("/project/Assets/{path}"));
        assert_eq!(
            database.asset_path(&guid).as_deref(),
            Some("/project/Assets/Shaders/lit.stsh")
        );

        assert_eq!(database.remove(&guid), Some(info));
        assert_eq!(database.asset_guid("Shaders/lit.stsh"), None);
        assert_eq!(database.len(), 0);
    }

    #[test]
    fn config_defaults_and_overrides() {
        let config = AssetDatabaseConfig::from_json(r#"{ "directories": ["Assets"] }"#).unwrap();
        assert_eq!(config.directories, vec![PathBuf::from("Assets")]);
        assert_eq!(config.meta_extension, "meta");
        assert_eq!(config.excluded_dir, Path::new("Cache").join("Staging"));

        let config =
            AssetDatabaseConfig::from_json(r#"{ "meta_extension": "sidecar", "excluded_dir": "Build" }"#)
                .unwrap();
        assert!(config.directories.is_empty());
        assert_eq!(config.excluded_dir, PathBuf::from("Build"));

        assert!(matches!(
            AssetDatabaseConfig::from_json("42"),
            Err(DatabaseError::Config(_))
        ));
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.json");
        fs::write(&path, r#"{ "directories": ["A", "B"] }"#).unwrap();

        let config = AssetDatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config.directories.len(), 2);
        assert!(matches!(
            AssetDatabaseConfig::from_file(dir.path().join("missing.json")),
            Err(DatabaseError::Io { .. })
        ));
    }
}
