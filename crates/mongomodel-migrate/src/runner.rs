//! Creates one collection per schema file

use crate::schema::{collection_name, SchemaName};
use mongomodel::{CollectionOptions, Model};
use mongomodel_common::{ModelError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const SCHEMAS_DIR: &str = "app/schemas";
pub const MIGRATIONS_DIR: &str = "database/migrations";

// ============================================================================
// Configuration
// ============================================================================

/// Where schema and migration files live
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Project root the directories are relative to
    pub root: PathBuf,
    pub schemas_dir: PathBuf,
    pub migrations_dir: PathBuf,
}

impl MigratorConfig {
    /// Reads MIGRATIONS_ROOT, defaulting to the current directory
    pub fn from_env() -> Self {
        let root = std::env::var("MIGRATIONS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::new(root)
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schemas_dir: PathBuf::from(SCHEMAS_DIR),
            migrations_dir: PathBuf::from(MIGRATIONS_DIR),
        }
    }

    pub fn schemas_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schemas_dir = dir.into();
        self
    }

    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    pub fn schemas_path(&self) -> PathBuf {
        self.root.join(&self.schemas_dir)
    }

    pub fn migrations_path(&self) -> PathBuf {
        self.root.join(&self.migrations_dir)
    }
}

// ============================================================================
// Report
// ============================================================================

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Output messages
    pub messages: Vec<String>,
    /// Collections created by this run
    pub migrated: Vec<String>,
    /// Collections that already existed
    pub skipped: Vec<String>,
}

impl MigrationReport {
    fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn merge(&mut self, other: MigrationReport) {
        self.messages.extend(other.messages);
        self.migrated.extend(other.migrated);
        self.skipped.extend(other.skipped);
    }

    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty() && self.skipped.is_empty()
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct Migrator {
    model: Model,
    config: MigratorConfig,
}

impl Migrator {
    pub fn new(model: Model, config: MigratorConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Migrate `app/schemas/<name>.json`
    pub async fn migrate_schema(&self, name: &str) -> Result<MigrationReport> {
        let path = named_file(&self.config.schemas_path(), name)?;
        self.migrate_file(&path).await
    }

    /// Migrate `database/migrations/<name>.json`
    pub async fn migrate_migration(&self, name: &str) -> Result<MigrationReport> {
        let path = named_file(&self.config.migrations_path(), name)?;
        self.migrate_file(&path).await
    }

    pub async fn migrate_all_schemas(&self) -> Result<MigrationReport> {
        self.migrate_dir(&self.config.schemas_path()).await
    }

    pub async fn migrate_all_migrations(&self) -> Result<MigrationReport> {
        self.migrate_dir(&self.config.migrations_path()).await
    }

    async fn migrate_dir(&self, dir: &Path) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            report.note(format!("Nothing to migrate: {} is empty", dir.display()));
            return Ok(report);
        }

        let files = json_files(dir)?;
        if files.is_empty() {
            report.note(format!("Nothing to migrate: {} is empty", dir.display()));
            return Ok(report);
        }

        for file in files {
            report.merge(self.migrate_file(&file).await?);
        }
        Ok(report)
    }

    async fn migrate_file(&self, path: &Path) -> Result<MigrationReport> {
        let collection = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(collection_name)
            .ok_or_else(|| {
                ModelError::validation(format!("not a schema file: {}", path.display()))
            })?;
        let options = load_options(path)?;

        let mut report = MigrationReport::default();
        match self.model.create_collection_with(&collection, options).await {
            Ok(ns) => {
                info!(namespace = %ns, file = %path.display(), "collection migrated");
                report.note(format!("{} successfully migrated!", collection));
                report.migrated.push(collection);
            }
            Err(err) if err.is_namespace_exists() => {
                warn!(collection = %collection, "collection already exists");
                report.note(format!("{} already migrated!", collection));
                report.skipped.push(collection);
            }
            Err(err) => return Err(err),
        }
        Ok(report)
    }
}

/// Resolves a schema name inside `dir`; relative segments are rejected
fn named_file(dir: &Path, name: &str) -> Result<PathBuf> {
    Ok(dir.join(SchemaName::parse(name)?.relative_path()))
}

/// Every `.json` file below `dir`, in path order
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| ModelError::Io(format!("Walk error: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Read a schema file into collection options
pub fn load_options(path: &Path) -> Result<CollectionOptions> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let schema = bson::to_document(&value)
        .map_err(|e| ModelError::Serialization(format!("{}: {}", path.display(), e)))?;
    Ok(CollectionOptions::from_schema(&schema))
}
