//! Writes new schema and migration files

use crate::runner::MigratorConfig;
use crate::schema::{SchemaName, SchemaType};
use crate::template;
use mongomodel_common::{ModelError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct Generator {
    config: MigratorConfig,
}

impl Generator {
    pub fn new(config: MigratorConfig) -> Self {
        Self { config }
    }

    /// Write `app/schemas/<dir>/<Name>.json`
    pub fn make_schema(&self, name: &str, bson_type: SchemaType) -> Result<PathBuf> {
        self.make(&self.config.schemas_path(), name, bson_type)
    }

    /// Write `database/migrations/<dir>/<Name>.json`
    pub fn make_migration(&self, name: &str, bson_type: SchemaType) -> Result<PathBuf> {
        self.make(&self.config.migrations_path(), name, bson_type)
    }

    fn make(&self, root: &Path, name: &str, bson_type: SchemaType) -> Result<PathBuf> {
        let name = SchemaName::parse(name)?;
        let path = root.join(name.relative_path());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = template::render_pretty(&name.collection(), bson_type)?;
        // create_new fails instead of truncating an existing schema
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ModelError::FileExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(contents.as_bytes())?;

        info!(path = %path.display(), bson_type = %bson_type, "schema created");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generator() -> (TempDir, Generator) {
        let dir = TempDir::new().unwrap();
        let generator = Generator::new(MigratorConfig::new(dir.path()));
        (dir, generator)
    }

    #[test]
    fn test_make_schema_writes_template() {
        let (dir, generator) = generator();
        let path = generator.make_schema("User", SchemaType::Object).unwrap();
        assert_eq!(path, dir.path().join("app/schemas/User.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value["validator"]["$jsonSchema"]["title"],
            "Users Object Validation"
        );
    }

    #[test]
    fn test_make_migration_creates_nested_dirs() {
        let (dir, generator) = generator();
        let path = generator
            .make_migration("--schema=blog/post", SchemaType::from_arg("--type=array"))
            .unwrap();
        assert_eq!(path, dir.path().join("database/migrations/blog/Post.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"bsonType\": \"array\""));
        assert!(text.contains("Posts Object Validation"));
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let (_dir, generator) = generator();
        let path = generator.make_schema("User", SchemaType::Object).unwrap();
        std::fs::write(&path, "{}").unwrap();

        let err = generator.make_schema("User", SchemaType::Array).unwrap_err();
        assert!(matches!(err, ModelError::FileExists(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_empty_name_rejected() {
        let (_dir, generator) = generator();
        assert!(generator.make_schema("", SchemaType::Object).unwrap_err().is_validation());
    }
}
