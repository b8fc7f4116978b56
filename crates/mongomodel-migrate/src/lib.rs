//! Schema files and collection migrations for mongomodel
//!
//! Schema-validation documents live as JSON under `app/schemas/` and
//! `database/migrations/`. The [`Generator`] writes new ones from a template,
//! the [`Migrator`] creates a collection for each file with its validator.

pub mod generator;
pub mod runner;
pub mod schema;
pub mod template;

pub use generator::Generator;
pub use runner::{MigrationReport, Migrator, MigratorConfig};
pub use schema::{collection_name, SchemaName, SchemaType};
