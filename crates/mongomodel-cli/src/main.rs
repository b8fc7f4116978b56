//! mongomodel CLI
//!
//! Usage:
//!   mm make:schema User                 Create app/schemas/User.json
//!   mm make:schema admin/User --type array
//!   mm make:migration User              Create database/migrations/User.json
//!   mm migrate                          Migrate every file in database/migrations
//!   mm migrate --schema User            Migrate app/schemas/User.json
//!   mm migrate --migration User         Migrate database/migrations/User.json
//!   mm migrate --all-schemas            Migrate every file in app/schemas
//!
//! Connection settings come from DATABASE_URL and DATABASE_NAME (a `.env`
//! file is loaded first) unless --url / --db are given.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use mongomodel::{Model, ModelOptions};
use mongomodel_migrate::{Generator, MigrationReport, Migrator, MigratorConfig, SchemaType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mm")]
#[command(about = "mongomodel schemas and migrations", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (defaults to MIGRATIONS_ROOT or the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a schema file under app/schemas
    #[command(name = "make:schema")]
    MakeSchema {
        /// Schema name, optionally prefixed by directories (admin/User)
        name: String,

        /// bsonType of the generated schema
        #[arg(long = "type", default_value = "object")]
        bson_type: String,
    },
    /// Create a migration file under database/migrations
    #[command(name = "make:migration")]
    MakeMigration {
        name: String,

        #[arg(long = "type", default_value = "object")]
        bson_type: String,
    },
    /// Create collections from schema or migration files
    #[command(group(
        ArgGroup::new("target")
            .args(["schema", "migration", "all_schemas", "all_migrations"])
            .multiple(false)
    ))]
    Migrate {
        #[arg(long)]
        schema: Option<String>,

        #[arg(long)]
        migration: Option<String>,

        #[arg(long)]
        all_schemas: bool,

        /// Default when no target is given
        #[arg(long)]
        all_migrations: bool,

        /// Server URL, overrides DATABASE_URL
        #[arg(long)]
        url: Option<String>,

        /// Database name, overrides DATABASE_NAME
        #[arg(long)]
        db: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = match cli.root {
        Some(root) => MigratorConfig::new(root),
        None => MigratorConfig::from_env(),
    };
    tracing::debug!(root = %config.root.display(), "migrator configured");

    match cli.command {
        Commands::MakeSchema { name, bson_type } => {
            let path = Generator::new(config)
                .make_schema(&name, SchemaType::from_arg(&bson_type))
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{} schema successfully created!", path.display());
        }
        Commands::MakeMigration { name, bson_type } => {
            let path = Generator::new(config)
                .make_migration(&name, SchemaType::from_arg(&bson_type))
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{} migration successfully created!", path.display());
        }
        Commands::Migrate {
            schema,
            migration,
            all_schemas,
            all_migrations: _,
            url,
            db,
        } => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            let report = rt.block_on(run_migrate(config, schema, migration, all_schemas, url, db))?;
            for msg in &report.messages {
                println!("{}", msg);
            }
        }
    }

    Ok(())
}

async fn run_migrate(
    config: MigratorConfig,
    schema: Option<String>,
    migration: Option<String>,
    all_schemas: bool,
    url: Option<String>,
    db: Option<String>,
) -> Result<MigrationReport> {
    let mut options = ModelOptions::new();
    if let Some(url) = url {
        options = options.url(url);
    }
    if let Some(db) = db {
        options = options.db(db);
    }
    let model = Model::connect(options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect: {}", e))?;
    let migrator = Migrator::new(model, config);

    let report = if let Some(name) = schema {
        migrator.migrate_schema(&name).await
    } else if let Some(name) = migration {
        migrator.migrate_migration(&name).await
    } else if all_schemas {
        migrator.migrate_all_schemas().await
    } else {
        migrator.migrate_all_migrations().await
    };

    report.map_err(|e| anyhow::anyhow!("Migration failed: {}", e))
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_make_schema() {
        let args = ["mm", "make:schema", "admin/User", "--type", "array"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::MakeSchema { name, bson_type } => {
                assert_eq!(name, "admin/User");
                assert_eq!(SchemaType::from_arg(&bson_type), SchemaType::Array);
            }
            _ => panic!("expected make:schema"),
        }
    }

    #[test]
    fn test_migrate_targets_are_exclusive() {
        let both = ["mm", "migrate", "--schema", "User", "--all-schemas"];
        assert!(Cli::try_parse_from(both).is_err());
        assert!(Cli::try_parse_from(["mm", "migrate"]).is_ok());
    }
}
