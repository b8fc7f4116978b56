//! MongoDB connection management with pool configuration and health checking

use crate::driver::{CollectionOptions, Driver, Namespace, UpdateModifications};
use crate::operation::{DeleteSummary, InsertManyAck, InsertOneAck, UpdateSummary};
use crate::query::QueryBuilder;
use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use futures::TryStreamExt;
use mongodb::{
    options::{
        ClientOptions, CreateCollectionOptions, FindOptions, ServerApi, ServerApiVersion,
        ValidationAction, ValidationLevel,
    },
    Client, Collection,
};
use mongomodel_common::{ModelError, Result};
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed
    pub max_idle_time: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: Some(0),
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("mongomodel".to_string()),
        }
    }
}

/// Pooled MongoDB client. Each driver call checks a connection out of the
/// pool and returns it when the call finishes, on success and on error.
#[derive(Clone)]
pub struct Connection {
    client: Client,
}

impl Connection {
    /// Create a new MongoDB connection with default pool settings
    pub async fn new(connection_string: &str) -> Result<Self> {
        Self::with_config(connection_string, PoolConfig::default()).await
    }

    /// Create a new MongoDB connection with custom pool configuration
    #[instrument(skip(connection_string, config))]
    pub async fn with_config(connection_string: &str, config: PoolConfig) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string)
            .await
            .map_err(|e| ModelError::Connection(e.to_string()))?;

        if let Some(min) = config.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = config.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = config.max_idle_time {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = config.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = config.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = config.app_name {
            client_options.app_name = Some(app);
        }

        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;
        debug!("MongoDB client created");

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, ns: &Namespace) -> Collection<BsonDocument> {
        self.client.database(&ns.db).collection(&ns.coll)
    }

    /// Check if the server is reachable
    pub async fn ping(&self) -> Result<bool> {
        match self
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => Err(ModelError::Connection(format!("Ping failed: {}", e))),
        }
    }

    /// Close every pooled connection. Outstanding clones of this
    /// connection become unusable.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        debug!("MongoDB client shut down");
    }
}

fn validation_level(level: &str) -> Result<ValidationLevel> {
    match level {
        "off" => Ok(ValidationLevel::Off),
        "strict" => Ok(ValidationLevel::Strict),
        "moderate" => Ok(ValidationLevel::Moderate),
        other => Err(ModelError::validation(format!(
            "unknown validationLevel '{}'",
            other
        ))),
    }
}

fn validation_action(action: &str) -> Result<ValidationAction> {
    match action {
        "error" => Ok(ValidationAction::Error),
        "warn" => Ok(ValidationAction::Warn),
        other => Err(ModelError::validation(format!(
            "unknown validationAction '{}'",
            other
        ))),
    }
}

#[async_trait]
impl Driver for Connection {
    async fn find_one(&self, ns: &Namespace, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        debug!(namespace = %ns, "findOne");
        Ok(self.collection(ns).find_one(filter).await?)
    }

    async fn find(&self, ns: &Namespace, query: QueryBuilder) -> Result<Vec<BsonDocument>> {
        debug!(namespace = %ns, "find");
        let mut options = FindOptions::default();
        options.projection = query.get_projection().cloned();
        options.sort = query.get_sort().cloned();
        options.limit = query.get_limit();

        let cursor = self
            .collection(ns)
            .find(query.get_filter().clone())
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(&self, ns: &Namespace, document: BsonDocument) -> Result<InsertOneAck> {
        debug!(namespace = %ns, "insertOne");
        let result = self.collection(ns).insert_one(document).await?;
        Ok(InsertOneAck {
            acknowledged: true,
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(
        &self,
        ns: &Namespace,
        documents: Vec<BsonDocument>,
    ) -> Result<InsertManyAck> {
        debug!(namespace = %ns, count = documents.len(), "insertMany");
        let result = self.collection(ns).insert_many(documents).await?;
        Ok(InsertManyAck {
            acknowledged: true,
            inserted_count: result.inserted_ids.len() as u64,
            inserted_ids: result.inserted_ids.into_iter().collect(),
        })
    }

    async fn update_one(
        &self,
        ns: &Namespace,
        filter: BsonDocument,
        update: UpdateModifications,
    ) -> Result<UpdateSummary> {
        debug!(namespace = %ns, "updateOne");
        let collection = self.collection(ns);
        let result = match update {
            UpdateModifications::Document(update) => collection.update_one(filter, update).await?,
            UpdateModifications::Pipeline(stages) => collection.update_one(filter, stages).await?,
        };
        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id,
        })
    }

    async fn update_many(
        &self,
        ns: &Namespace,
        filter: BsonDocument,
        update: UpdateModifications,
    ) -> Result<UpdateSummary> {
        debug!(namespace = %ns, "updateMany");
        let collection = self.collection(ns);
        let result = match update {
            UpdateModifications::Document(update) => collection.update_many(filter, update).await?,
            UpdateModifications::Pipeline(stages) => collection.update_many(filter, stages).await?,
        };
        Ok(UpdateSummary {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id,
        })
    }

    async fn delete_one(&self, ns: &Namespace, filter: BsonDocument) -> Result<DeleteSummary> {
        debug!(namespace = %ns, "deleteOne");
        let result = self.collection(ns).delete_one(filter).await?;
        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, ns: &Namespace, filter: BsonDocument) -> Result<DeleteSummary> {
        debug!(namespace = %ns, "deleteMany");
        let result = self.collection(ns).delete_many(filter).await?;
        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn aggregate(
        &self,
        ns: &Namespace,
        pipeline: Vec<BsonDocument>,
    ) -> Result<Vec<BsonDocument>> {
        debug!(namespace = %ns, stages = pipeline.len(), "aggregate");
        let cursor = self.collection(ns).aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn create_collection(&self, ns: &Namespace, options: CollectionOptions) -> Result<()> {
        debug!(namespace = %ns, validator = options.validator.is_some(), "createCollection");
        let mut create_options = CreateCollectionOptions::default();
        create_options.validator = options.validator;
        create_options.validation_level = options
            .validation_level
            .as_deref()
            .map(validation_level)
            .transpose()?;
        create_options.validation_action = options
            .validation_action
            .as_deref()
            .map(validation_action)
            .transpose()?;

        self.client
            .database(&ns.db)
            .create_collection(&ns.coll)
            .with_options(create_options)
            .await?;
        Ok(())
    }

    async fn drop_collection(&self, ns: &Namespace) -> Result<bool> {
        debug!(namespace = %ns, "dropCollection");
        // Collection::drop swallows "ns not found", so issue the command directly
        let dropped = self
            .client
            .database(&ns.db)
            .run_command(doc! { "drop": &ns.coll })
            .await
            .map_err(ModelError::from);
        match dropped {
            Ok(_) => Ok(true),
            Err(err) if err.is_namespace_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
