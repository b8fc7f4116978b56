//! The operation façade
//!
//! [`Model`] exposes one async method per database operation. Every call
//! follows the same path: validate the inputs, issue exactly one driver call,
//! emit exactly one event (`<operation>` or `<operation>-error`) and return
//! the same outcome to the caller. Validation failures never reach the
//! driver.
//!
//! ```ignore
//! use bson::doc;
//! use mongomodel::{Model, ModelOptions};
//!
//! let model = Model::connect(ModelOptions::new().db("shop").collection("widgets")).await?;
//! model.on("insertOne", |event| println!("{:?}", event.payload));
//! let ack = model.insert_one(doc! { "name": "sprocket" }).await?;
//! let widget = model.find_by_id(&ack.inserted_id.as_object_id().unwrap().to_hex()).await?;
//! ```

use crate::config::{ModelConfig, ModelOptions};
use crate::connection::{Connection, PoolConfig};
use crate::driver::{CollectionOptions, Driver, Namespace};
use crate::events::{Event, EventEmitter, EventPayload, ListenerId};
use crate::operation::{
    DeleteSummary, InsertManyAck, InsertOneAck, Operation, OperationResult, UpdateSummary,
};
use crate::query::QueryBuilder;
use crate::validation::{self, LeftJoin};
use crate::Result;
use bson::{doc, Bson, Document};
use mongomodel_common::ModelError;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// CRUD façade bound to one collection of one database
#[derive(Clone)]
pub struct Model {
    config: Arc<ModelConfig>,
    collection: String,
    database: String,
    driver: Arc<dyn Driver>,
    events: EventEmitter,
}

impl Model {
    /// Resolve `options` and bind the façade to an existing driver
    pub fn new(options: ModelOptions, driver: Arc<dyn Driver>) -> Self {
        Self::with_config(ModelConfig::resolve(options), driver)
    }

    pub fn with_config(config: ModelConfig, driver: Arc<dyn Driver>) -> Self {
        Self {
            collection: config.collection().to_string(),
            database: config.database().to_string(),
            config: Arc::new(config),
            driver,
            events: EventEmitter::new(),
        }
    }

    /// Resolve `options` and open a pooled connection to the resolved URI
    pub async fn connect(options: ModelOptions) -> Result<Self> {
        Self::connect_with_pool(options, PoolConfig::default()).await
    }

    pub async fn connect_with_pool(options: ModelOptions, pool: PoolConfig) -> Result<Self> {
        let config = ModelConfig::resolve(options);
        let connection = Connection::with_config(config.resolved_uri(), pool).await?;
        Ok(Self::with_config(config, Arc::new(connection)))
    }

    /// Same driver and listeners, different target collection
    pub fn with_collection(&self, collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..self.clone()
        }
    }

    /// Same driver and listeners, different target database
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.on(event, listener)
    }

    pub fn once<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.once(event, listener)
    }

    fn namespace(&self) -> Result<Namespace> {
        let (coll, db) =
            validation::validate_collection_name_db_name(&self.collection, &self.database)?;
        Ok(Namespace::new(db, coll.into_string()))
    }

    /// Await `work`, emit its single event and hand the outcome back
    async fn run<T, F>(&self, op: Operation, wrap: fn(T) -> OperationResult, work: F) -> Result<T>
    where
        T: Clone,
        F: Future<Output = Result<T>>,
    {
        let outcome = work.await;
        match &outcome {
            Ok(value) => {
                debug!(op = %op, collection = %self.collection, "operation succeeded");
                if self.events.listener_count(op.name()) > 0 {
                    self.events.emit(&Event {
                        name: op.name().to_string(),
                        payload: EventPayload::Success(wrap(value.clone())),
                    });
                }
            }
            Err(err) => {
                if err.is_validation() {
                    debug!(op = %op, error = %err, "input rejected");
                } else {
                    warn!(
                        op = %op,
                        collection = %self.collection,
                        error = %err,
                        "operation failed"
                    );
                }
                self.events.emit(&Event {
                    name: op.error_event(),
                    payload: EventPayload::Error(err.signal()),
                });
            }
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Single-document reads
    // ------------------------------------------------------------------------

    async fn first_matching(&self, op: Operation, query: Bson) -> Result<Document> {
        self.run(op, OperationResult::Document, async {
            let ns = self.namespace()?;
            let query = validation::validate_query(&query)?;
            Ok(self.driver.find_one(&ns, query).await?.unwrap_or_default())
        })
        .await
    }

    /// First document matching `query`, or `{}` when nothing matches
    pub async fn find_one(&self, query: impl Into<Bson>) -> Result<Document> {
        self.first_matching(Operation::FindOne, query.into()).await
    }

    pub async fn first(&self, query: impl Into<Bson>) -> Result<Document> {
        self.first_matching(Operation::First, query.into()).await
    }

    pub async fn first_by_query(&self, query: impl Into<Bson>) -> Result<Document> {
        self.first_matching(Operation::FirstByQuery, query.into()).await
    }

    /// Document with the given hex id, or `{}`
    pub async fn find_by_id(&self, id: &str) -> Result<Document> {
        self.run(Operation::FindById, OperationResult::Document, async {
            let ns = self.namespace()?;
            let id = validation::validate_id(id)?;
            Ok(self
                .driver
                .find_one(&ns, doc! { "_id": id })
                .await?
                .unwrap_or_default())
        })
        .await
    }

    async fn first_by_field(
        &self,
        op: Operation,
        field: &str,
        value: &str,
        check: fn(&str) -> Result<String>,
    ) -> Result<Document> {
        self.run(op, OperationResult::Document, async {
            let ns = self.namespace()?;
            let mut filter = Document::new();
            filter.insert(field, check(value)?);
            Ok(self.driver.find_one(&ns, filter).await?.unwrap_or_default())
        })
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FindByEmail,
            "email",
            email,
            validation::validate_email,
        )
        .await
    }

    pub async fn first_by_email(&self, email: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByEmail,
            "email",
            email,
            validation::validate_email,
        )
        .await
    }

    pub async fn first_by_username(&self, username: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByUsername,
            "username",
            username,
            validation::validate_username,
        )
        .await
    }

    pub async fn first_by_phone(&self, phone: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByPhone,
            "phone",
            phone,
            validation::validate_phone,
        )
        .await
    }

    pub async fn first_by_token(&self, token: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByToken,
            "token",
            token,
            validation::validate_token,
        )
        .await
    }

    pub async fn first_by_first_name(&self, first_name: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByFirstName,
            "firstname",
            first_name,
            validation::validate_first_name,
        )
        .await
    }

    pub async fn first_by_last_name(&self, last_name: &str) -> Result<Document> {
        self.first_by_field(
            Operation::FirstByLastName,
            "lastname",
            last_name,
            validation::validate_last_name,
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Multi-document reads
    // ------------------------------------------------------------------------

    async fn find_matching(
        &self,
        op: Operation,
        query: Bson,
        projection: Bson,
    ) -> Result<Vec<Document>> {
        self.run(op, OperationResult::Documents, async {
            let ns = self.namespace()?;
            let (query, projection) = validation::validate_query_projection(&query, &projection)?;
            let find = QueryBuilder::new().filter(query).projection(projection);
            self.driver.find(&ns, find).await
        })
        .await
    }

    /// Every document matching `query`, shaped by `projection`
    pub async fn find(
        &self,
        query: impl Into<Bson>,
        projection: impl Into<Bson>,
    ) -> Result<Vec<Document>> {
        self.find_matching(Operation::Find, query.into(), projection.into())
            .await
    }

    pub async fn all(
        &self,
        query: impl Into<Bson>,
        projection: impl Into<Bson>,
    ) -> Result<Vec<Document>> {
        self.find_matching(Operation::All, query.into(), projection.into())
            .await
    }

    pub async fn find_by_query(
        &self,
        query: impl Into<Bson>,
        projection: impl Into<Bson>,
    ) -> Result<Vec<Document>> {
        self.find_matching(Operation::FindByQuery, query.into(), projection.into())
            .await
    }

    pub async fn sort(
        &self,
        query: impl Into<Bson>,
        sort: impl Into<Bson>,
        projection: impl Into<Bson>,
    ) -> Result<Vec<Document>> {
        let (query, sort, projection) = (query.into(), sort.into(), projection.into());
        self.run(Operation::Sort, OperationResult::Documents, async {
            let ns = self.namespace()?;
            let (query, sort, projection) =
                validation::validate_query_projection_sort(&query, &sort, &projection)?;
            let find = QueryBuilder::new()
                .filter(query)
                .sort(sort)
                .projection(projection);
            self.driver.find(&ns, find).await
        })
        .await
    }

    /// At most `limit` documents matching `query`; a limit of 0 means no cap
    pub async fn limit(
        &self,
        query: impl Into<Bson>,
        limit: i64,
        projection: impl Into<Bson>,
    ) -> Result<Vec<Document>> {
        let (query, projection) = (query.into(), projection.into());
        self.run(Operation::Limit, OperationResult::Documents, async {
            let ns = self.namespace()?;
            let (query, limit, projection) =
                validation::validate_query_limit_projection(&query, limit, &projection)?;
            let find = QueryBuilder::new()
                .filter(query)
                .limit(limit)
                .projection(projection);
            self.driver.find(&ns, find).await
        })
        .await
    }

    /// `$lookup` of `join.to` into `join.from`, in this model's database
    pub async fn left_join(&self, join: LeftJoin) -> Result<Vec<Document>> {
        self.run(Operation::LeftJoin, OperationResult::Documents, async {
            let db = validation::validate_db_name(&self.database)?;
            let join = validation::validate_left_join_items(&join)?;
            let ns = Namespace::new(db, join.from.clone());
            self.driver.aggregate(&ns, join.pipeline()).await
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    async fn insert_single(&self, op: Operation, data: Bson) -> Result<InsertOneAck> {
        self.run(op, OperationResult::Inserted, async {
            let ns = self.namespace()?;
            let document = validation::validate_data(&data)?;
            self.driver.insert_one(&ns, document).await
        })
        .await
    }

    pub async fn insert_one(&self, data: impl Into<Bson>) -> Result<InsertOneAck> {
        self.insert_single(Operation::InsertOne, data.into()).await
    }

    pub async fn create(&self, data: impl Into<Bson>) -> Result<InsertOneAck> {
        self.insert_single(Operation::Create, data.into()).await
    }

    async fn insert_bulk(&self, op: Operation, data: Bson) -> Result<InsertManyAck> {
        self.run(op, OperationResult::InsertedMany, async {
            let ns = self.namespace()?;
            let documents = validation::validate_data_array(&data)?;
            self.driver.insert_many(&ns, documents).await
        })
        .await
    }

    /// Insert an array of documents
    pub async fn insert_many(&self, data: impl Into<Bson>) -> Result<InsertManyAck> {
        self.insert_bulk(Operation::InsertMany, data.into()).await
    }

    pub async fn create_many(&self, data: impl Into<Bson>) -> Result<InsertManyAck> {
        self.insert_bulk(Operation::CreateMany, data.into()).await
    }

    async fn update_first(&self, op: Operation, query: Bson, data: Bson) -> Result<UpdateSummary> {
        self.run(op, OperationResult::Updated, async {
            let ns = self.namespace()?;
            let (query, data) = validation::validate_query_data(&query, &data)?;
            let update = validation::UpdateData::Fields(data).into_modifications();
            self.driver.update_one(&ns, query, update).await
        })
        .await
    }

    /// `$set` the fields of `data` on the first document matching `query`
    pub async fn update_one(
        &self,
        query: impl Into<Bson>,
        data: impl Into<Bson>,
    ) -> Result<UpdateSummary> {
        self.update_first(Operation::UpdateOne, query.into(), data.into())
            .await
    }

    pub async fn update(
        &self,
        query: impl Into<Bson>,
        data: impl Into<Bson>,
    ) -> Result<UpdateSummary> {
        self.update_first(Operation::Update, query.into(), data.into())
            .await
    }

    /// Update every match: a document is applied with `$set`, an array is
    /// run as an update pipeline
    pub async fn update_many(
        &self,
        query: impl Into<Bson>,
        data: impl Into<Bson>,
    ) -> Result<UpdateSummary> {
        let (query, data) = (query.into(), data.into());
        self.run(Operation::UpdateMany, OperationResult::Updated, async {
            let ns = self.namespace()?;
            let query = validation::validate_query(&query)?;
            let update = validation::validate_update_data(&data)?.into_modifications();
            self.driver.update_many(&ns, query, update).await
        })
        .await
    }

    pub async fn delete_one(&self, query: impl Into<Bson>) -> Result<DeleteSummary> {
        let query = query.into();
        self.run(Operation::DeleteOne, OperationResult::Deleted, async {
            let ns = self.namespace()?;
            let query = validation::validate_query(&query)?;
            self.driver.delete_one(&ns, query).await
        })
        .await
    }

    pub async fn delete_many(&self, query: impl Into<Bson>) -> Result<DeleteSummary> {
        let query = query.into();
        self.run(Operation::DeleteMany, OperationResult::Deleted, async {
            let ns = self.namespace()?;
            let query = validation::validate_query(&query)?;
            self.driver.delete_many(&ns, query).await
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------------

    /// Create `name` in this model's database; resolves to `<db>.<name>`
    pub async fn create_collection(&self, name: &str) -> Result<String> {
        self.create_collection_with(name, CollectionOptions::default())
            .await
    }

    /// Create `name` with schema-validation options
    pub async fn create_collection_with(
        &self,
        name: &str,
        options: CollectionOptions,
    ) -> Result<String> {
        self.run(Operation::CreateCollection, OperationResult::Namespace, async {
            let (coll, db) = validation::validate_collection_name_db_name(name, &self.database)?;
            let ns = Namespace::new(db, coll.into_string());
            self.driver.create_collection(&ns, options).await?;
            Ok(ns.to_string())
        })
        .await
    }

    async fn drop_named(&self, op: Operation, name: &str) -> Result<String> {
        self.run(op, OperationResult::Status, async {
            let (coll, db) = validation::validate_collection_name_db_name(name, &self.database)?;
            let ns = Namespace::new(db, coll.into_string());
            if !self.driver.drop_collection(&ns).await? {
                return Err(ModelError::NamespaceNotFound(ns.to_string()));
            }
            Ok(format!("collection {} dropped from {}!", ns.coll, ns.db))
        })
        .await
    }

    pub async fn drop_collection(&self, name: &str) -> Result<String> {
        self.drop_named(Operation::DropCollection, name).await
    }

    pub async fn collection_drop(&self, name: &str) -> Result<String> {
        self.drop_named(Operation::CollectionDrop, name).await
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("uri", &self.config.resolved_uri())
            .finish()
    }
}
