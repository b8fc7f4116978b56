//! Driver abstraction used by the façade
//!
//! [`crate::Connection`] implements [`Driver`] over a pooled
//! `mongodb::Client`. Any other implementation (an in-memory store in tests,
//! a proxy) can be injected into [`crate::Model`].

use crate::operation::{DeleteSummary, InsertManyAck, InsertOneAck, UpdateSummary};
use crate::query::QueryBuilder;
use crate::validation::UpdateData;
use crate::Result;
use async_trait::async_trait;
use bson::{doc, Document};

/// `<database>.<collection>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub db: String,
    pub coll: String,
}

impl Namespace {
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            coll: coll.into(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}

/// Options for explicit collection creation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOptions {
    /// Schema-validation document, e.g. `{ "$jsonSchema": { ... } }`
    pub validator: Option<Document>,
    /// `off`, `strict` or `moderate`
    pub validation_level: Option<String>,
    /// `error` or `warn`
    pub validation_action: Option<String>,
}

impl CollectionOptions {
    /// Read `validator`, `validationLevel` and `validationAction` out of a
    /// schema-validation document; other keys are ignored.
    pub fn from_schema(schema: &Document) -> Self {
        Self {
            validator: schema.get_document("validator").ok().cloned(),
            validation_level: schema.get_str("validationLevel").ok().map(str::to_string),
            validation_action: schema.get_str("validationAction").ok().map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.validator.is_none()
            && self.validation_level.is_none()
            && self.validation_action.is_none()
    }
}

impl UpdateData {
    /// Fields become a `$set` document; pipelines pass through unchanged
    pub fn into_modifications(self) -> UpdateModifications {
        match self {
            UpdateData::Fields(fields) => UpdateModifications::Document(doc! { "$set": fields }),
            UpdateData::Pipeline(stages) => UpdateModifications::Pipeline(stages),
        }
    }
}

/// Update argument handed to the driver
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateModifications {
    Document(Document),
    Pipeline(Vec<Document>),
}

/// The single driver call behind each façade operation
#[async_trait]
pub trait Driver: Send + Sync {
    async fn find_one(&self, ns: &Namespace, filter: Document) -> Result<Option<Document>>;

    async fn find(&self, ns: &Namespace, query: QueryBuilder) -> Result<Vec<Document>>;

    async fn insert_one(&self, ns: &Namespace, document: Document) -> Result<InsertOneAck>;

    async fn insert_many(&self, ns: &Namespace, documents: Vec<Document>) -> Result<InsertManyAck>;

    async fn update_one(
        &self,
        ns: &Namespace,
        filter: Document,
        update: UpdateModifications,
    ) -> Result<UpdateSummary>;

    async fn update_many(
        &self,
        ns: &Namespace,
        filter: Document,
        update: UpdateModifications,
    ) -> Result<UpdateSummary>;

    async fn delete_one(&self, ns: &Namespace, filter: Document) -> Result<DeleteSummary>;

    async fn delete_many(&self, ns: &Namespace, filter: Document) -> Result<DeleteSummary>;

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<Document>) -> Result<Vec<Document>>;

    async fn create_collection(&self, ns: &Namespace, options: CollectionOptions) -> Result<()>;

    /// Returns false when the collection did not exist
    async fn drop_collection(&self, ns: &Namespace) -> Result<bool>;
}
