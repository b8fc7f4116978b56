//! Typed documents on top of the façade
//!
//! Implementing [`Document`] gives a serde type a home collection and typed
//! CRUD helpers. The helpers go through [`Model`], so they emit the same
//! events as the untyped operations.

mod article;

pub use article::Article;

use crate::config::ModelOptions;
use crate::model::Model;
use crate::Result;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document as BsonDocument};
use mongomodel_common::ModelError;
use serde::{de::DeserializeOwned, Serialize};

/// Core trait for typed documents
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
/// use mongomodel::Document;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<ObjectId>,
///     email: String,
/// }
///
/// impl Document for User {
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
#[async_trait]
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    fn collection_name() -> &'static str;

    /// Connection defaults for models of this type
    fn model_options() -> ModelOptions {
        ModelOptions::new().collection(Self::collection_name())
    }

    fn get_id(&self) -> Option<ObjectId> {
        None
    }

    /// Override this if the type stores its `_id`
    fn set_id(&mut self, _id: ObjectId) {}

    fn to_bson(&self) -> Result<BsonDocument> {
        bson::to_document(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    fn from_bson(doc: BsonDocument) -> Result<Self> {
        bson::from_document(doc).map_err(|e| ModelError::Deserialization(e.to_string()))
    }

    /// Connect a model for this type; unset `overrides` fall back to
    /// [`Document::model_options`]
    async fn connect(overrides: ModelOptions) -> Result<Model> {
        Model::connect(overrides.or(Self::model_options())).await
    }

    /// `model` retargeted at this type's collection
    fn bind(model: &Model) -> Model {
        model.with_collection(Self::collection_name())
    }

    /// Insert this document and record its new id
    async fn insert(&mut self, model: &Model) -> Result<ObjectId> {
        let ack = Self::bind(model).insert_one(self.to_bson()?).await?;
        let id = ack
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ModelError::Internal("inserted id is not an ObjectId".to_string()))?;
        self.set_id(id);
        Ok(id)
    }

    /// `None` when no document has this id
    async fn find_by_id(model: &Model, id: &str) -> Result<Option<Self>> {
        let found = Self::bind(model).find_by_id(id).await?;
        if found.is_empty() {
            return Ok(None);
        }
        Self::from_bson(found).map(Some)
    }

    async fn find(model: &Model, filter: BsonDocument) -> Result<Vec<Self>> {
        Self::bind(model)
            .find(filter, BsonDocument::new())
            .await?
            .into_iter()
            .map(Self::from_bson)
            .collect()
    }

    /// Write every field back; inserts when the document has no id yet
    async fn save(&mut self, model: &Model) -> Result<ObjectId> {
        let Some(id) = self.get_id() else {
            return self.insert(model).await;
        };
        let mut fields = self.to_bson()?;
        fields.remove("_id");
        Self::bind(model)
            .update_one(doc! { "_id": id }, fields)
            .await?;
        Ok(id)
    }

    /// Returns true if a document was removed
    async fn delete(&self, model: &Model) -> Result<bool> {
        let id = self
            .get_id()
            .ok_or_else(|| ModelError::validation("cannot delete a document without an id"))?;
        let summary = Self::bind(model).delete_one(doc! { "_id": id }).await?;
        Ok(summary.deleted_count > 0)
    }
}
