//! Operation catalog and result payloads

use bson::{Bson, Document};
use serde::Serialize;
use std::collections::BTreeMap;

/// Every public façade operation. The success event of an operation is its
/// name, the failure event is `<name>-error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindOne,
    First,
    FirstByQuery,
    Find,
    All,
    FindByQuery,
    Sort,
    InsertOne,
    Create,
    InsertMany,
    CreateMany,
    UpdateOne,
    Update,
    UpdateMany,
    DeleteOne,
    DeleteMany,
    CreateCollection,
    DropCollection,
    CollectionDrop,
    Limit,
    LeftJoin,
    FindById,
    FindByEmail,
    FirstByEmail,
    FirstByUsername,
    FirstByPhone,
    FirstByToken,
    FirstByFirstName,
    FirstByLastName,
}

impl Operation {
    pub const ALL: [Operation; 29] = [
        Operation::FindOne,
        Operation::First,
        Operation::FirstByQuery,
        Operation::Find,
        Operation::All,
        Operation::FindByQuery,
        Operation::Sort,
        Operation::InsertOne,
        Operation::Create,
        Operation::InsertMany,
        Operation::CreateMany,
        Operation::UpdateOne,
        Operation::Update,
        Operation::UpdateMany,
        Operation::DeleteOne,
        Operation::DeleteMany,
        Operation::CreateCollection,
        Operation::DropCollection,
        Operation::CollectionDrop,
        Operation::Limit,
        Operation::LeftJoin,
        Operation::FindById,
        Operation::FindByEmail,
        Operation::FirstByEmail,
        Operation::FirstByUsername,
        Operation::FirstByPhone,
        Operation::FirstByToken,
        Operation::FirstByFirstName,
        Operation::FirstByLastName,
    ];

    /// Success event name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::FindOne => "findOne",
            Operation::First => "first",
            Operation::FirstByQuery => "firstByQuery",
            Operation::Find => "find",
            Operation::All => "all",
            Operation::FindByQuery => "findByQuery",
            Operation::Sort => "sort",
            Operation::InsertOne => "insertOne",
            Operation::Create => "create",
            Operation::InsertMany => "insertMany",
            Operation::CreateMany => "createMany",
            Operation::UpdateOne => "updateOne",
            Operation::Update => "update",
            Operation::UpdateMany => "updateMany",
            Operation::DeleteOne => "deleteOne",
            Operation::DeleteMany => "deleteMany",
            Operation::CreateCollection => "createCollection",
            Operation::DropCollection => "dropCollection",
            Operation::CollectionDrop => "collectionDrop",
            Operation::Limit => "limit",
            Operation::LeftJoin => "leftJoin",
            Operation::FindById => "findById",
            Operation::FindByEmail => "findByEmail",
            Operation::FirstByEmail => "firstByEmail",
            Operation::FirstByUsername => "firstByUsername",
            Operation::FirstByPhone => "firstByPhone",
            Operation::FirstByToken => "firstByToken",
            Operation::FirstByFirstName => "firstByFirstName",
            Operation::FirstByLastName => "firstByLastName",
        }
    }

    /// Failure event name
    pub fn error_event(&self) -> String {
        error_event(self.name())
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `<name>-error`
pub fn error_event(name: &str) -> String {
    format!("{}-error", name)
}

/// Insert-one acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneAck {
    pub acknowledged: bool,
    pub inserted_id: Bson,
}

/// Bulk insert acknowledgement; ids keyed by input position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyAck {
    pub acknowledged: bool,
    pub inserted_count: u64,
    pub inserted_ids: BTreeMap<usize, Bson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Bson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

/// Payload of a success event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Document(Document),
    Documents(Vec<Document>),
    Inserted(InsertOneAck),
    InsertedMany(InsertManyAck),
    Updated(UpdateSummary),
    Deleted(DeleteSummary),
    /// `<database>.<collection>`
    Namespace(String),
    Status(String),
}

impl OperationResult {
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            OperationResult::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_documents(&self) -> Option<&[Document]> {
        match self {
            OperationResult::Documents(docs) => Some(docs),
            _ => None,
        }
    }
}

impl From<Document> for OperationResult {
    fn from(doc: Document) -> Self {
        OperationResult::Document(doc)
    }
}

impl From<Vec<Document>> for OperationResult {
    fn from(docs: Vec<Document>) -> Self {
        OperationResult::Documents(docs)
    }
}

impl From<InsertOneAck> for OperationResult {
    fn from(ack: InsertOneAck) -> Self {
        OperationResult::Inserted(ack)
    }
}

impl From<InsertManyAck> for OperationResult {
    fn from(ack: InsertManyAck) -> Self {
        OperationResult::InsertedMany(ack)
    }
}

impl From<UpdateSummary> for OperationResult {
    fn from(summary: UpdateSummary) -> Self {
        OperationResult::Updated(summary)
    }
}

impl From<DeleteSummary> for OperationResult {
    fn from(summary: DeleteSummary) -> Self {
        OperationResult::Deleted(summary)
    }
}
