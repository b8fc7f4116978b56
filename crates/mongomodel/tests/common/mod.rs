//! In-memory driver for façade tests
//!
//! Supports equality filters, inclusion/exclusion projections, single and
//! multi-key sorts, `$set` updates and single-stage `$lookup` pipelines.
//! Good enough to observe what the façade sends and returns, nothing more.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use mongomodel::{
    CollectionOptions, DeleteSummary, Driver, Event, InsertManyAck, InsertOneAck, Model,
    ModelError, ModelOptions, Namespace, QueryBuilder, Result, UpdateModifications,
    UpdateSummary,
};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct Store {
    collections: HashMap<Namespace, Vec<Document>>,
    created: HashMap<Namespace, CollectionOptions>,
}

#[derive(Default)]
pub struct MemoryDriver {
    store: Mutex<Store>,
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<ModelError>>,
}

impl MemoryDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Names of the driver methods called so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Make the next driver call fail with `err`
    pub fn fail_next(&self, err: ModelError) {
        *self.fail_next.lock() = Some(err);
    }

    pub fn documents(&self, db: &str, coll: &str) -> Vec<Document> {
        self.store
            .lock()
            .collections
            .get(&Namespace::new(db, coll))
            .cloned()
            .unwrap_or_default()
    }

    pub fn created_options(&self, db: &str, coll: &str) -> Option<CollectionOptions> {
        self.store
            .lock()
            .created
            .get(&Namespace::new(db, coll))
            .cloned()
    }

    fn enter(&self, method: &str) -> Result<()> {
        self.calls.lock().push(method.to_string());
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| doc.get(key) == Some(expected))
}

fn project(doc: &Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return doc.clone();
    };
    let included = |key: &str| {
        projection
            .get(key)
            .map(|v| v.as_i32() == Some(1) || v.as_bool() == Some(true))
    };
    let inclusive = projection
        .iter()
        .any(|(key, v)| key != "_id" && (v.as_i32() == Some(1) || v.as_bool() == Some(true)));

    doc.iter()
        .filter(|(key, _)| match included(key) {
            Some(flag) => flag,
            None => !inclusive || key.as_str() == "_id",
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(Bson::Int32(x)), Some(Bson::Int32(y))) => x.cmp(y),
        (Some(Bson::Int64(x)), Some(Bson::Int64(y))) => x.cmp(y),
        (Some(Bson::Double(x)), Some(Bson::Double(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn apply_set(doc: &mut Document, update: &UpdateModifications) {
    let stages: Vec<&Document> = match update {
        UpdateModifications::Document(update) => vec![update],
        UpdateModifications::Pipeline(stages) => stages.iter().collect(),
    };
    for stage in stages {
        if let Ok(fields) = stage.get_document("$set") {
            for (key, value) in fields {
                doc.insert(key.clone(), value.clone());
            }
        }
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn find_one(&self, ns: &Namespace, filter: Document) -> Result<Option<Document>> {
        self.enter("find_one")?;
        let store = self.store.lock();
        Ok(store
            .collections
            .get(ns)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn find(&self, ns: &Namespace, query: QueryBuilder) -> Result<Vec<Document>> {
        self.enter("find")?;
        let store = self.store.lock();
        let mut found: Vec<Document> = store
            .collections
            .get(ns)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches(d, query.get_filter()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = query.get_sort() {
            found.sort_by(|a, b| {
                sort.iter()
                    .map(|(key, dir)| {
                        let order = compare(a.get(key), b.get(key));
                        if dir.as_i32() == Some(-1) {
                            order.reverse()
                        } else {
                            order
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        if let Some(limit) = query.get_limit().filter(|l| *l > 0) {
            found.truncate(limit as usize);
        }
        Ok(found
            .iter()
            .map(|d| project(d, query.get_projection()))
            .collect())
    }

    async fn insert_one(&self, ns: &Namespace, mut document: Document) -> Result<InsertOneAck> {
        self.enter("insert_one")?;
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let inserted_id = document.get("_id").cloned().unwrap_or(Bson::Null);
        self.store
            .lock()
            .collections
            .entry(ns.clone())
            .or_default()
            .push(document);
        Ok(InsertOneAck {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn insert_many(&self, ns: &Namespace, documents: Vec<Document>) -> Result<InsertManyAck> {
        self.enter("insert_many")?;
        let mut store = self.store.lock();
        let target = store.collections.entry(ns.clone()).or_default();
        let mut inserted_ids = BTreeMap::new();
        for (index, mut document) in documents.into_iter().enumerate() {
            if !document.contains_key("_id") {
                document.insert("_id", ObjectId::new());
            }
            inserted_ids.insert(index, document.get("_id").cloned().unwrap_or(Bson::Null));
            target.push(document);
        }
        Ok(InsertManyAck {
            acknowledged: true,
            inserted_count: inserted_ids.len() as u64,
            inserted_ids,
        })
    }

    async fn update_one(
        &self,
        ns: &Namespace,
        filter: Document,
        update: UpdateModifications,
    ) -> Result<UpdateSummary> {
        self.enter("update_one")?;
        let mut store = self.store.lock();
        let mut summary = UpdateSummary::default();
        if let Some(doc) = store
            .collections
            .get_mut(ns)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, &filter)))
        {
            let before = doc.clone();
            apply_set(doc, &update);
            summary.matched_count = 1;
            summary.modified_count = u64::from(*doc != before);
        }
        Ok(summary)
    }

    async fn update_many(
        &self,
        ns: &Namespace,
        filter: Document,
        update: UpdateModifications,
    ) -> Result<UpdateSummary> {
        self.enter("update_many")?;
        let mut store = self.store.lock();
        let mut summary = UpdateSummary::default();
        if let Some(docs) = store.collections.get_mut(ns) {
            for doc in docs.iter_mut().filter(|d| matches(d, &filter)) {
                let before = doc.clone();
                apply_set(doc, &update);
                summary.matched_count += 1;
                summary.modified_count += u64::from(*doc != before);
            }
        }
        Ok(summary)
    }

    async fn delete_one(&self, ns: &Namespace, filter: Document) -> Result<DeleteSummary> {
        self.enter("delete_one")?;
        let mut store = self.store.lock();
        let mut deleted_count = 0;
        if let Some(docs) = store.collections.get_mut(ns) {
            if let Some(pos) = docs.iter().position(|d| matches(d, &filter)) {
                docs.remove(pos);
                deleted_count = 1;
            }
        }
        Ok(DeleteSummary { deleted_count })
    }

    async fn delete_many(&self, ns: &Namespace, filter: Document) -> Result<DeleteSummary> {
        self.enter("delete_many")?;
        let mut store = self.store.lock();
        let mut deleted_count = 0;
        if let Some(docs) = store.collections.get_mut(ns) {
            let before = docs.len();
            docs.retain(|d| !matches(d, &filter));
            deleted_count = (before - docs.len()) as u64;
        }
        Ok(DeleteSummary { deleted_count })
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        self.enter("aggregate")?;
        let store = self.store.lock();
        let mut docs = store.collections.get(ns).cloned().unwrap_or_default();
        for stage in &pipeline {
            let Ok(lookup) = stage.get_document("$lookup") else {
                continue;
            };
            let (Ok(from), Ok(local), Ok(foreign), Ok(alias)) = (
                lookup.get_str("from"),
                lookup.get_str("localField"),
                lookup.get_str("foreignField"),
                lookup.get_str("as"),
            ) else {
                continue;
            };
            let joined = store
                .collections
                .get(&Namespace::new(ns.db.clone(), from))
                .cloned()
                .unwrap_or_default();
            for doc in docs.iter_mut() {
                let key = doc.get(local).cloned();
                let hits: Vec<Bson> = joined
                    .iter()
                    .filter(|j| key.is_some() && j.get(foreign) == key.as_ref())
                    .cloned()
                    .map(Bson::Document)
                    .collect();
                doc.insert(alias, hits);
            }
        }
        Ok(docs)
    }

    async fn create_collection(&self, ns: &Namespace, options: CollectionOptions) -> Result<()> {
        self.enter("create_collection")?;
        let mut store = self.store.lock();
        if store.created.contains_key(ns) {
            return Err(ModelError::NamespaceExists(format!(
                "Collection {} already exists. (NamespaceExists)",
                ns
            )));
        }
        store.created.insert(ns.clone(), options);
        store.collections.entry(ns.clone()).or_default();
        Ok(())
    }

    async fn drop_collection(&self, ns: &Namespace) -> Result<bool> {
        self.enter("drop_collection")?;
        let mut store = self.store.lock();
        let created = store.created.remove(ns).is_some();
        let stored = store.collections.remove(ns).is_some();
        Ok(created || stored)
    }
}

/// A model over `test.widgets` with no environment involved
pub fn widgets(driver: &Arc<MemoryDriver>) -> Model {
    let config = mongomodel::ModelConfig::resolve_with(
        ModelOptions::new().collection("widgets").db("test"),
        |_| None,
    );
    Model::with_config(config, driver.clone())
}

/// Every event the model emits for `names`, in order
pub fn record(model: &Model, names: &[&str]) -> Arc<Mutex<Vec<Event>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in names {
        let sink = seen.clone();
        model.on(*name, move |event: &Event| sink.lock().push(event.clone()));
    }
    seen
}

/// Record `<op>` and `<op>-error`
pub fn record_op(model: &Model, op: &str) -> Arc<Mutex<Vec<Event>>> {
    let error = format!("{}-error", op);
    record(model, &[op, error.as_str()])
}
