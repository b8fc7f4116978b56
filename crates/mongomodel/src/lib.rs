//! Event-emitting CRUD façade over MongoDB
//!
//! A [`Model`] is bound to one collection of one database. Each of its
//! operations validates loosely typed BSON input, makes a single driver call
//! and reports the outcome twice: as the returned `Result` and as an
//! `<operation>` / `<operation>-error` event.
//!
//! # Features
//! - Connection settings resolved from options, environment and defaults
//! - Validation that never lets malformed input reach the server
//! - Pluggable [`Driver`] (pooled `mongodb::Client` by default)
//! - Typed documents via the [`models::Document`] trait

pub mod config;
pub mod connection;
pub mod driver;
pub mod events;
pub mod model;
pub mod models;
pub mod operation;
pub mod query;
pub mod validation;

pub use config::{ModelConfig, ModelOptions};
pub use connection::{Connection, PoolConfig};
pub use driver::{CollectionOptions, Driver, Namespace, UpdateModifications};
pub use events::{Event, EventEmitter, EventPayload, ListenerId};
pub use model::Model;
pub use models::{Article, Document};
pub use mongomodel_common::{ErrorSignal, ModelError, Result};
pub use operation::{
    DeleteSummary, InsertManyAck, InsertOneAck, Operation, OperationResult, UpdateSummary,
};
pub use query::QueryBuilder;
pub use validation::{LeftJoin, UpdateData, ValidatedCollectionName};
