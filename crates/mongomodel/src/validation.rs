//! Input validation for façade operations
//!
//! Every operation accepts loosely typed [`Bson`] inputs and runs them
//! through these checks before the driver is touched. Each check returns the
//! typed value on success or a [`ModelError::Validation`] carrying the bare
//! message that ends up in the `<operation>-error` event.
//!
//! `Bson::Null` stands for "argument not given" and resolves to the
//! operation's default (an empty document).

use crate::Result;
use bson::{oid::ObjectId, Bson, Document};
use mongomodel_common::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// MongoDB limit on database names
const MAX_DB_NAME_LENGTH: usize = 64;

/// Maximum allowed length for field names
const MAX_FIELD_NAME_LENGTH: usize = 1024;

/// Characters MongoDB rejects in database names
const INVALID_DB_NAME_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern compiles")
});

fn object_or_default(value: &Bson, message: &str) -> Result<Document> {
    match value {
        Bson::Null => Ok(Document::new()),
        Bson::Document(doc) => Ok(doc.clone()),
        _ => Err(ModelError::validation(message)),
    }
}

/// Operators that execute server-side JavaScript
const DANGEROUS_OPERATORS: &[&str] = &["$where", "$function", "$accumulator"];

/// A query must be a document and may not execute server-side JavaScript
pub fn validate_query(query: &Bson) -> Result<Document> {
    let query = object_or_default(query, "input query must be an object")?;
    reject_dangerous_operators(&query)?;
    Ok(query)
}

fn reject_dangerous_operators(doc: &Document) -> Result<()> {
    for (key, value) in doc.iter() {
        if DANGEROUS_OPERATORS.contains(&key.as_str()) {
            return Err(ModelError::validation(format!(
                "operator '{}' is not allowed in queries",
                key
            )));
        }
        check_nested(value)?;
    }
    Ok(())
}

fn check_nested(value: &Bson) -> Result<()> {
    match value {
        Bson::Document(doc) => reject_dangerous_operators(doc),
        Bson::Array(items) => items.iter().try_for_each(check_nested),
        _ => Ok(()),
    }
}

pub fn validate_projection(projection: &Bson) -> Result<Document> {
    object_or_default(projection, "input projection must be an object")
}

pub fn validate_sort(sort: &Bson) -> Result<Document> {
    object_or_default(sort, "input sort must be an object")
}

/// A single document to insert or to `$set`
pub fn validate_data(data: &Bson) -> Result<Document> {
    object_or_default(data, "input data must be an object")
}

/// Documents for a bulk insert
pub fn validate_data_array(data: &Bson) -> Result<Vec<Document>> {
    match data {
        Bson::Array(items) => documents_of(items),
        _ => Err(ModelError::validation("input data must be an array of objects")),
    }
}

/// Update payload of `updateMany`
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateData {
    /// Fields applied with `$set`
    Fields(Document),
    /// Aggregation-pipeline update stages
    Pipeline(Vec<Document>),
}

pub fn validate_update_data(data: &Bson) -> Result<UpdateData> {
    match data {
        Bson::Null => Ok(UpdateData::Fields(Document::new())),
        Bson::Document(doc) => Ok(UpdateData::Fields(doc.clone())),
        Bson::Array(items) => documents_of(items).map(UpdateData::Pipeline),
        _ => Err(ModelError::validation("input data must be an array or an object")),
    }
}

fn documents_of(items: &[Bson]) -> Result<Vec<Document>> {
    items
        .iter()
        .map(|item| match item {
            Bson::Document(doc) => Ok(doc.clone()),
            _ => Err(ModelError::validation(
                "each element of input data must be an object",
            )),
        })
        .collect()
}

pub fn validate_limit(limit: i64) -> Result<i64> {
    if limit < 0 {
        return Err(ModelError::validation(
            "input limit must be a non-negative integer",
        ));
    }
    Ok(limit)
}

/// Validated collection name that prevents injection attacks
///
/// # Security Guarantees
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters (special operators)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    ///
    /// # Errors
    /// Returns a validation error if the name is empty, too long, contains
    /// null bytes or `$`, or starts with `system.`
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(ModelError::validation(
                "input collection name must be a non-empty string",
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(ModelError::validation(format!(
                "input collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(ModelError::validation(
                "input collection name cannot contain null bytes",
            ));
        }

        if name.starts_with("system.") {
            return Err(ModelError::validation(format!(
                "input collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(ModelError::validation(format!(
                "input collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        if name.contains("..") || name.contains("//") {
            tracing::warn!(collection = %name, "Collection name contains suspicious pattern");
        }

        Ok(ValidatedCollectionName {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn validate_collection_name(name: &str) -> Result<ValidatedCollectionName> {
    ValidatedCollectionName::new(name)
}

pub fn validate_db_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(ModelError::validation(
            "input database name must be a non-empty string",
        ));
    }
    if name.len() > MAX_DB_NAME_LENGTH {
        return Err(ModelError::validation(format!(
            "input database name exceeds maximum length of {} characters",
            MAX_DB_NAME_LENGTH
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_DB_NAME_CHARS.contains(c)) {
        return Err(ModelError::validation(format!(
            "input database name cannot contain {:?}",
            c
        )));
    }
    Ok(name.to_string())
}

/// Field names used as join keys or finder keys.
/// `$`-prefixed names are operators, not fields.
pub fn validate_field_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(ModelError::validation("field name cannot be empty"));
    }
    if name.len() > MAX_FIELD_NAME_LENGTH {
        return Err(ModelError::validation(format!(
            "field name exceeds maximum length of {} characters",
            MAX_FIELD_NAME_LENGTH
        )));
    }
    if name.contains('\0') {
        return Err(ModelError::validation("field name cannot contain null bytes"));
    }
    if name.starts_with('$') {
        return Err(ModelError::validation(format!(
            "field name cannot start with '$' (reserved for operators): '{}'",
            name
        )));
    }
    Ok(name.to_string())
}

/// Parse a document id. Only the 24-character hex form is accepted; the
/// all-zero id is rejected.
pub fn validate_id(id: &str) -> Result<ObjectId> {
    let invalid = || ModelError::validation("input document id is invalid");
    if id.len() != 24 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    if id.chars().all(|c| c == '0') {
        return Err(invalid());
    }
    ObjectId::parse_str(id).map_err(|_| invalid())
}

fn non_empty_string(value: &str, field: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ModelError::validation(format!(
            "input {} must be a non-empty string",
            field
        )));
    }
    Ok(value.to_string())
}

pub fn validate_email(email: &str) -> Result<String> {
    let email = non_empty_string(email, "email")?;
    if !EMAIL_PATTERN.is_match(&email.to_lowercase()) {
        return Err(ModelError::validation(
            "input email must be a valid email address",
        ));
    }
    Ok(email)
}

pub fn validate_username(username: &str) -> Result<String> {
    non_empty_string(username, "username")
}

pub fn validate_phone(phone: &str) -> Result<String> {
    non_empty_string(phone, "phone")
}

pub fn validate_token(token: &str) -> Result<String> {
    non_empty_string(token, "token")
}

pub fn validate_first_name(first_name: &str) -> Result<String> {
    non_empty_string(first_name, "first name")
}

pub fn validate_last_name(last_name: &str) -> Result<String> {
    non_empty_string(last_name, "last name")
}

// ============================================================================
// Compound validators
// ============================================================================

pub fn validate_query_projection(query: &Bson, projection: &Bson) -> Result<(Document, Document)> {
    Ok((validate_query(query)?, validate_projection(projection)?))
}

pub fn validate_query_projection_sort(
    query: &Bson,
    sort: &Bson,
    projection: &Bson,
) -> Result<(Document, Document, Document)> {
    let query = validate_query(query)?;
    let projection = validate_projection(projection)?;
    let sort = validate_sort(sort)?;
    Ok((query, sort, projection))
}

pub fn validate_query_limit_projection(
    query: &Bson,
    limit: i64,
    projection: &Bson,
) -> Result<(Document, i64, Document)> {
    let query = validate_query(query)?;
    let projection = validate_projection(projection)?;
    let limit = validate_limit(limit)?;
    Ok((query, limit, projection))
}

pub fn validate_query_data(query: &Bson, data: &Bson) -> Result<(Document, Document)> {
    Ok((validate_query(query)?, validate_data(data)?))
}

pub fn validate_collection_name_db_name(
    collection: &str,
    db: &str,
) -> Result<(ValidatedCollectionName, String)> {
    Ok((validate_collection_name(collection)?, validate_db_name(db)?))
}

/// Parameters of a `$lookup` left join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftJoin {
    pub from: String,
    pub to: String,
    pub local_field: String,
    pub foreign_field: String,
    pub alias: String,
}

impl Default for LeftJoin {
    fn default() -> Self {
        Self {
            from: "users".to_string(),
            to: "contacts".to_string(),
            local_field: "_id".to_string(),
            foreign_field: "user_id".to_string(),
            alias: "usersContacts".to_string(),
        }
    }
}

impl LeftJoin {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn on(mut self, local_field: impl Into<String>, foreign_field: impl Into<String>) -> Self {
        self.local_field = local_field.into();
        self.foreign_field = foreign_field.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Single-stage aggregation pipeline run against `from`
    pub fn pipeline(&self) -> Vec<Document> {
        vec![bson::doc! {
            "$lookup": {
                "from": &self.to,
                "localField": &self.local_field,
                "foreignField": &self.foreign_field,
                "as": &self.alias,
            }
        }]
    }
}

pub fn validate_left_join_items(join: &LeftJoin) -> Result<LeftJoin> {
    validate_collection_name(&join.from)?;
    validate_collection_name(&join.to)?;
    validate_field_name(&join.local_field)?;
    validate_field_name(&join.foreign_field)?;
    validate_field_name(&join.alias)?;
    Ok(join.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn message(err: ModelError) -> String {
        err.signal().error
    }

    #[test]
    fn test_query_accepts_document_and_null() {
        assert_eq!(validate_query(&Bson::Null).unwrap(), Document::new());
        let q = doc! { "status": "active" };
        assert_eq!(validate_query(&Bson::Document(q.clone())).unwrap(), q);
    }

    #[test]
    fn test_non_object_queries_rejected() {
        let inputs = vec![
            Bson::String("name".into()),
            Bson::Int32(1),
            Bson::Int64(7),
            Bson::Double(1.5),
            Bson::Boolean(true),
            Bson::Array(vec![]),
            Bson::ObjectId(ObjectId::new()),
        ];
        for input in inputs {
            let err = validate_query(&input).unwrap_err();
            assert_eq!(message(err), "input query must be an object");
        }
    }

    #[test]
    fn test_javascript_operators_rejected() {
        let err = validate_query(&bson::bson!({ "$where": "this.a > 1" })).unwrap_err();
        assert_eq!(message(err), "operator '$where' is not allowed in queries");

        let nested = bson::bson!({ "$or": [{ "a": 1 }, { "$function": { "body": "" } }] });
        assert!(validate_query(&nested).is_err());

        let fine = bson::bson!({ "$or": [{ "a": 1 }, { "b": { "$gt": 2 } }] });
        assert!(validate_query(&fine).is_ok());
    }

    #[test]
    fn test_projection_and_sort_messages() {
        let err = validate_projection(&Bson::Int32(1)).unwrap_err();
        assert_eq!(message(err), "input projection must be an object");
        let err = validate_sort(&Bson::String("asc".into())).unwrap_err();
        assert_eq!(message(err), "input sort must be an object");
    }

    #[test]
    fn test_data_array() {
        let docs = validate_data_array(&bson::bson!([{ "a": 1 }, { "a": 2 }])).unwrap();
        assert_eq!(docs.len(), 2);

        let err = validate_data_array(&bson::bson!({ "a": 1 })).unwrap_err();
        assert_eq!(message(err), "input data must be an array of objects");

        let err = validate_data_array(&bson::bson!([{ "a": 1 }, 5])).unwrap_err();
        assert_eq!(message(err), "each element of input data must be an object");
    }

    #[test]
    fn test_update_data_variants() {
        assert_eq!(
            validate_update_data(&bson::bson!({ "a": 1 })).unwrap(),
            UpdateData::Fields(doc! { "a": 1 })
        );
        assert_eq!(
            validate_update_data(&bson::bson!([{ "$set": { "a": 1 } }])).unwrap(),
            UpdateData::Pipeline(vec![doc! { "$set": { "a": 1 } }])
        );
        let err = validate_update_data(&Bson::String("x".into())).unwrap_err();
        assert_eq!(message(err), "input data must be an array or an object");
        let err = validate_update_data(&bson::bson!([1])).unwrap_err();
        assert_eq!(message(err), "each element of input data must be an object");
    }

    #[test]
    fn test_limit() {
        assert_eq!(validate_limit(0).unwrap(), 0);
        assert_eq!(validate_limit(10).unwrap(), 10);
        assert!(validate_limit(-1).is_err());
    }

    #[test]
    fn test_valid_collection_names() {
        for name in ["users", "user_profiles", "Users123", "articles.archive"] {
            assert!(ValidatedCollectionName::new(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_collection_names() {
        assert!(ValidatedCollectionName::new("").is_err());
        assert!(ValidatedCollectionName::new(&"a".repeat(121)).is_err());
        assert!(ValidatedCollectionName::new("bad\0name").is_err());
        assert!(ValidatedCollectionName::new("system.users").is_err());
        assert!(ValidatedCollectionName::new("price$").is_err());
    }

    #[test]
    fn test_validated_collection_name_display() {
        let name = ValidatedCollectionName::new("widgets").unwrap();
        assert_eq!(name.to_string(), "widgets");
        assert_eq!(name.as_str(), "widgets");
        assert_eq!(name.into_string(), "widgets".to_string());
    }

    #[test]
    fn test_db_names() {
        assert!(validate_db_name("OnGo").is_ok());
        assert!(validate_db_name("").is_err());
        assert!(validate_db_name("my.db").is_err());
        assert!(validate_db_name("my db").is_err());
        assert!(validate_db_name(&"d".repeat(65)).is_err());
    }

    #[test]
    fn test_field_names() {
        assert!(validate_field_name("user_id").is_ok());
        assert!(validate_field_name("_id").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("$where").is_err());
    }

    #[test]
    fn test_ids() {
        let oid = ObjectId::new();
        assert_eq!(validate_id(&oid.to_hex()).unwrap(), oid);

        for bad in ["", "123", "zzzzzzzzzzzzzzzzzzzzzzzz", "000000000000000000000000"] {
            let err = validate_id(bad).unwrap_err();
            assert_eq!(message(err), "input document id is invalid");
        }
    }

    #[test]
    fn test_email() {
        assert!(validate_email("jane.doe@example.com").is_ok());
        assert!(validate_email("Jane.Doe@Example.COM").is_ok());
        assert_eq!(
            message(validate_email("").unwrap_err()),
            "input email must be a non-empty string"
        );
        assert_eq!(
            message(validate_email("not-an-email").unwrap_err()),
            "input email must be a valid email address"
        );
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_scalar_identifiers() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_phone("+1 555 0100").is_ok());
        assert!(validate_token("abc123").is_ok());
        assert_eq!(
            message(validate_username("  ").unwrap_err()),
            "input username must be a non-empty string"
        );
        assert_eq!(
            message(validate_last_name("").unwrap_err()),
            "input last name must be a non-empty string"
        );
    }

    #[test]
    fn test_compound_stops_at_first_failure() {
        let err = validate_query_projection_sort(
            &Bson::Int32(1),
            &Bson::Int32(2),
            &Bson::Int32(3),
        )
        .unwrap_err();
        assert_eq!(message(err), "input query must be an object");

        let err = validate_query_limit_projection(&Bson::Null, -5, &Bson::Null).unwrap_err();
        assert_eq!(message(err), "input limit must be a non-negative integer");

        let err = validate_query_data(&Bson::Null, &Bson::Boolean(false)).unwrap_err();
        assert_eq!(message(err), "input data must be an object");
    }

    #[test]
    fn test_collection_name_db_name() {
        let (coll, db) = validate_collection_name_db_name("widgets", "shop").unwrap();
        assert_eq!(coll.as_str(), "widgets");
        assert_eq!(db, "shop");
        assert!(validate_collection_name_db_name("widgets", "").is_err());
    }

    #[test]
    fn test_left_join_defaults_and_pipeline() {
        let join = LeftJoin::default();
        assert!(validate_left_join_items(&join).is_ok());
        assert_eq!(
            join.pipeline(),
            vec![doc! {
                "$lookup": {
                    "from": "contacts",
                    "localField": "_id",
                    "foreignField": "user_id",
                    "as": "usersContacts",
                }
            }]
        );
    }

    #[test]
    fn test_left_join_rejects_bad_items() {
        let join = LeftJoin::new("users", "").alias("x");
        assert!(validate_left_join_items(&join).is_err());
        let join = LeftJoin::new("users", "orders").on("$id", "user_id");
        assert!(validate_left_join_items(&join).is_err());
    }
}
