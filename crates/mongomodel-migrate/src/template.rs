//! `$jsonSchema` template for new schema files

use crate::schema::SchemaType;
use serde_json::{json, Value};

fn title_case(collection: &str) -> String {
    let mut chars = collection.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validation document for `collection`, with the timestamp fields every
/// collection starts with
pub fn render(collection: &str, bson_type: SchemaType) -> Value {
    json!({
        "validator": {
            "$jsonSchema": {
                "bsonType": bson_type.as_str(),
                "title": format!("{} Object Validation", title_case(collection)),
                "required": [],
                "properties": {
                    "name": {
                        "bsonType": "string",
                        "description": "'name' must be a string and is required"
                    },
                    "created_at": {
                        "bsonType": "date",
                        "description": "'created_at' must be a date"
                    },
                    "updated_at": {
                        "bsonType": "date",
                        "description": "'updated_at' must be a date"
                    }
                }
            }
        }
    })
}

pub fn render_pretty(collection: &str, bson_type: SchemaType) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(&render(collection, bson_type))?;
    out.push('\n');
    Ok(out)
}
