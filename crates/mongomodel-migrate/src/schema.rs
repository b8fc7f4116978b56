//! Schema names and BSON types

use mongomodel_common::{ModelError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// `bsonType` of the generated top-level schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaType {
    Double,
    String,
    #[default]
    Object,
    Array,
    ObjectId,
    Date,
    Bool,
    Null,
    Regex,
    Int,
    Timestamp,
    Long,
    Decimal,
    Uuid,
    BindData,
    Mixed,
}

impl SchemaType {
    pub const ALL: [SchemaType; 16] = [
        SchemaType::Double,
        SchemaType::String,
        SchemaType::Object,
        SchemaType::Array,
        SchemaType::ObjectId,
        SchemaType::Date,
        SchemaType::Bool,
        SchemaType::Null,
        SchemaType::Regex,
        SchemaType::Int,
        SchemaType::Timestamp,
        SchemaType::Long,
        SchemaType::Decimal,
        SchemaType::Uuid,
        SchemaType::BindData,
        SchemaType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Double => "double",
            SchemaType::String => "string",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::ObjectId => "objectId",
            SchemaType::Date => "date",
            SchemaType::Bool => "bool",
            SchemaType::Null => "null",
            SchemaType::Regex => "regex",
            SchemaType::Int => "int",
            SchemaType::Timestamp => "timestamp",
            SchemaType::Long => "long",
            SchemaType::Decimal => "decimal",
            SchemaType::Uuid => "uuid",
            SchemaType::BindData => "bindData",
            SchemaType::Mixed => "mixed",
        }
    }

    /// Parse `name` or `--type=name`; anything unknown falls back to `object`
    pub fn from_arg(arg: &str) -> Self {
        let arg = arg.trim();
        arg.strip_prefix("--type=")
            .unwrap_or(arg)
            .parse()
            .unwrap_or_default()
    }
}

impl FromStr for SchemaType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        SchemaType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::validation(format!("unknown schema type '{}'", s)))
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection a schema name maps to: `User` → `users`, `news` → `news`
pub fn collection_name(name: &str) -> String {
    if name.ends_with('s') {
        name.to_lowercase()
    } else {
        format!("{}s", name).to_lowercase()
    }
}

/// A schema name such as `admin/User`, split into its directory and
/// capitalized file stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaName {
    dirs: Vec<String>,
    name: String,
}

impl SchemaName {
    /// Accepts `Name`, `dir/Name` and `--schema=dir/Name`
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("--schema=").unwrap_or(raw);

        let mut parts: Vec<&str> = raw.split('/').filter(|p| !p.is_empty()).collect();
        let Some(last) = parts.pop() else {
            return Err(ModelError::validation("schema name must be a non-empty string"));
        };
        if parts.iter().chain(std::iter::once(&last)).any(|p| *p == "." || *p == "..") {
            return Err(ModelError::validation(format!(
                "schema name cannot contain relative path segments: '{}'",
                raw
            )));
        }

        let last = last.strip_suffix(".json").unwrap_or(last);
        let mut chars = last.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return Err(ModelError::validation("schema name must be a non-empty string")),
        };

        Ok(Self {
            dirs: parts.into_iter().map(str::to_string).collect(),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> String {
        collection_name(&self.name)
    }

    /// `dir/Name.json`, relative to a schema root
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.dirs.iter().collect();
        path.push(format!("{}.json", self.name));
        path
    }
}
