use super::Document;
use crate::config::ModelOptions;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog article stored in `OnGo.articles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            author: None,
            // millisecond precision, as stored
            created_at: bson::DateTime::now().to_chrono(),
        }
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

impl Document for Article {
    fn collection_name() -> &'static str {
        "articles"
    }

    fn model_options() -> ModelOptions {
        ModelOptions::new()
            .collection(Self::collection_name())
            .url("mongodb://localhost:27017")
            .db("OnGo")
    }

    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;

    #[test]
    fn test_article_defaults() {
        let config = ModelConfig::resolve_with(Article::model_options(), |_| None);
        assert_eq!(config.collection(), "articles");
        assert_eq!(config.database(), "OnGo");
        assert_eq!(config.resolved_uri(), "mongodb://localhost:27017/OnGo");
    }

    #[test]
    fn test_article_bson_without_id() {
        let article = Article::new("Hello", "First post").by("ada");
        let doc = article.to_bson().unwrap();
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("title").unwrap(), "Hello");
        assert_eq!(doc.get_str("author").unwrap(), "ada");
        assert!(matches!(doc.get("created_at"), Some(bson::Bson::DateTime(_))));

        let back = Article::from_bson(doc).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_set_id() {
        let mut article = Article::new("Hello", "");
        let id = ObjectId::new();
        article.set_id(id);
        assert_eq!(article.get_id(), Some(id));
    }
}
