//! Find query description passed to the driver

use bson::Document as BsonDocument;

/// Filter, projection, sort and limit of a single find call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    filter: BsonDocument,
    projection: Option<BsonDocument>,
    sort: Option<BsonDocument>,
    limit: Option<i64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    /// Set the projection; an empty document means "all fields"
    pub fn projection(mut self, projection: BsonDocument) -> Self {
        self.projection = (!projection.is_empty()).then_some(projection);
        self
    }

    /// Set the sort order; an empty document means natural order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = (!sort.is_empty()).then_some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    pub fn get_projection(&self) -> Option<&BsonDocument> {
        self.projection.as_ref()
    }

    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }
}
