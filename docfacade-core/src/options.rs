//! Driver-agnostic options accepted by the CRUD operations.
//!
//! Each backend translates these into its own option types.

use bson::Document;


/// Options for multi-document queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    /// Sort specification, e.g. `{ "age": -1 }`.
    pub sort: Option<Document>,
    /// Inclusion projection, e.g. `{ "name": 1 }`.
    pub projection: Option<Document>,
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.options.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.options.projection = Some(projection);
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOneOptions {
    pub bypass_document_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyOptions {
    pub ordered: Option<bool>,
    pub bypass_document_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Insert a document when nothing matches the filter.
    pub upsert: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceOptions {
    pub upsert: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    /// Index key pattern the server should use.
    pub hint: Option<Document>,
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let options = FindOptions::builder()
            .limit(5)
            .skip(10)
            .sort(doc! { "age": -1 })
            .projection(doc! { "name": 1 })
            .build();

        assert_eq!(options.limit, Some(5));
        assert_eq!(options.skip, Some(10));
        assert_eq!(options.sort, Some(doc! { "age": -1 }));
        assert_eq!(options.projection, Some(doc! { "name": 1 }));
    }
}
