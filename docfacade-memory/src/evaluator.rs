//! Filter, update and projection evaluation for in-memory documents.
//!
//! Supports the subset of MongoDB query syntax the in-memory driver needs:
//! implicit equality, dotted paths, `$eq $ne $gt $gte $lt $lte $in $nin $exists`,
//! and the logical `$and $or $nor`. Updates support `$set $unset $inc`.

use std::{collections::HashMap, cmp::Ordering};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docfacade_core::error::{FacadeError, FacadeResult};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so `1` and `1.0` compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Binary, Decimal128, Regex, Timestamp and the other types without an
    /// ordering; these only support exact BSON equality.
    Opaque(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Opaque(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Opaque(a), Comparable::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path (`address.city`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;

    for part in parts {
        current = current.as_document()?.get(part)?;
    }

    Some(current)
}

/// Whether `value` is an operator document such as `{ "$gt": 3 }`.
fn is_operator_document(value: &Bson) -> bool {
    value
        .as_document()
        .and_then(|doc| doc.keys().next())
        .is_some_and(|key| key.starts_with('$'))
}

fn unsupported(operator: &str) -> FacadeError {
    FacadeError::Driver(format!("unsupported operator {}", operator))
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Evaluates a filter document against this document.
    pub fn matches(&self, filter: &Document) -> FacadeResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(condition)?,
                "$or" => self.any(condition)?,
                "$nor" => !self.any(condition)?,
                key if key.starts_with('$') => return Err(unsupported(key)),
                path => self.matches_field(path, condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn clauses<'c>(condition: &'c Bson) -> FacadeResult<Vec<&'c Document>> {
        condition
            .as_array()
            .ok_or_else(|| FacadeError::Driver("logical operators expect an array".into()))?
            .iter()
            .map(|clause| {
                clause
                    .as_document()
                    .ok_or_else(|| FacadeError::Driver("logical clauses must be documents".into()))
            })
            .collect()
    }

    fn all(&self, condition: &Bson) -> FacadeResult<bool> {
        for clause in Self::clauses(condition)? {
            if !self.matches(clause)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn any(&self, condition: &Bson) -> FacadeResult<bool> {
        for clause in Self::clauses(condition)? {
            if self.matches(clause)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn matches_field(&self, path: &str, condition: &Bson) -> FacadeResult<bool> {
        let value = lookup(self.document, path);

        let operators = match condition.as_document() {
            Some(operators) if is_operator_document(condition) => operators,
            _ => return Ok(Self::equals(value, condition)),
        };

        for (operator, operand) in operators {
            let matched = match operator.as_str() {
                "$eq" => Self::equals(value, operand),
                "$ne" => !Self::equals(value, operand),
                "$gt" => Self::compare(value, operand, |o| o == Ordering::Greater),
                "$gte" => Self::compare(value, operand, |o| o != Ordering::Less),
                "$lt" => Self::compare(value, operand, |o| o == Ordering::Less),
                "$lte" => Self::compare(value, operand, |o| o != Ordering::Greater),
                "$in" => Self::candidates(operand)?
                    .iter()
                    .any(|candidate| Self::equals(value, candidate)),
                "$nin" => !Self::candidates(operand)?
                    .iter()
                    .any(|candidate| Self::equals(value, candidate)),
                "$exists" => value.is_some() == Self::truthy(operand),
                other => return Err(unsupported(other)),
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Equality with array semantics: an array field matches if it equals the
    /// operand or contains it. A missing field equals `null`.
    fn equals(value: Option<&Bson>, operand: &Bson) -> bool {
        let expected = Comparable::from(operand);

        match value {
            None => expected == Comparable::Null,
            Some(value) => match Comparable::from(value) {
                Comparable::Array(items) => {
                    items.iter().any(|item| item == &expected) || Comparable::Array(items) == expected
                }
                actual => actual == expected,
            },
        }
    }

    fn compare(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
        let expected = Comparable::from(operand);

        match value.map(Comparable::from) {
            Some(Comparable::Array(items)) => items
                .iter()
                .any(|item| item.partial_cmp(&expected).is_some_and(&accept)),
            Some(actual) => actual.partial_cmp(&expected).is_some_and(accept),
            None => false,
        }
    }

    fn candidates(operand: &Bson) -> FacadeResult<&Vec<Bson>> {
        operand
            .as_array()
            .ok_or_else(|| FacadeError::Driver("$in/$nin expect an array".into()))
    }

    fn truthy(operand: &Bson) -> bool {
        match operand {
            Bson::Boolean(value) => *value,
            Bson::Int32(value) => *value != 0,
            Bson::Int64(value) => *value != 0,
            Bson::Double(value) => *value != 0.0,
            Bson::Null => false,
            _ => true,
        }
    }
}

/// Applies an update document made of `$set`, `$unset` and `$inc` stages.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> FacadeResult<()> {
    if update.is_empty() || update.keys().any(|key| !key.starts_with('$')) {
        return Err(FacadeError::Driver("update document requires atomic operators".into()));
    }

    for (operator, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| FacadeError::Driver(format!("{} expects a document", operator)))?;

        for (path, value) in fields {
            if path == "_id" {
                return Err(FacadeError::Driver("the _id field is immutable".into()));
            }

            match operator.as_str() {
                "$set" => set_path(document, path, value.clone())?,
                "$unset" => unset_path(document, path),
                "$inc" => {
                    let incremented = increment(lookup(document, path), value)?;
                    set_path(document, path, incremented)?;
                }
                other => return Err(unsupported(other)),
            }
        }
    }

    Ok(())
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> FacadeResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            if !document.contains_key(head) {
                document.insert(head, Document::new());
            }

            match document.get_mut(head) {
                Some(Bson::Document(child)) => set_path(child, rest, value),
                _ => Err(FacadeError::Driver(format!("cannot create field {} in a non-document", path))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                unset_path(child, rest);
            }
        }
    }
}

fn increment(current: Option<&Bson>, by: &Bson) -> FacadeResult<Bson> {
    let not_numeric = || FacadeError::Driver("$inc requires numeric values".into());
    let overflow = || FacadeError::Driver("$inc would overflow".into());

    Ok(match (current.unwrap_or(&Bson::Int32(0)), by) {
        (Bson::Int32(a), Bson::Int32(b)) => Bson::Int32(a.checked_add(*b).ok_or_else(overflow)?),
        (Bson::Int64(a), Bson::Int32(b)) => Bson::Int64(a.checked_add(*b as i64).ok_or_else(overflow)?),
        (Bson::Int32(a), Bson::Int64(b)) => Bson::Int64((*a as i64).checked_add(*b).ok_or_else(overflow)?),
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?),
        (a, b) => {
            let a = as_f64(a).ok_or_else(not_numeric)?;
            let b = as_f64(b).ok_or_else(not_numeric)?;
            Bson::Double(a + b)
        }
    })
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Builds the document an upsert starts from: the plain equality fields of the filter.
pub(crate) fn upsert_seed(filter: &Document) -> FacadeResult<Document> {
    let mut seed = Document::new();

    for (key, value) in filter {
        if key.starts_with('$') || is_operator_document(value) {
            continue;
        }
        set_path(&mut seed, key, value.clone())?;
    }

    Ok(seed)
}

/// Orders documents by the first key of a sort specification.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    let Some((field, direction)) = sort.iter().next() else {
        return;
    };
    let descending = as_f64(direction).is_some_and(|d| d < 0.0);

    documents.sort_by(|a, b| {
        let left = lookup(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = lookup(b, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);

        if descending { ordering.reverse() } else { ordering }
    });
}

/// Applies an inclusion or exclusion projection on top-level fields.
pub(crate) fn project(document: Document, projection: &Document) -> Document {
    let keep_id = projection
        .get("_id")
        .is_none_or(DocumentEvaluator::truthy);
    let inclusive = projection
        .iter()
        .any(|(key, value)| key != "_id" && DocumentEvaluator::truthy(value));

    document
        .into_iter()
        .filter(|(key, _)| {
            if key == "_id" {
                return keep_id;
            }
            match projection.get(key) {
                Some(value) => inclusive && DocumentEvaluator::truthy(value),
                None => !inclusive,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bson::{Binary, doc, spec::BinarySubtype};
    use super::*;

    fn matches(document: &Document, filter: Document) -> bool {
        DocumentEvaluator::new(document).matches(&filter).unwrap()
    }

    #[test]
    fn implicit_equality_and_dotted_paths() {
        let document = doc! { "name": "Alice", "address": { "city": "Oslo" }, "tags": ["a", "b"] };

        assert!(matches(&document, doc! { "name": "Alice" }));
        assert!(matches(&document, doc! { "address.city": "Oslo" }));
        assert!(matches(&document, doc! { "tags": "b" }));
        assert!(!matches(&document, doc! { "name": "Bob" }));
        assert!(matches(&document, doc! {}));
    }

    #[test]
    fn comparison_operators_normalize_numbers() {
        let document = doc! { "age": 30_i64 };

        assert!(matches(&document, doc! { "age": 30.0 }));
        assert!(matches(&document, doc! { "age": { "$gte": 30, "$lt": 31 } }));
        assert!(!matches(&document, doc! { "age": { "$gt": 30 } }));
        assert!(matches(&document, doc! { "age": { "$in": [10, 30] } }));
        assert!(matches(&document, doc! { "age": { "$nin": [10, 20] } }));
        assert!(matches(&document, doc! { "nickname": { "$exists": false } }));
    }

    #[test]
    fn logical_operators() {
        let document = doc! { "a": 1, "b": 2 };

        assert!(matches(&document, doc! { "$or": [{ "a": 5 }, { "b": 2 }] }));
        assert!(!matches(&document, doc! { "$and": [{ "a": 1 }, { "b": 3 }] }));
        assert!(matches(&document, doc! { "$nor": [{ "a": 5 }] }));
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let document = doc! { "a": 1 };

        assert!(DocumentEvaluator::new(&document).matches(&doc! { "a": { "$regex": "x" } }).is_err());
    }

    #[test]
    fn update_operators() {
        let mut document = doc! { "name": "Alice", "visits": 1, "temp": true };

        apply_update(
            &mut document,
            &doc! { "$set": { "address.city": "Oslo" }, "$inc": { "visits": 2 }, "$unset": { "temp": "" } },
        )
        .unwrap();

        assert_eq!(document, doc! { "name": "Alice", "visits": 3, "address": { "city": "Oslo" } });
    }

    #[test]
    fn binary_values_match_only_themselves() {
        let first = doc! { "_id": 1, "key": Binary { subtype: BinarySubtype::Generic, bytes: vec![1] } };
        let wanted = Bson::Binary(Binary { subtype: BinarySubtype::Generic, bytes: vec![2] });

        assert!(!matches(&first, doc! { "key": wanted.clone() }));
        assert!(!matches(&first, doc! { "other": wanted.clone() }));
        assert!(!matches(&first, doc! { "key": { "$in": [wanted.clone()] } }));
        assert!(matches(&first, doc! { "key": { "$ne": wanted } }));
        assert!(matches(&first, doc! { "key": Binary { subtype: BinarySubtype::Generic, bytes: vec![1] } }));
    }

    #[test]
    fn increment_overflow_is_an_error() {
        let mut document = doc! { "n": i32::MAX, "big": i64::MAX };

        assert!(apply_update(&mut document, &doc! { "$inc": { "n": 1 } }).is_err());
        assert!(apply_update(&mut document, &doc! { "$inc": { "big": 1 } }).is_err());
        assert_eq!(document, doc! { "n": i32::MAX, "big": i64::MAX });
    }

    #[test]
    fn update_rejects_plain_documents_and_id_changes() {
        let mut document = doc! { "_id": 1, "name": "Alice" };

        assert!(apply_update(&mut document, &doc! { "name": "Bob" }).is_err());
        assert!(apply_update(&mut document, &doc! { "$set": { "_id": 2 } }).is_err());
    }

    #[test]
    fn sorts_and_projects() {
        let mut documents = vec![doc! { "_id": 1, "n": 2 }, doc! { "_id": 2, "n": 9 }, doc! { "_id": 3, "n": 5 }];
        sort_documents(&mut documents, &doc! { "n": -1 });

        assert_eq!(documents.iter().map(|d| d.get_i32("n").unwrap()).collect::<Vec<_>>(), vec![9, 5, 2]);
        assert_eq!(project(documents[0].clone(), &doc! { "n": 1, "_id": 0 }), doc! { "n": 9 });
        assert_eq!(project(documents[0].clone(), &doc! { "n": 0 }), doc! { "_id": 2 });
    }

    #[test]
    fn upsert_seed_keeps_equality_fields_only() {
        let seed = upsert_seed(&doc! { "name": "Alice", "age": { "$gt": 3 }, "$or": [] }).unwrap();

        assert_eq!(seed, doc! { "name": "Alice" });
    }
}
