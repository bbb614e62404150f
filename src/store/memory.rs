//! In-process resource store
//!
//! Mirrors the MongoDB semantics closely enough for development runs and
//! tests: equality filters on the encoded document, the entity's sort keys,
//! then skip/limit. Ties fall back to identifier order.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::resource::{
    Page, PageRequest, Record, Resource, ResourceFilter, SortDirection, CREATED_AT_FIELD,
    UPDATED_AT_FIELD,
};
use crate::store::ResourceStore;
use crate::types::Result;

pub struct MemoryStore<R> {
    records: RwLock<HashMap<ObjectId, Record<R>>>,
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Record encoded once for filtering and sorting
struct Indexed<R> {
    document: Document,
    record: Record<R>,
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn sort_value<'a, R>(entry: &'a Indexed<R>, field: &str) -> SortValue<'a> {
    match field {
        CREATED_AT_FIELD => SortValue::Time(entry.record.created_at),
        UPDATED_AT_FIELD => SortValue::Time(entry.record.updated_at),
        _ => match entry.document.get(field) {
            Some(Bson::Int32(v)) => SortValue::Number(f64::from(*v)),
            Some(Bson::Int64(v)) => SortValue::Number(*v as f64),
            Some(Bson::Double(v)) => SortValue::Number(*v),
            Some(Bson::String(v)) => SortValue::Text(v),
            Some(Bson::Boolean(v)) => SortValue::Number(if *v { 1.0 } else { 0.0 }),
            _ => SortValue::Missing,
        },
    }
}

/// Comparable projection of a field; missing values sort first, as in MongoDB
#[derive(PartialEq, PartialOrd)]
enum SortValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
    Time(DateTime<Utc>),
}

fn compare<R: Resource>(a: &Indexed<R>, b: &Indexed<R>) -> Ordering {
    for key in R::sort_keys() {
        let ordering = sort_value(a, key.field)
            .partial_cmp(&sort_value(b, key.field))
            .unwrap_or(Ordering::Equal);
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.record.id.cmp(&b.record.id)
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn create(&self, body: R) -> Result<Record<R>> {
        let record = Record::new(body);
        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_page(&self, filter: &R::Filter, page: PageRequest) -> Result<Page<R>> {
        let filter = filter.to_document();
        let records = self.records.read().await;

        let mut matching = Vec::new();
        for record in records.values() {
            let document = bson::to_document(&record.body)?;
            if matches(&document, &filter) {
                matching.push(Indexed {
                    document,
                    record: record.clone(),
                });
            }
        }
        drop(records);

        matching.sort_by(compare::<R>);

        let total = matching.len() as u64;
        let skip = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit.max(0)).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|entry| entry.record)
            .collect();

        Ok(Page { items, total })
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Record<R>>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update(&self, id: &ObjectId, body: &R, updated_at: DateTime<Utc>) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) => {
                record.body = body.clone();
                record.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.records.write().await.remove(id).is_some())
    }
}
