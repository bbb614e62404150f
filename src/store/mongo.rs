//! MongoDB-backed resource store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use tracing::debug;

use crate::db::{MongoClient, MongoCollection};
use crate::resource::{
    sort_document, Page, PageRequest, Record, Resource, ResourceFilter, ID_FIELD,
    UPDATED_AT_FIELD,
};
use crate::store::ResourceStore;
use crate::types::Result;

pub struct MongoStore<R> {
    collection: MongoCollection,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> MongoStore<R> {
    /// Open the entity's collection and apply its indexes
    pub async fn open(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<R>(R::COLLECTION).await?;
        Ok(Self {
            collection,
            _resource: PhantomData,
        })
    }
}

fn id_filter(id: &ObjectId) -> Document {
    doc! { ID_FIELD: *id }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MongoStore<R> {
    async fn create(&self, body: R) -> Result<Record<R>> {
        let record = Record::new(body);
        self.collection.insert_one(record.to_document()?).await?;
        debug!(collection = self.collection.name(), id = %record.id, "Inserted record");
        Ok(record)
    }

    async fn find_page(&self, filter: &R::Filter, page: PageRequest) -> Result<Page<R>> {
        let filter = filter.to_document();
        let total = self.collection.count(filter.clone()).await?;

        let documents = self
            .collection
            .find_page(filter, sort_document(R::sort_keys()), page.offset, page.limit)
            .await?;

        let items = documents
            .into_iter()
            .map(Record::from_document)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Record<R>>> {
        self.collection
            .find_one(id_filter(id))
            .await?
            .map(Record::from_document)
            .transpose()
    }

    async fn update(&self, id: &ObjectId, body: &R, updated_at: DateTime<Utc>) -> Result<bool> {
        let mut fields = bson::to_document(body)?;
        fields.insert(UPDATED_AT_FIELD, bson::DateTime::from_chrono(updated_at));

        let result = self
            .collection
            .update_one(id_filter(id), doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(id_filter(id)).await?;
        Ok(result.deleted_count > 0)
    }
}
