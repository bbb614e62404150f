//! Generic CRUD service
//!
//! Validation, identifier parsing and not-found handling for one entity,
//! on top of whichever [`ResourceStore`] backs it.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{ActionStatus, PriorityAction};
use crate::resource::validation::parse_closed;
use crate::resource::{next_update_stamp, not_found, parse_id, Page, PageRequest, Record, Resource};
use crate::store::{MemoryStore, ResourceStore};
use crate::types::Result;

pub struct ResourceService<R: Resource> {
    store: Arc<dyn ResourceStore<R>>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: Arc<dyn ResourceStore<R>>) -> Self {
        Self { store }
    }

    /// Service over a fresh in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::<R>::new()))
    }

    pub async fn create(&self, body: R) -> Result<Record<R>> {
        body.validate()?;
        let record = self.store.create(body).await?;
        info!(resource = R::PATH, id = %record.id, "Created {}", R::LABEL);
        Ok(record)
    }

    pub async fn get_all(&self, filter: &R::Filter, page: PageRequest) -> Result<Page<R>> {
        let result = self.store.find_page(filter, page).await?;
        debug!(
            resource = R::PATH,
            returned = result.items.len(),
            total = result.total,
            "Listed {}",
            R::PLURAL
        );
        Ok(result)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Record<R>> {
        let id = parse_id::<R>(id)?;
        self.store.find_by_id(&id).await?.ok_or_else(not_found::<R>)
    }

    /// Replace every mutable field; identity and `created_at` are kept
    pub async fn update(&self, id: &str, body: R) -> Result<Record<R>> {
        let id = parse_id::<R>(id)?;
        body.validate()?;

        let existing = self
            .store
            .find_by_id(&id)
            .await?
            .ok_or_else(not_found::<R>)?;

        let updated_at = next_update_stamp(existing.updated_at);
        // Deleted between the check and the write
        if !self.store.update(&id, &body, updated_at).await? {
            return Err(not_found::<R>());
        }

        info!(resource = R::PATH, %id, "Updated {}", R::LABEL);
        self.store.find_by_id(&id).await?.ok_or_else(not_found::<R>)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id::<R>(id)?;

        if self.store.find_by_id(&id).await?.is_none() {
            return Err(not_found::<R>());
        }
        if !self.store.delete(&id).await? {
            return Err(not_found::<R>());
        }

        info!(resource = R::PATH, %id, "Deleted {}", R::LABEL);
        Ok(())
    }
}

impl ResourceService<PriorityAction> {
    /// Change only the workflow status of an action
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Record<PriorityAction>> {
        let status: ActionStatus = parse_closed("status", status, ActionStatus::NAMES)?;
        let existing = self.get_by_id(id).await?;

        let mut body = existing.body;
        body.status = status;
        self.update(id, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priority_action::tests::sample;
    use crate::models::{ActiveFilter, ClusterTrend, ConversationCluster};
    use crate::types::ApiError;

    fn is_not_found(err: &ApiError) -> bool {
        matches!(err, ApiError::NotFound(_))
    }

    fn cluster(theme: &str, is_active: bool) -> ConversationCluster {
        ConversationCluster {
            theme: theme.to_string(),
            size: 10,
            sentiment: 0.4,
            trend: ClusterTrend::Up,
            keywords: vec!["a".to_string()],
            is_active,
            order: 0,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let record = service.create(cluster("Pricing", true)).await.unwrap();

        assert_eq!(record.id.to_hex().len(), 24);
        assert_eq!(record.created_at, record.updated_at);

        let fetched = service.get_by_id(&record.id.to_hex()).await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_body_without_persisting() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let err = service.create(cluster("x", true)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let page = service
            .get_all(&ActiveFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_advances_updated_at() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let record = service.create(cluster("Pricing", true)).await.unwrap();
        let id = record.id.to_hex();

        let first = service.update(&id, cluster("Pricing v2", true)).await.unwrap();
        let second = service.update(&id, cluster("Pricing v3", false)).await.unwrap();

        assert_eq!(first.id, record.id);
        assert_eq!(second.created_at, record.created_at);
        assert!(first.updated_at > record.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.body.theme, "Pricing v3");
        assert!(!second.body.is_active);
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_record_unchanged() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let record = service.create(cluster("Pricing", true)).await.unwrap();
        let id = record.id.to_hex();

        let mut invalid = cluster("x", false);
        invalid.size = -4;
        let err = service.update(&id, invalid).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let fetched = service.get_by_id(&id).await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_update_missing_or_malformed_id_is_not_found() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let missing = bson::oid::ObjectId::new().to_hex();

        let err = service.update(&missing, cluster("Valid", true)).await.unwrap_err();
        assert!(is_not_found(&err));

        let err = service.update("zzz", cluster("Valid", true)).await.unwrap_err();
        assert!(is_not_found(&err));
        assert_eq!(err.to_string(), "Conversation cluster not found");
    }

    #[tokio::test]
    async fn test_active_filter_and_total() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        service.create(cluster("one", true)).await.unwrap();
        service.create(cluster("two", true)).await.unwrap();
        service.create(cluster("three", false)).await.unwrap();

        let filter = ActiveFilter {
            is_active: Some(true),
        };
        let page = service
            .get_all(&filter, PageRequest { limit: 1, offset: 0 })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].body.is_active);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = ResourceService::<ConversationCluster>::in_memory();
        let record = service.create(cluster("Gone soon", true)).await.unwrap();
        let id = record.id.to_hex();

        tokio_test::assert_ok!(service.delete(&id).await);
        let err = tokio_test::assert_err!(service.get_by_id(&id).await);
        assert!(is_not_found(&err));
        let err = tokio_test::assert_err!(service.delete(&id).await);
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_update_status() {
        let service = ResourceService::<PriorityAction>::in_memory();
        let record = service.create(sample()).await.unwrap();
        let id = record.id.to_hex();

        let updated = service.update_status(&id, "completed").await.unwrap();
        assert_eq!(updated.body.status, ActionStatus::Completed);
        assert_eq!(updated.body.title, record.body.title);
        assert!(updated.updated_at > record.updated_at);

        let err = service.update_status(&id, "done").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let fetched = service.get_by_id(&id).await.unwrap();
        assert_eq!(fetched.body.status, ActionStatus::Completed);
    }
}
