//! Generic CRUD resource contract
//!
//! Every dashboard entity implements [`Resource`]: its field set, validation
//! rules, list filter and sort key. Stores, services and HTTP handlers are
//! written once against this trait and instantiated per entity.

pub mod query;
pub mod validation;

use bson::{oid::ObjectId, Document};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use std::fmt::Debug;

use crate::db::mongo::IntoIndexes;
use crate::types::ApiError;

pub use query::QueryParams;
pub use validation::{FieldRules, ValidationErrors};

/// Stored identifier field
pub const ID_FIELD: &str = "_id";
/// Creation timestamp field
pub const CREATED_AT_FIELD: &str = "created_at";
/// Last update timestamp field
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// A dashboard entity managed through the generic CRUD pipeline.
///
/// The implementing type holds only the mutable fields; identity and
/// timestamps live in [`Record`].
pub trait Resource:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + Unpin + IntoIndexes + 'static
{
    /// Typed list filter accepted by `GET /{resource}`
    type Filter: ResourceFilter;

    /// MongoDB collection name
    const COLLECTION: &'static str;
    /// URL path segment under `/api/v1`
    const PATH: &'static str;
    /// Singular label used in messages ("Risk created successfully")
    const LABEL: &'static str;
    /// Plural noun used in failure messages ("Failed to fetch risks")
    const PLURAL: &'static str;

    /// Check every field rule, collecting all violations
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Ordering applied to list results, most significant key first
    fn sort_keys() -> &'static [SortKey];
}

/// Closed set of equality predicates for one entity's list endpoint
pub trait ResourceFilter: Debug + Default + Clone + Send + Sync {
    fn from_query(params: &QueryParams) -> Result<Self, ApiError>;

    /// Conjunction of `field == value` pairs; empty matches everything
    fn to_document(&self) -> Document;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// MongoDB sort specification for a list of keys
pub fn sort_document(keys: &[SortKey]) -> Document {
    let mut sort = Document::new();
    for key in keys {
        let dir = match key.direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        sort.insert(key.field, dir);
    }
    sort
}

/// Pagination window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;
    /// MongoDB takes `skip` as a signed 64-bit integer
    pub const MAX_OFFSET: u64 = i64::MAX as u64;
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of records plus the number of records matching the filter
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub items: Vec<Record<R>>,
    pub total: u64,
}

/// A persisted entity with identity and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct Record<R> {
    pub id: ObjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: R,
}

impl<R: Resource> Record<R> {
    /// Stamp a fresh identifier and equal creation/update timestamps
    pub fn new(body: R) -> Self {
        let now = now_millis();
        Self {
            id: ObjectId::new(),
            created_at: now,
            updated_at: now,
            body,
        }
    }

    /// Encode as a stored document
    pub fn to_document(&self) -> Result<Document, ApiError> {
        let mut document = Document::new();
        document.insert(ID_FIELD, self.id);
        for (key, value) in bson::to_document(&self.body)? {
            document.insert(key, value);
        }
        document.insert(CREATED_AT_FIELD, bson::DateTime::from_chrono(self.created_at));
        document.insert(UPDATED_AT_FIELD, bson::DateTime::from_chrono(self.updated_at));
        Ok(document)
    }

    /// Decode a stored document
    pub fn from_document(mut document: Document) -> Result<Self, ApiError> {
        let id = document.get_object_id(ID_FIELD)?;
        let created_at = document.get_datetime(CREATED_AT_FIELD)?.to_chrono();
        let updated_at = document.get_datetime(UPDATED_AT_FIELD)?.to_chrono();

        document.remove(ID_FIELD);
        document.remove(CREATED_AT_FIELD);
        document.remove(UPDATED_AT_FIELD);

        Ok(Self {
            id,
            created_at,
            updated_at,
            body: bson::from_document(document)?,
        })
    }
}

/// JSON view: `id` as hex, entity fields, RFC 3339 timestamps
#[derive(Serialize)]
struct RecordView<'a, R> {
    id: String,
    #[serde(flatten)]
    body: &'a R,
    created_at: String,
    updated_at: String,
}

impl<R: Serialize> Serialize for Record<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordView {
            id: self.id.to_hex(),
            body: &self.body,
            created_at: format_timestamp(&self.created_at),
            updated_at: format_timestamp(&self.updated_at),
        }
        .serialize(serializer)
    }
}

/// Current time at BSON date resolution
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Update timestamp that is always later than `previous`
pub fn next_update_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a path identifier; malformed ids are reported as not found
pub fn parse_id<R: Resource>(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| not_found::<R>())
}

pub fn not_found<R: Resource>() -> ApiError {
    ApiError::NotFound(format!("{} not found", R::LABEL))
}
