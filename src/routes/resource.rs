//! CRUD endpoints shared by every dashboard resource
//!
//! ## Endpoints (relative to `/api/v1/{resource}`)
//!
//! - `GET /` - List with filters, `limit` and `offset`
//! - `GET /{id}` - Fetch one record
//! - `POST /` - Create
//! - `PUT /{id}` - Replace all mutable fields
//! - `DELETE /{id}` - Delete permanently
//! - `PUT /{id}/status` - Change workflow status (priority actions only)

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::models::{PriorityAction, StatusChange};
use crate::resource::{parse_id, QueryParams, Resource, ResourceFilter};
use crate::routes::envelope::{error_response, json_response, Envelope};
use crate::services::ResourceService;
use crate::types::ApiError;

type FullBody = Full<Bytes>;
type HandlerResult = Result<Response<FullBody>, ApiError>;

/// Error type accepted from request bodies
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Largest request body accepted for create and update calls
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Position within a resource's URL space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Collection,
    Item(&'a str),
    Status(&'a str),
    Unknown,
}

impl<'a> Target<'a> {
    /// Classify the part of the path after `/api/v1/{resource}`
    pub fn parse(subpath: &'a str) -> Self {
        let trimmed = subpath.trim_matches('/');
        if trimmed.is_empty() {
            return Self::Collection;
        }

        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(id), None, _) => Self::Item(id),
            (Some(id), Some("status"), None) => Self::Status(id),
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Self::List | Self::Get => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Main handler for `/api/v1/{resource}/*`
pub async fn handle_resource_request<R, B>(
    req: Request<B>,
    service: &ResourceService<R>,
    subpath: &str,
) -> Response<FullBody>
where
    R: Resource,
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();

    let (operation, result) = match (method.clone(), Target::parse(subpath)) {
        (Method::GET, Target::Collection) => {
            let params = QueryParams::from_query_string(req.uri().query());
            (Operation::List, handle_list(params, service).await)
        }
        (Method::POST, Target::Collection) => (Operation::Create, handle_create(req, service).await),
        (Method::GET, Target::Item(id)) => (Operation::Get, handle_get(service, id).await),
        (Method::PUT, Target::Item(id)) => (Operation::Update, handle_update(req, service, id).await),
        (Method::DELETE, Target::Item(id)) => (Operation::Delete, handle_delete(service, id).await),
        (_, Target::Collection) | (_, Target::Item(_)) => {
            return method_not_allowed(&method, req.uri().path());
        }
        (_, Target::Status(_)) | (_, Target::Unknown) => return route_not_found(req.uri().path()),
    };

    finish::<R>(operation, result)
}

/// `/api/v1/priority-actions/*`: the generic routes plus status changes
pub async fn handle_priority_actions_request<B>(
    req: Request<B>,
    service: &ResourceService<PriorityAction>,
    subpath: &str,
) -> Response<FullBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Target::parse(subpath) {
        Target::Status(id) if *req.method() == Method::PUT => {
            let result = handle_update_status(req, service, id).await;
            finish::<PriorityAction>(Operation::Update, result)
        }
        Target::Status(_) => {
            let method = req.method().clone();
            method_not_allowed(&method, req.uri().path())
        }
        _ => handle_resource_request(req, service, subpath).await,
    }
}

async fn handle_list<R: Resource>(params: QueryParams, service: &ResourceService<R>) -> HandlerResult {
    let filter = R::Filter::from_query(&params)?;
    let page = service.get_all(&filter, params.page_request()).await?;

    Ok(json_response(
        StatusCode::OK,
        &Envelope::list(page.items, page.total),
    ))
}

async fn handle_get<R: Resource>(service: &ResourceService<R>, id: &str) -> HandlerResult {
    let record = service.get_by_id(id).await?;
    Ok(json_response(StatusCode::OK, &Envelope::data(record)))
}

async fn handle_create<R, B>(req: Request<B>, service: &ResourceService<R>) -> HandlerResult
where
    R: Resource,
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: R = read_json(req).await?;
    let record = service.create(body).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &Envelope::with_message(record, format!("{} created successfully", R::LABEL)),
    ))
}

async fn handle_update<R, B>(req: Request<B>, service: &ResourceService<R>, id: &str) -> HandlerResult
where
    R: Resource,
    B: Body,
    B::Error: Into<BoxError>,
{
    parse_id::<R>(id)?;
    let body: R = read_json(req).await?;
    let record = service.update(id, body).await?;

    Ok(json_response(
        StatusCode::OK,
        &Envelope::with_message(record, format!("{} updated successfully", R::LABEL)),
    ))
}

async fn handle_delete<R: Resource>(service: &ResourceService<R>, id: &str) -> HandlerResult {
    service.delete(id).await?;
    Ok(json_response(
        StatusCode::OK,
        &Envelope::message(format!("{} deleted successfully", R::LABEL)),
    ))
}

async fn handle_update_status<B>(
    req: Request<B>,
    service: &ResourceService<PriorityAction>,
    id: &str,
) -> HandlerResult
where
    B: Body,
    B::Error: Into<BoxError>,
{
    parse_id::<PriorityAction>(id)?;
    let change: StatusChange = read_json(req).await?;
    let record = service.update_status(id, &change.status).await?;

    Ok(json_response(
        StatusCode::OK,
        &Envelope::with_message(record, "Status updated successfully"),
    ))
}

/// Collect and decode a JSON request body
async fn read_json<T, B>(req: Request<B>) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::BadRequest(format!("body exceeds {} bytes", MAX_BODY_BYTES))
            } else {
                ApiError::BadRequest(format!("failed to read body: {}", e))
            }
        })?
        .to_bytes();

    Ok(serde_json::from_slice(&bytes)?)
}

fn finish<R: Resource>(operation: Operation, result: HandlerResult) -> Response<FullBody> {
    match result {
        Ok(response) => response,
        Err(err) => {
            let fallback = format!("Failed to {} {}", operation.verb(), R::PLURAL);
            if err.is_server_error() {
                error!(resource = R::PATH, ?operation, "{}: {}", fallback, err);
            } else if matches!(err, ApiError::NotFound(_)) {
                debug!(resource = R::PATH, ?operation, "{}", err);
            } else {
                warn!(resource = R::PATH, ?operation, "Rejected request: {}", err);
            }
            error_response(&err, &fallback)
        }
    }
}

pub fn method_not_allowed(method: &Method, path: &str) -> Response<FullBody> {
    let err = ApiError::MethodNotAllowed(format!("{} {}", method, path));
    error_response(&err, "Method not allowed")
}

pub fn route_not_found(path: &str) -> Response<FullBody> {
    let err = ApiError::NotFound(format!("Route not found: {}", path));
    error_response(&err, "Route not found")
}
