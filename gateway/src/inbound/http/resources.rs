//! Resource API handlers.
//!
//! Thin proxies over the practice backend. Payloads are re-shaped through
//! the domain view types so clients always receive camelCase records, and
//! camelCase ordering fields are translated back before forwarding. Patients
//! also carry a `phoneDisplay` string in `01XXX-XXXXXX` form.
//!
//! ```text
//! GET /api/v1/organizations
//! GET /api/v1/organizations/{org}/{kind}?search=rahim&ordering=-createdAt&page=2&pageSize=20
//! GET /api/v1/organizations/{org}/{kind}/{id}
//! ```

use actix_web::{HttpRequest, get, web};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::domain::formatting::{backend_ordering, format_phone_number};
use crate::domain::ports::ApiRequest;
use crate::domain::resources::{
    Appointment, Doctor, HomeopathicMedicine, Organization, Page, Patient, ResourceKind,
};
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::backend_status_error;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::{HttpState, cookie_header};
use crate::middleware::AuthenticatedUser;

const ORGANIZATIONS_PATH: &str = "/organization/homeopathy/";

/// Query parameters passed through to list endpoints.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Free-text search.
    pub search: Option<String>,
    /// Ordering expression, e.g. `-createdAt`; sent to the backend as `-created_at`.
    pub ordering: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Items per page.
    #[serde(alias = "pageSize")]
    pub page_size: Option<u32>,
}

impl ListQuery {
    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search".to_owned(), search.to_owned()));
        }
        if let Some(ordering) = self
            .ordering
            .as_deref()
            .map(backend_ordering)
            .filter(|s| !s.is_empty())
        {
            pairs.push(("ordering".to_owned(), ordering));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_owned(), page_size.to_string()));
        }
        pairs
    }
}

fn reshape<T: DeserializeOwned + Serialize>(value: &Value) -> Result<Value, serde_json::Error> {
    let typed: T = serde_json::from_value(value.clone())?;
    serde_json::to_value(typed)
}

fn reshape_many(kind: ResourceKind, value: &Value) -> ApiResult<Value> {
    let items = match value {
        Value::Null => return Ok(Value::Array(Vec::new())),
        other => other,
    };
    match kind {
        ResourceKind::Patients => reshape::<Vec<Patient>>(items).map(with_phone_display),
        ResourceKind::Medicines => reshape::<Vec<HomeopathicMedicine>>(items),
        ResourceKind::Appointments => reshape::<Vec<Appointment>>(items),
        ResourceKind::Doctors => reshape::<Vec<Doctor>>(items),
    }
    .map_err(|err| unexpected_payload(kind, &err))
}

fn reshape_one(kind: ResourceKind, value: &Value) -> ApiResult<Value> {
    match kind {
        ResourceKind::Patients => reshape::<Patient>(value).map(with_phone_display),
        ResourceKind::Medicines => reshape::<HomeopathicMedicine>(value),
        ResourceKind::Appointments => reshape::<Appointment>(value),
        ResourceKind::Doctors => reshape::<Doctor>(value),
    }
    .map_err(|err| unexpected_payload(kind, &err))
}

fn with_phone_display(mut value: Value) -> Value {
    match &mut value {
        Value::Array(items) => items.iter_mut().for_each(add_phone_display),
        record => add_phone_display(record),
    }
    value
}

fn add_phone_display(record: &mut Value) {
    let Some(map) = record.as_object_mut() else {
        return;
    };
    let display = map
        .get("phone")
        .and_then(Value::as_str)
        .map(format_phone_number);
    if let Some(display) = display {
        map.insert("phoneDisplay".to_owned(), Value::String(display));
    }
}

fn unexpected_payload(kind: ResourceKind, err: &serde_json::Error) -> Error {
    error!(%kind, error = %err, "backend returned an unexpected payload");
    Error::internal(format!("unexpected {kind} payload: {err}"))
}

fn parse_kind(raw: &str) -> ApiResult<ResourceKind> {
    raw.parse().map_err(|err: crate::domain::resources::UnknownResourceKind| {
        Error::not_found(err.to_string())
    })
}

/// List an organisation's patients, medicines, appointments or doctors.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{org}/{kind}",
    params(
        ("org" = String, Path, description = "Organisation uid"),
        ("kind" = String, Path, description = "patients | medicines | appointments | doctors"),
        ListQuery
    ),
    responses(
        (status = 200, description = "One page of records as {count, results}"),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 404, description = "Unknown collection", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listResources"
)]
#[get("/organizations/{org}/{kind}")]
pub async fn list_resources(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Page<Value>>> {
    let (org, kind) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let request = ApiRequest::get(kind.collection_path(&org))
        .with_query(query.pairs())
        .with_cookies(cookie_header(&req).as_deref());
    let response = state.backend.send(request).await?;
    if !response.is_success() {
        return Err(backend_status_error(&response));
    }
    let results = match reshape_many(kind, response.payload())? {
        Value::Array(items) => items,
        other => vec![other],
    };
    Ok(web::Json(Page {
        count: response.count(),
        results,
    }))
}

/// Fetch one record.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{org}/{kind}/{id}",
    params(
        ("org" = String, Path, description = "Organisation uid"),
        ("kind" = String, Path, description = "patients | medicines | appointments | doctors"),
        ("id" = String, Path, description = "Record identifier")
    ),
    responses(
        (status = 200, description = "The record"),
        (status = 404, description = "Unknown collection or record", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "getResource"
)]
#[get("/organizations/{org}/{kind}/{id}")]
pub async fn get_resource(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String, String)>,
) -> ApiResult<web::Json<Value>> {
    let (org, kind, id) = path.into_inner();
    let kind = parse_kind(&kind)?;
    let request =
        ApiRequest::get(kind.item_path(&org, &id)).with_cookies(cookie_header(&req).as_deref());
    let response = state.backend.send(request).await?;
    if !response.is_success() {
        return Err(backend_status_error(&response));
    }
    reshape_one(kind, response.payload()).map(web::Json)
}

async fn caller_is_admin(
    state: &HttpState,
    req: &HttpRequest,
    user: Option<AuthenticatedUser>,
) -> ApiResult<bool> {
    if let Some(AuthenticatedUser(claims)) = user {
        return Ok(claims.is_admin);
    }
    let mut context = state.auth_context();
    context.check_auth(cookie_header(req).as_deref()).await?;
    match context.user() {
        Some(user) => Ok(user.is_admin),
        None => Err(Error::unauthorized("login required")),
    }
}

/// List every organisation. Admins only.
#[utoipa::path(
    get,
    path = "/api/v1/organizations",
    params(ListQuery),
    responses(
        (status = 200, description = "Organisations as {count, results}"),
        (status = 401, description = "Not logged in", body = ErrorSchema),
        (status = 403, description = "Not an administrator", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["resources"],
    operation_id = "listOrganizations"
)]
#[get("/organizations")]
pub async fn list_organizations(
    state: web::Data<HttpState>,
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Page<Organization>>> {
    if !caller_is_admin(&state, &req, user).await? {
        return Err(Error::forbidden("admin access required"));
    }
    let request = ApiRequest::get(ORGANIZATIONS_PATH)
        .with_query(query.pairs())
        .with_cookies(cookie_header(&req).as_deref());
    let response = state.backend.send(request).await?;
    if !response.is_success() {
        return Err(backend_status_error(&response));
    }
    let results: Vec<Organization> = match response.payload() {
        Value::Null => Vec::new(),
        payload => serde_json::from_value(payload.clone()).map_err(|err| {
            error!(error = %err, "backend returned an unexpected organisation payload");
            Error::internal(format!("unexpected organisation payload: {err}"))
        })?,
    };
    Ok(web::Json(Page {
        count: response.count(),
        results,
    }))
}
