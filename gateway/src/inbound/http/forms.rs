//! Form API handlers.
//!
//! Clients fetch a descriptor to render a catalogue form, then submit the
//! values back; the form engine validates, transforms and forwards them.
//!
//! ```text
//! GET /api/v1/forms/patient?organization=org-1
//! POST /api/v1/forms/patient?organization=org-1 {"values":{"name":"Rahim","phone":"01712345678"}}
//! PUT /api/v1/forms/patient/42?organization=org-1 {"values":{...}}
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::formatting::{convert_keys, to_camel_case};
use crate::domain::forms::catalogue::CatalogueForm;
use crate::domain::forms::{
    FieldConfig, FormConfig, FormErrors, FormMethod, FormValues, SubmitOutcome, UploadedFile,
};
use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::{HttpState, cookie_header};
use crate::middleware::AuthenticatedUser;

/// Organisation a form is scoped to.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormScope {
    /// Organisation uid; defaults to the caller's organisation claim.
    pub organization: Option<String>,
}

/// Client-renderable description of a form.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDescriptor {
    /// Form identifier.
    pub name: String,
    /// HTTP method used on submit.
    #[schema(value_type = String, example = "POST")]
    pub method: FormMethod,
    /// Fields in display order.
    #[schema(value_type = Vec<Object>)]
    pub fields: Vec<FieldConfig>,
    /// Initial values keyed by field name.
    #[schema(value_type = Object)]
    pub defaults: FormValues,
    /// Message shown after success.
    pub success_message: String,
    /// Client route to visit after success.
    pub redirect_path: Option<String>,
    /// Pause before the redirect, in milliseconds.
    pub redirect_delay_ms: u64,
    /// Whether the client restores defaults after success.
    pub reset_on_success: bool,
}

impl From<&FormConfig> for FormDescriptor {
    fn from(config: &FormConfig) -> Self {
        Self {
            name: config.name.clone(),
            method: config.method,
            fields: config.fields.clone(),
            defaults: config.default_values(),
            success_message: config.success_message.clone(),
            redirect_path: config.redirect_path.clone(),
            redirect_delay_ms: duration_ms(config.redirect_delay),
            reset_on_success: config.reset_on_success,
        }
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// File attached to a JSON submission.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    /// `File` field the upload belongs to.
    pub field: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Standard base64 encoding of the file contents.
    pub data: String,
}

/// Body of a form submission.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    /// Raw values keyed by field name.
    #[schema(value_type = Object)]
    pub values: FormValues,
    /// Files for `File` fields, base64 encoded.
    #[serde(default)]
    pub files: Vec<FileUpload>,
}

/// Redirect instruction returned after a successful submission.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedirectResponse {
    /// Client route to navigate to.
    pub path: String,
    /// Pause before navigating, in milliseconds.
    pub after_ms: u64,
}

/// Result of a successful submission.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Message to show the user.
    pub message: String,
    /// Where to go next, if anywhere.
    pub redirect: Option<RedirectResponse>,
    /// Whether the client should restore the default values.
    pub reset: bool,
    /// The backend's record with camelCase keys.
    #[schema(value_type = Object)]
    pub record: Value,
}

fn parse_form(raw: &str) -> ApiResult<CatalogueForm> {
    raw.parse()
        .map_err(|err: crate::domain::forms::catalogue::UnknownForm| {
            Error::not_found(err.to_string())
        })
}

/// Organisation the form targets, confined to the caller's own for owners.
fn resolve_organization(
    form: CatalogueForm,
    scope: &FormScope,
    user: Option<&AuthenticatedUser>,
) -> ApiResult<String> {
    if !form.is_org_scoped() {
        return Ok(String::new());
    }
    let claims = user.map(|AuthenticatedUser(claims)| claims);
    let organization = scope
        .organization
        .as_deref()
        .map(str::trim)
        .filter(|org| !org.is_empty())
        .map(str::to_owned)
        .or_else(|| claims.and_then(|claims| claims.organization_uid.clone()))
        .ok_or_else(|| Error::invalid_request("organization is required"))?;
    if let Some(claims) = claims {
        let confined = claims.role == Role::Owner && !claims.is_admin;
        if confined && claims.organization_uid.as_deref() != Some(organization.as_str()) {
            return Err(Error::forbidden("organization does not belong to caller"));
        }
    }
    Ok(organization)
}

fn decode_files(files: Vec<FileUpload>) -> ApiResult<Vec<UploadedFile>> {
    files
        .into_iter()
        .map(|file| {
            let bytes = BASE64.decode(file.data.as_bytes()).map_err(|err| {
                Error::field_errors(
                    "Invalid file upload.",
                    &[crate::domain::forms::ValidationError::new(
                        file.field.as_str(),
                        [format!("File could not be decoded: {err}")],
                    )],
                )
            })?;
            Ok(UploadedFile {
                field: file.field,
                file_name: file.file_name,
                content_type: file.content_type,
                bytes,
            })
        })
        .collect()
}

fn rejection(errors: &FormErrors) -> Error {
    let message = errors
        .form
        .iter()
        .find(|message| !message.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| "Please correct the highlighted fields.".to_owned());
    Error::invalid_request(message).with_details(json!({
        "fieldErrors": errors.fields,
        "formErrors": errors.form,
    }))
}

async fn submit(
    state: &HttpState,
    req: &HttpRequest,
    config: FormConfig,
    payload: SubmitRequest,
) -> ApiResult<HttpResponse> {
    let files = decode_files(payload.files)?;
    let cookies = cookie_header(req);
    let outcome = config
        .submit(state.backend.as_ref(), payload.values, files, cookies.as_deref())
        .await;
    match outcome {
        SubmitOutcome::Succeeded {
            message,
            redirect,
            reset,
            record,
        } => {
            let status = StatusCode::from_u16(config.method.expected_status())
                .unwrap_or(StatusCode::OK);
            Ok(HttpResponse::build(status).json(SubmitResponse {
                message,
                redirect: redirect.map(|redirect| RedirectResponse {
                    path: redirect.path,
                    after_ms: duration_ms(redirect.after),
                }),
                reset,
                record: convert_keys(record, to_camel_case),
            }))
        }
        SubmitOutcome::Rejected(errors) => Err(rejection(&errors)),
    }
}

/// Describe a catalogue form: fields, defaults and success behaviour.
#[utoipa::path(
    get,
    path = "/api/v1/forms/{form}",
    params(
        ("form" = String, Path, description = "patient | medicine | appointment | organization | doctor"),
        FormScope
    ),
    responses(
        (status = 200, description = "Form descriptor", body = FormDescriptor),
        (status = 400, description = "Organisation missing", body = ErrorSchema),
        (status = 404, description = "Unknown form", body = ErrorSchema)
    ),
    tags = ["forms"],
    operation_id = "describeForm"
)]
#[get("/forms/{form}")]
pub async fn describe_form(
    path: web::Path<String>,
    scope: web::Query<FormScope>,
    user: Option<AuthenticatedUser>,
) -> ApiResult<web::Json<FormDescriptor>> {
    let form = parse_form(&path)?;
    let organization = resolve_organization(form, &scope, user.as_ref())?;
    let config = form.config(&organization, None);
    Ok(web::Json(FormDescriptor::from(&config)))
}

/// Create a record through a catalogue form.
#[utoipa::path(
    post,
    path = "/api/v1/forms/{form}",
    params(
        ("form" = String, Path, description = "patient | medicine | appointment | organization | doctor"),
        FormScope
    ),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Record created", body = SubmitResponse),
        (status = 400, description = "Validation or backend rejection; details carry fieldErrors and formErrors", body = ErrorSchema),
        (status = 404, description = "Unknown form", body = ErrorSchema)
    ),
    tags = ["forms"],
    operation_id = "createRecord"
)]
#[post("/forms/{form}")]
pub async fn create_record(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
    scope: web::Query<FormScope>,
    user: Option<AuthenticatedUser>,
    payload: web::Json<SubmitRequest>,
) -> ApiResult<HttpResponse> {
    let form = parse_form(&path)?;
    let organization = resolve_organization(form, &scope, user.as_ref())?;
    submit(&state, &req, form.config(&organization, None), payload.into_inner()).await
}

/// Update a record through a catalogue form.
#[utoipa::path(
    put,
    path = "/api/v1/forms/{form}/{id}",
    params(
        ("form" = String, Path, description = "patient | medicine | appointment | organization | doctor"),
        ("id" = String, Path, description = "Record identifier"),
        FormScope
    ),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Record updated", body = SubmitResponse),
        (status = 400, description = "Validation or backend rejection", body = ErrorSchema),
        (status = 404, description = "Unknown form", body = ErrorSchema)
    ),
    tags = ["forms"],
    operation_id = "updateRecord"
)]
#[put("/forms/{form}/{id}")]
pub async fn update_record(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    scope: web::Query<FormScope>,
    user: Option<AuthenticatedUser>,
    payload: web::Json<SubmitRequest>,
) -> ApiResult<HttpResponse> {
    let (form, id) = path.into_inner();
    let form = parse_form(&form)?;
    let organization = resolve_organization(form, &scope, user.as_ref())?;
    let config = form.config(&organization, Some(&id));
    submit(&state, &req, config, payload.into_inner()).await
}
