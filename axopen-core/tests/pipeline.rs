mod common;

use axopen_core::openapi::{ApiKeyLocation, ParameterLocation, SecurityScheme};
use axopen_core::prelude::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use common::{get, post, send, send_json};
use serde_json::json;

// ── Test types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate, Reflect)]
#[garde(allow_unvalidated)]
struct ListQuery {
    limit: i32,
    offset: i32,
    tags: Vec<String>,
    deleted: bool,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
struct PageQuery {
    #[garde(range(min = 1, max = 100))]
    limit: i32,
    #[serde(default)]
    #[garde(skip)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
struct NewPet {
    #[garde(length(min = 1, max = 16))]
    name: String,
    #[serde(default)]
    #[garde(skip)]
    tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
#[garde(allow_unvalidated)]
struct PetPath {
    #[reflect(path = "pet_id")]
    #[serde(rename = "pet_id")]
    id: i64,
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn echo_path_id(values: RequestValues) -> String {
    values.path::<String>("id").unwrap_or_default()
}

async fn echo_list(ValidQuery(query): ValidQuery<ListQuery>) -> Json<serde_json::Value> {
    Json(json!({
        "limit": query.limit,
        "offset": query.offset,
        "tags": query.tags,
        "deleted": query.deleted,
    }))
}

async fn echo_page(ValidQuery(query): ValidQuery<PageQuery>) -> Json<serde_json::Value> {
    Json(json!({ "limit": query.limit, "cursor": query.cursor }))
}

async fn create_pet(ValidBody(pet): ValidBody<NewPet>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "name": pet.name, "tag": pet.tag })))
}

async fn upload(body: axum::body::Bytes) -> String {
    format!("{} bytes", body.len())
}

async fn whoami(values: RequestValues) -> Json<serde_json::Value> {
    Json(json!({
        "key": values.security("api_key"),
        "scopes": values.security_scopes("api_key"),
    }))
}

// ── Path parameters ─────────────────────────────────────────────────────

#[tokio::test]
async fn string_path_parameter_reaches_handler() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/:id", echo_path_id)
        .path_parameter::<String>("id", "")
        .register();

    let (status, body) = send(api.into_router(), get("/1234")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1234");
}

#[tokio::test]
async fn out_of_range_int8_path_parameter_is_rejected() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/:id", echo_path_id)
        .path_parameter::<i8>("id", "")
        .register();

    let (status, body) = send_json(api.into_router(), get("/1234")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Required path parameter 'id' is missing or invalid"
    );
}

#[tokio::test]
async fn int32_path_parameter_is_typed() {
    async fn handler(values: RequestValues) -> String {
        let id = values.path::<i32>("id").unwrap();
        assert_eq!(values.param("path.id"), Some(&ParamValue::I32(id)));
        format!("{}", id + 1)
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets/:id", handler)
        .path_parameter::<i32>("id", "Pet id")
        .register();

    let (status, body) = send(api.into_router(), get("/pets/41")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "42");
}

#[tokio::test]
async fn path_struct_binds_named_captures() {
    async fn handler(ValidPath(path): ValidPath<PetPath>) -> String {
        path.id.to_string()
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets/:pet_id", handler).path_struct::<PetPath>().register();

    let (status, body) = send(api.into_router(), get("/pets/77")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "77");
}

// ── Header and query parameters ─────────────────────────────────────────

#[tokio::test]
async fn missing_required_header_is_rejected() {
    async fn handler(values: RequestValues) -> String {
        values.header::<String>("X-Request-Id").unwrap_or_default()
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/", handler)
        .header_parameter::<String>("X-Request-Id", "", true)
        .register();
    let router = api.into_router();

    let (status, _) = send(router.clone(), get("/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .uri("/")
        .header("X-Request-Id", "abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "abc");
}

#[tokio::test]
async fn optional_query_parameter_may_be_absent() {
    async fn handler(values: RequestValues) -> String {
        match values.query_param::<bool>("verbose") {
            Some(v) => v.to_string(),
            None => "unset".into(),
        }
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/", handler)
        .query_parameter::<bool>("verbose", "", false)
        .register();
    let router = api.into_router();

    let (_, body) = send(router.clone(), get("/")).await;
    assert_eq!(body, "unset");
    let (_, body) = send(router.clone(), get("/?verbose=T")).await;
    assert_eq!(body, "true");
    let (status, _) = send(router, get("/?verbose=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn array_header_takes_every_line() {
    async fn handler(values: RequestValues) -> String {
        let ids = values.header::<Vec<i64>>("X-Ids").unwrap();
        format!("{ids:?}")
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/", handler)
        .header_parameter::<Vec<i64>>("X-Ids", "", true)
        .register();

    let req = Request::builder()
        .uri("/")
        .header("X-Ids", "1")
        .header("X-Ids", "2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(api.into_router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[1, 2]");
}

// ── Query structs ───────────────────────────────────────────────────────

#[tokio::test]
async fn query_struct_binds_repeated_and_scalar_fields() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets", echo_list).query_struct::<ListQuery>().register();

    let (status, body) = send_json(
        api.into_router(),
        get("/pets?limit=100&offset=20&tags=foo&tags=bar&deleted=true"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "limit": 100, "offset": 20, "tags": ["foo", "bar"], "deleted": true })
    );
}

#[tokio::test]
async fn absent_query_fields_take_zero_values() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets", echo_list).query_struct::<ListQuery>().register();

    let (status, body) = send_json(api.into_router(), get("/pets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "limit": 0, "offset": 0, "tags": [], "deleted": false })
    );
}

#[tokio::test]
async fn query_struct_is_validated() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets", echo_page).query_struct::<PageQuery>().register();
    let router = api.into_router();

    let (status, body) = send_json(router.clone(), get("/pets?limit=10&cursor=abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "limit": 10, "cursor": "abc" }));

    let (status, body) = send_json(router.clone(), get("/pets?limit=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "limit");

    let (status, body) = send_json(router, get("/pets?limit=ten")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Bind Error"));
}

#[tokio::test]
async fn absent_char_field_binds_to_nul() {
    #[derive(Debug, Deserialize, Validate, Reflect)]
    #[garde(allow_unvalidated)]
    struct Initial {
        initial: char,
    }

    async fn handler(ValidQuery(query): ValidQuery<Initial>) -> String {
        format!("{:?}", query.initial)
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/names", handler).query_struct::<Initial>().register();
    let router = api.into_router();

    let (status, body) = send(router.clone(), get("/names")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r"'\0'");

    let (status, body) = send(router, get("/names?initial=x")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "'x'");
}

// ── Security ────────────────────────────────────────────────────────────

fn secured_api() -> ApiWrapper {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0").with_security_scheme(
        "api_key",
        SecurityScheme::api_key("X-API-Key", ApiKeyLocation::Header),
    );
    api.get("/me", whoami)
        .security_requirement("api_key", &["read", "write"])
        .register();
    api
}

#[tokio::test]
async fn api_key_header_satisfies_requirement() {
    let req = Request::builder()
        .uri("/me")
        .header("X-API-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(secured_api().into_router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "key": "secret", "scopes": ["read", "write"] }));
}

#[tokio::test]
async fn missing_api_key_is_unauthorized() {
    let (status, body) = send_json(secured_api().into_router(), get("/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["error"],
        "At least one required security scheme must be provided"
    );
}

#[tokio::test]
async fn wrong_method_on_secured_route_is_not_allowed() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/me")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(secured_api().into_router(), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn wrong_method_skips_parameter_checks() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets/:id", echo_path_id)
        .path_parameter::<i8>("id", "")
        .register();

    let req = Request::builder()
        .method("PUT")
        .uri("/pets/1234")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(api.into_router(), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn methods_sharing_a_path_keep_their_own_rules() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0").with_security_scheme(
        "api_key",
        SecurityScheme::api_key("X-API-Key", ApiKeyLocation::Header),
    );
    api.get("/me", whoami).register();
    api.post("/me", whoami)
        .security_requirement("api_key", &[])
        .register();
    let router = api.into_router();

    let (status, _) = send(router.clone(), get("/me")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(router.clone(), post("/me", "text/plain", "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("PATCH")
        .uri("/me")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn optional_security_admits_anonymous_requests() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0")
        .with_security_scheme("bearer", SecurityScheme::http_bearer());
    api.get("/me", whoami)
        .security_requirement("bearer", &[])
        .optional_security()
        .register();

    let (status, body) = send_json(api.into_router(), get("/me")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], serde_json::Value::Null);
}

// ── Request bodies ──────────────────────────────────────────────────────

fn pets_api() -> ApiWrapper {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.post("/pets", create_pet)
        .request_body_struct::<NewPet>("application/json", "New pet")
        .request_body_struct::<NewPet>("application/x-www-form-urlencoded", "")
        .register();
    api.post("/upload", upload)
        .request_body_file("image/png", "Picture")
        .register();
    api
}

#[tokio::test]
async fn json_body_is_bound() {
    let req = post(
        "/pets",
        "application/json; charset=utf-8",
        r#"{"name":"Rex","tag":"dog"}"#,
    );
    let (status, body) = send_json(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "name": "Rex", "tag": "dog" }));
}

#[tokio::test]
async fn form_body_is_bound() {
    let req = post("/pets", "application/x-www-form-urlencoded", "name=Tom");
    let (status, body) = send_json(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "name": "Tom", "tag": null }));
}

#[tokio::test]
async fn invalid_body_reports_field_errors() {
    let req = post("/pets", "application/json", r#"{"name":""}"#);
    let (status, body) = send_json(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(body["details"][0]["code"], "validation");
}

#[tokio::test]
async fn malformed_json_is_a_bind_error() {
    let req = post("/pets", "application/json", "{not json");
    let (status, body) = send_json(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Bind Error"));
}

#[tokio::test]
async fn unregistered_content_type_is_unsupported() {
    let req = post("/pets", "text/plain", "Rex");
    let (status, _) = send(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn missing_content_type_is_unsupported() {
    let req = Request::builder()
        .method("POST")
        .uri("/pets")
        .body(Body::from(r#"{"name":"Rex"}"#))
        .unwrap();
    let (status, _) = send(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn repeated_content_type_is_unsupported() {
    let req = Request::builder()
        .method("POST")
        .uri("/pets")
        .header("content-type", "application/json")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name":"Rex"}"#))
        .unwrap();
    let (status, _) = send(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn file_body_passes_through() {
    let req = post("/upload", "image/png", vec![0u8; 16]);
    let (status, body) = send(pets_api().into_router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "16 bytes");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0").with_body_limit(8);
    api.post("/pets", create_pet)
        .request_body_struct::<NewPet>("application/json", "")
        .register();

    let req = post("/pets", "application/json", r#"{"name":"Rexington"}"#);
    let (status, body) = send_json(api.into_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Body Read Error"));
}

#[tokio::test]
async fn reusable_request_body_binds_like_inline() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.add_request_body_struct::<NewPet>("NewPet", "application/json", "New pet");
    api.post("/pets", create_pet).request_body_ref("NewPet").register();

    let req = post("/pets", "application/json", r#"{"name":"Rex"}"#);
    let (status, _) = send(api.into_router(), req).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn inline_body_replaces_referenced_binders() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.add_request_body_struct::<NewPet>("NewPet", "application/json", "New pet");
    api.post("/upload", upload)
        .request_body_ref("NewPet")
        .request_body_file("image/png", "Picture")
        .register();

    let op = api
        .document()
        .operation("/upload", &axum::http::Method::POST)
        .unwrap();
    let body = op.request_body.as_ref().and_then(|b| b.as_value()).unwrap();
    assert_eq!(body.content.keys().collect::<Vec<_>>(), ["image/png"]);

    let router = api.into_router();
    let req = post("/upload", "application/json", r#"{"name":"Rex"}"#);
    let (status, _) = send(router.clone(), req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, body) = send(router, post("/upload", "image/png", vec![0u8; 4])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "4 bytes");
}

// ── Error handler and layers ────────────────────────────────────────────

#[tokio::test]
async fn custom_error_handler_shapes_rejections() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0").with_error_handler(|err: ApiError| {
        (StatusCode::IM_A_TEAPOT, format!("nope: {err}")).into_response()
    });
    api.get("/:id", echo_path_id)
        .path_parameter::<u8>("id", "")
        .register();

    let (status, body) = send(api.into_router(), get("/300")).await;
    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body, "nope: Required path parameter 'id' is missing or invalid");
}

#[tokio::test]
async fn route_layers_run_before_validation() {
    use axum::extract::Request as AxumRequest;
    use axum::middleware::{self, Next};

    async fn inject_header(mut req: AxumRequest, next: Next) -> axum::response::Response {
        req.headers_mut()
            .insert("X-Request-Id", "from-layer".parse().unwrap());
        next.run(req).await
    }

    async fn handler(values: RequestValues) -> String {
        values.header::<String>("X-Request-Id").unwrap_or_default()
    }

    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/", handler)
        .header_parameter::<String>("X-Request-Id", "", true)
        .layer(middleware::from_fn(inject_header))
        .register();

    let (status, body) = send(api.into_router(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "from-layer");
}

#[tokio::test]
async fn struct_parameters_document_every_field() {
    let mut api: ApiWrapper = ApiWrapper::new("test", "1.0.0");
    api.get("/pets", echo_list)
        .struct_parameters::<ListQuery>(ParameterLocation::Query)
        .register();

    let op = api
        .document()
        .operation("/pets", &axum::http::Method::GET)
        .unwrap();
    let names: Vec<_> = op
        .parameters
        .iter()
        .filter_map(|p| p.as_value())
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, ["limit", "offset", "tags", "deleted"]);
}
