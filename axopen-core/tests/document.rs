mod common;

use axopen_core::openapi::{exclude_tags, include_tags, Ref, SchemaType, SecurityScheme};
use axopen_core::prelude::*;
use axum::http::{Method, StatusCode};
use common::{get, send, send_json};

#[derive(Debug, Serialize, Deserialize, Validate, Reflect)]
#[garde(allow_unvalidated)]
struct Pet {
    id: i64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
#[allow(dead_code)]
enum Status {
    Available,
    Sold,
}

async fn ok() -> &'static str {
    "ok"
}

fn tagged_api() -> ApiWrapper {
    ApiWrapper::new("Petstore", "1.0.0")
        .with_tag(Tag::new("pets").with_description("Everything about pets"))
        .with_tag(Tag::new("hello_world"))
        .with_tag(Tag::new("hidden"))
}

// ── Operations ──────────────────────────────────────────────────────────

#[test]
fn operations_land_under_document_paths() {
    let mut api = tagged_api();
    api.get("/pets/:id", ok)
        .tags(["pets"])
        .summary("  Find pet by id ")
        .path_parameter::<i64>("id", "Pet id")
        .response_body::<Pet>("200", "The pet")
        .register();

    let op = api.document().operation("/pets/{id}", &Method::GET).unwrap();
    assert_eq!(op.operation_id.as_deref(), Some("getPetsById"));
    assert_eq!(op.summary.as_deref(), Some("Find pet by id"));
    assert_eq!(op.tags, ["pets"]);

    let param = op.parameters[0].as_value().unwrap();
    assert_eq!(param.name, "id");
    assert!(param.required);

    let response = op.responses["200"].as_value().unwrap();
    let media = &response.content["application/json"];
    assert_eq!(
        media.schema,
        Some(Ref::component("schemas", "Pet"))
    );
    assert!(api.document().components.schemas.contains_key("Pet"));
}

#[test]
fn explicit_operation_id_wins() {
    let mut api = tagged_api();
    api.post("/pets", ok).operation_id("addPet").register();

    let op = api.document().operation("/pets", &Method::POST).unwrap();
    assert_eq!(op.operation_id.as_deref(), Some("addPet"));
}

#[test]
fn string_responses_are_plain_text() {
    let mut api = tagged_api();
    api.get("/hello", ok).response_body::<String>("200", "Greeting").register();

    let op = api.document().operation("/hello", &Method::GET).unwrap();
    let response = op.responses["200"].as_value().unwrap();
    assert!(response.content.contains_key("text/plain"));
}

#[test]
fn request_bodies_reference_the_reflected_schema() {
    let mut api = tagged_api();
    api.post("/pets", ok)
        .request_body_struct::<Pet>("application/json", "Pet to add")
        .register();

    let op = api.document().operation("/pets", &Method::POST).unwrap();
    let body = op.request_body.as_ref().and_then(Ref::as_value).unwrap();
    assert!(body.required);
    assert_eq!(body.description.as_deref(), Some("Pet to add"));
    assert_eq!(
        body.content["application/json"].schema,
        Some(Ref::component("schemas", "Pet"))
    );
}

#[test]
fn reusable_components_are_referenced() {
    let mut api = tagged_api();
    api.add_json_response::<Pet>("PetResponse", "A pet");
    api.add_parameter(
        "Limit",
        Parameter::new(ParameterLocation::Query, "limit").with_description("Page size"),
    );
    api.get("/pets", ok)
        .parameter_ref("Limit")
        .response_ref("200", "PetResponse")
        .register();

    let op = api.document().operation("/pets", &Method::GET).unwrap();
    assert_eq!(op.parameters[0], Ref::component("parameters", "Limit"));
    assert_eq!(op.responses["200"], Ref::component("responses", "PetResponse"));
}

#[test]
#[should_panic(expected = "axopen: tag `unknown` not registered")]
fn unknown_tag_panics() {
    let mut api = tagged_api();
    api.get("/", ok).tags(["unknown"]).register();
}

#[test]
#[should_panic(expected = "axopen: security scheme `oauth` not registered")]
fn unknown_security_scheme_panics() {
    let mut api = tagged_api();
    api.get("/", ok).security_requirement("oauth", &["read"]).register();
}

#[test]
#[should_panic(expected = "axopen: struct expected")]
fn non_struct_body_panics() {
    let mut api = tagged_api();
    api.post("/", ok)
        .request_body_struct::<Status>("application/json", "")
        .register();
}

#[test]
#[should_panic(expected = "axopen: schema name `Pet` is used by both a hand-built schema and")]
fn reflected_type_cannot_take_a_hand_built_name() {
    let mut api = tagged_api();
    api.add_schema_as("Pet", Schema::new(SchemaType::String));
    api.add_schema::<Pet>();
}

#[test]
#[should_panic(expected = "and a hand-built schema")]
fn hand_built_schema_cannot_take_a_reflected_name() {
    let mut api = tagged_api();
    api.add_schema::<Pet>();
    api.add_schema_as("Pet", Schema::new(SchemaType::String));
}

#[test]
fn hand_built_schemas_are_kept() {
    let mut api = tagged_api();
    let schema = api.add_schema_as("Color", Schema::new(SchemaType::String));
    assert_eq!(schema, Ref::component("schemas", "Color"));
    assert_eq!(
        api.document().components.schemas["Color"].schema_type,
        Some(SchemaType::String)
    );
}

#[test]
#[should_panic(expected = "is already registered")]
fn duplicate_route_panics() {
    let mut api = tagged_api();
    api.get("/pets", ok).register();
    api.get("/pets", ok).register();
}

// ── Groups ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn groups_share_prefix_tags_and_security() {
    let mut api = tagged_api().with_security_scheme("bearer", SecurityScheme::http_bearer());
    {
        let mut v1 = api.group("/v1").tags(["pets"]);
        v1.get("/pets", ok).register();

        let mut admin = v1.group("/admin").security_requirement("bearer", &[]);
        admin.delete("/pets/:id", ok)
            .path_parameter::<i64>("id", "")
            .register();
    }

    let doc = api.document();
    let list = doc.operation("/v1/pets", &Method::GET).unwrap();
    assert_eq!(list.tags, ["pets"]);
    assert!(list.security.is_empty());
    assert_eq!(list.operation_id.as_deref(), Some("getV1Pets"));

    let delete = doc
        .operation("/v1/admin/pets/{id}", &Method::DELETE)
        .unwrap();
    assert_eq!(delete.tags, ["pets"]);
    assert_eq!(delete.security.len(), 1);
    assert!(delete.security[0].contains_key("bearer"));

    let router = api.into_router();
    let (status, _) = send(router.clone(), get("/v1/pets")).await;
    assert_eq!(status, StatusCode::OK);

    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri("/v1/admin/pets/3")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn group_layers_wrap_every_route() {
    use axum::extract::Request;
    use axum::middleware::{self, Next};
    use axum::response::Response;

    async fn stamp(req: Request, next: Next) -> Response {
        let mut resp = next.run(req).await;
        resp.headers_mut().insert("x-group", "v1".parse().unwrap());
        resp
    }

    let mut api = tagged_api();
    {
        let mut v1 = api.group("/v1").layer(middleware::from_fn(stamp));
        v1.get("/a", ok).register();
        v1.get("/b", ok).register();
    }
    api.get("/c", ok).register();

    let router = api.into_router();
    for (uri, stamped) in [("/v1/a", true), ("/v1/b", true), ("/c", false)] {
        let resp = tower::ServiceExt::oneshot(router.clone(), get(uri)).await.unwrap();
        assert_eq!(resp.headers().contains_key("x-group"), stamped, "{uri}");
    }
}

// ── Base URL ────────────────────────────────────────────────────────────

#[tokio::test]
async fn base_url_prefixes_routes_but_not_document_paths() {
    let mut api = tagged_api().with_base_url("/api");
    api.get("/pets", ok).register();

    assert!(api.document().paths.contains_key("/pets"));
    let spec = api.spec();
    assert_eq!(spec.servers[0].url, "/api");

    let router = api.into_router();
    let (status, _) = send(router.clone(), get("/api/pets")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(router, get("/pets")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Tag filters ─────────────────────────────────────────────────────────

fn hello_and_hidden() -> ApiWrapper {
    let mut api = tagged_api();
    api.get("/hello", ok).tags(["hello_world"]).register();
    api.get("/hidden", ok).tags(["hidden"]).register();
    api
}

#[test]
fn include_and_exclude_are_complements() {
    let api = hello_and_hidden();

    let included = include_tags(api.document(), &["hidden"]);
    assert_eq!(included.paths.keys().collect::<Vec<_>>(), ["/hidden"]);
    assert_eq!(included.tags.len(), 1);

    let excluded = exclude_tags(api.document(), &["hidden"]);
    assert_eq!(excluded.paths.keys().collect::<Vec<_>>(), ["/hello"]);

    assert_eq!(api.document().paths.len(), 2);
}

// ── Serving and writing ─────────────────────────────────────────────────

#[tokio::test]
async fn served_yaml_spec_reflects_all_routes() {
    let mut api = hello_and_hidden();
    api.serve_yaml_spec("/openapi.yml", &[TagFilter::exclude(["hidden"])]);
    api.get("/late", ok).register();

    let resp = tower::ServiceExt::oneshot(api.into_router(), get("/openapi.yml"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/yaml");

    let body = http_body_util::BodyExt::collect(resp.into_body())
        .await
        .unwrap()
        .to_bytes();
    let doc: serde_yaml::Value = serde_yaml::from_slice(&body).unwrap();
    assert_eq!(doc["openapi"].as_str(), Some("3.1.0"));
    assert!(doc["paths"]["/hello"].is_mapping());
    assert!(doc["paths"]["/late"].is_mapping());
    assert!(doc["paths"]["/hidden"].is_null());
}

#[tokio::test]
async fn served_json_spec_and_ui() {
    let mut api = hello_and_hidden();
    api.serve_json_spec("/openapi.json", &[])
        .serve_swagger_ui("/docs", "/openapi.json", "");
    let router = api.into_router();

    let (status, doc) = send_json(router.clone(), get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Petstore");
    assert!(doc["paths"].get("/openapi.json").is_none());

    let (status, page) = send(router, get("/docs")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("<title>Petstore</title>"));
    assert!(page.contains(r#"url: "/openapi.json""#));
    assert!(page.contains(axopen_core::SWAGGER_UI_VERSION));
}

#[test]
fn specs_are_written_to_files() {
    let api = hello_and_hidden();
    let dir = tempfile::tempdir().unwrap();

    let yaml_path = dir.path().join("openapi.yml");
    api.write_yaml_spec(&yaml_path, &[TagFilter::include(["hello_world"])])
        .unwrap();
    let yaml = std::fs::read_to_string(&yaml_path).unwrap();
    assert!(yaml.contains("/hello"));
    assert!(!yaml.contains("/hidden"));

    let json_path = dir.path().join("openapi.json");
    api.write_json_spec(&json_path, &[]).unwrap();
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(doc["info"]["version"], "1.0.0");
}

#[test]
fn writing_to_a_missing_directory_fails() {
    let api = hello_and_hidden();
    let dir = tempfile::tempdir().unwrap();
    let err = api
        .write_yaml_spec(dir.path().join("missing/openapi.yml"), &[])
        .unwrap_err();
    assert!(matches!(err, axopen_core::SpecError::Io(_)));
}
