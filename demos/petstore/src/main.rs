mod handlers;
mod models;
mod state;

use axopen::prelude::*;
use tracing::{info, warn};

use models::{ListPets, NewPet, Pet, PetPath};
use state::AppState;

fn build_api() -> ApiWrapper<AppState> {
    let config = ApiConfig::load("petstore.yaml").unwrap_or_else(|err| {
        warn!(%err, "using built-in configuration");
        ApiConfig::new("Petstore", "1.0.0").with_description("A sample pet store served by axopen")
    });

    let mut api = ApiWrapper::from_config(config)
        .with_tracing()
        .with_security_scheme(
            "api_key",
            SecurityScheme::api_key("X-Api-Key", ApiKeyLocation::Header),
        );

    for (name, description) in [
        ("pets", "Everything about your pets"),
        ("internal", "Operational endpoints"),
    ] {
        if !api.document().has_tag(name) {
            api.add_tag(Tag::new(name).with_description(description));
        }
    }

    api.add_json_response::<Pet>("PetResponse", "A single pet");

    api.get("/health", handlers::health)
        .tags(["internal"])
        .response_body::<String>("200", "Service is up")
        .register();

    {
        let mut v1 = api.group("/v1").tags(["pets"]);
        v1.get("/pets", handlers::list_pets)
            .summary("List pets")
            .query_struct::<ListPets>()
            .response_body::<Vec<Pet>>("200", "Matching pets")
            .register();
        v1.get("/pets/:petId", handlers::find_pet)
            .summary("Find pet by id")
            .path_struct::<PetPath>()
            .response_ref("200", "PetResponse")
            .response_description("404", "Pet not found")
            .register();

        let mut admin = v1.group("").security_requirement("api_key", &[]);
        admin
            .post("/pets", handlers::add_pet)
            .summary("Add a pet")
            .request_body_struct::<NewPet>("application/json", "Pet to add")
            .response_body::<Pet>("201", "Created")
            .register();
        admin
            .delete("/pets/:petId", handlers::delete_pet)
            .summary("Delete a pet")
            .path_struct::<PetPath>()
            .response_description("204", "Deleted")
            .register();
    }

    api.serve_yaml_spec("/openapi.yml", &[TagFilter::exclude(["internal"])])
        .serve_json_spec("/openapi.json", &[])
        .serve_swagger_ui("/docs", "/openapi.yml", "");
    api
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    axopen::init_tracing();
    let api = build_api();
    if let Err(err) = api.write_yaml_spec("openapi.yml", &[]) {
        warn!(%err, "could not write openapi.yml");
    }

    let router = api.into_router().with_state(AppState::default());
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    info!("Petstore listening on http://0.0.0.0:8080 (docs at /docs)");
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::build_api;

    #[test]
    fn document_covers_every_route() {
        let api = build_api();
        let doc = api.document();
        assert!(doc.operation("/v1/pets", &Method::GET).is_some());
        assert!(doc.operation("/v1/pets", &Method::POST).is_some());
        assert!(doc.operation("/v1/pets/{petId}", &Method::DELETE).is_some());
        assert!(doc.components.schemas.contains_key("NewPet"));

        let delete = doc.operation("/v1/pets/{petId}", &Method::DELETE).unwrap();
        assert!(delete.security[0].contains_key("api_key"));
    }
}
