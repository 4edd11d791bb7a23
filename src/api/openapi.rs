use utoipa::OpenApi;

use super::handlers::{health, logout};

#[derive(OpenApi)]
#[openapi(
    paths(health::health, logout::logout),
    components(schemas(health::Health)),
    tags(
        (name = "health", description = "Service health"),
        (name = "session", description = "Session cookie management"),
    )
)]
struct ApiDoc;

/// OpenAPI document for the routes served by mailgate itself.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
