//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Management API",
        version = "1.0.0",
        description = "CRUD API for a collection of books. POST, PUT and DELETE require HTTP Basic authentication.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        // Info
        health::welcome,
        health::health_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::pagination::BookPage,
            crate::models::MessageResponse,
            crate::error::ErrorResponse,
            crate::error::FieldViolation,
        )
    ),
    modifiers(&BasicAuthScheme),
    tags(
        (name = "info", description = "Welcome endpoint"),
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book management. Authentication required for POST, PUT, DELETE.")
    )
)]
pub struct ApiDoc;

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}
