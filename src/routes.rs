use actix_web::{web, HttpResponse, Scope};
use utoipa::OpenApi;

use crate::app::ApiDoc;
use crate::handlers::{books_config, health_check, semantic_config};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .configure(books_config)
        .configure(semantic_config)
}

/// Configure OpenAPI documentation JSON endpoint
pub fn openapi_route() -> actix_web::Resource {
    web::resource("/api-docs/openapi.json")
        .route(web::get().to(|| async { HttpResponse::Ok().json(ApiDoc::openapi()) }))
}
