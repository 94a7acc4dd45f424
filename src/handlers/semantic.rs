use crate::{
    error::ApiError,
    models::{EntityBag, ErrorResponse, SemanticQuery, SemanticTextRequest},
    services::EntityExtractor,
};
use actix_web::{post, web, HttpResponse};

/// Extract topics, concepts and keywords from free text
#[utoipa::path(
    post,
    path = "/api/semantic/entities",
    tag = "Semantic",
    request_body = SemanticTextRequest,
    responses(
        (status = 200, description = "Extracted entities", body = EntityBag),
        (status = 400, description = "Malformed body", body = ErrorResponse)
    )
)]
#[post("/semantic/entities")]
pub async fn extract_entities(
    request: web::Json<SemanticTextRequest>,
) -> Result<HttpResponse, ApiError> {
    let entities = EntityExtractor::new().extract(&request.text);
    Ok(HttpResponse::Ok().json(entities))
}

/// Analyse a search string: synonyms, entities and intent
#[utoipa::path(
    post,
    path = "/api/semantic/query",
    tag = "Semantic",
    request_body = SemanticTextRequest,
    responses(
        (status = 200, description = "Semantic view of the query", body = SemanticQuery),
        (status = 400, description = "Empty query", body = ErrorResponse)
    )
)]
#[post("/semantic/query")]
pub async fn analyse_query(
    request: web::Json<SemanticTextRequest>,
) -> Result<HttpResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::InvalidInput("Query is required".to_string()));
    }
    let query = EntityExtractor::new().semantic_query(&request.text);
    Ok(HttpResponse::Ok().json(query))
}

pub fn semantic_config(cfg: &mut web::ServiceConfig) {
    cfg.service(extract_entities).service(analyse_query);
}
