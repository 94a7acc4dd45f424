use crate::{
    error::ApiError,
    models::{
        BookDetail, BookListResponse, CatalogAnalytics, ErrorResponse, InteractionKind,
        RateRequest, RecommendationMode, RecommendationRequest, RecommendationResponse,
        SearchResponse,
    },
    services::{
        BuildReport, CatalogService, KnowledgeGraph, RecommendationEngine, SearchService,
        SyncReport,
    },
    storage::BookFilter,
};
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    #[serde(rename = "type")]
    pub mode: Option<String>,
    pub user_id: Option<String>,
    pub book_id: Option<i32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailParams {
    pub user_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// List catalog entries
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "Books",
    params(
        ("page" = Option<i64>, Query, description = "Page number, starting at 1 (default: 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default: 10)"),
        ("genre" = Option<String>, Query, description = "Case-insensitive genre substring"),
        ("author" = Option<String>, Query, description = "Case-insensitive author substring"),
        ("year" = Option<i32>, Query, description = "Exact publication year")
    ),
    responses(
        (status = 200, description = "One page of the catalog, newest first", body = BookListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[get("/books")]
pub async fn list_books(
    params: web::Query<ListParams>,
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let filter = BookFilter {
        genre: non_blank(params.genre),
        author: non_blank(params.author),
        year: params.year,
        ..BookFilter::all()
    };

    let page = catalog.list_books(filter, params.page, params.limit).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Relevance-ranked search
#[utoipa::path(
    get,
    path = "/api/books/search",
    tag = "Books",
    params(
        ("query" = String, Query, description = "Free-text query"),
        ("userId" = Option<String>, Query, description = "Records the search in the audit log"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results (default: 10)")
    ),
    responses(
        (status = 200, description = "Matching entries, best first", body = SearchResponse),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[get("/books/search")]
pub async fn search_books(
    params: web::Query<SearchParams>,
    search: web::Data<SearchService>,
) -> Result<HttpResponse, ApiError> {
    let response = search
        .search(&params.query, params.user_id.as_deref(), params.limit)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Get book recommendations
#[utoipa::path(
    get,
    path = "/api/books/recommendations",
    tag = "Recommendations",
    params(
        ("type" = Option<String>, Query, description = "content, collaborative, hybrid (default) or popular; anything else means popular"),
        ("userId" = Option<String>, Query, description = "Reader id, required for collaborative"),
        ("bookId" = Option<i32>, Query, description = "Reference entry, required for content"),
        ("limit" = Option<usize>, Query, description = "Maximum number of results (default: 5)")
    ),
    responses(
        (status = 200, description = "Ranked recommendations with reasons", body = RecommendationResponse),
        (status = 400, description = "Missing bookId or userId for the requested mode", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[get("/books/recommendations")]
pub async fn get_recommendations(
    params: web::Query<RecommendationParams>,
    engine: web::Data<RecommendationEngine>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let request = RecommendationRequest {
        mode: params
            .mode
            .as_deref()
            .map(RecommendationMode::parse)
            .unwrap_or_default(),
        user_id: params.user_id,
        book_id: params.book_id,
        limit: params.limit,
    };

    let recommendations = engine.recommend(&request).await?;
    Ok(HttpResponse::Ok().json(RecommendationResponse {
        mode: request.mode,
        recommendations,
    }))
}

/// Rate a book
#[utoipa::path(
    post,
    path = "/api/books/rate",
    tag = "Books",
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating recorded"),
        (status = 400, description = "Missing field or rating outside 1..=5", body = ErrorResponse)
    )
)]
#[post("/books/rate")]
pub async fn rate_book(
    request: web::Json<RateRequest>,
    engine: web::Data<RecommendationEngine>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let (Some(user_id), Some(book_id), Some(rating)) =
        (non_blank(request.user_id), request.book_id, request.rating)
    else {
        return Err(ApiError::InvalidInput(
            "userId, bookId, and rating are required".to_string(),
        ));
    };
    if !(1..=5).contains(&rating) {
        return Err(ApiError::InvalidInput(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    engine
        .record_interaction(&user_id, book_id, InteractionKind::Rating, Some(rating))
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Rating recorded successfully"
    })))
}

/// Import the external catalog feed
#[utoipa::path(
    post,
    path = "/api/books/sync",
    tag = "Catalog",
    responses(
        (status = 200, description = "Feed ingested", body = SyncReport),
        (status = 500, description = "Feed unavailable or not configured", body = ErrorResponse)
    )
)]
#[post("/books/sync")]
pub async fn sync_books(catalog: web::Data<CatalogService>) -> Result<HttpResponse, ApiError> {
    let report = catalog.sync().await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Rebuild the similarity graph
#[utoipa::path(
    post,
    path = "/api/books/relations/rebuild",
    tag = "Catalog",
    responses(
        (status = 200, description = "Linking summary", body = BuildReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[post("/books/relations/rebuild")]
pub async fn rebuild_relations(
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, ApiError> {
    info!("Rebuilding similarity relations on request");
    let report = catalog.rebuild_relations().await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    get,
    path = "/api/books/knowledge-graph",
    tag = "Catalog",
    responses(
        (status = 200, description = "Book, author and genre graph", body = KnowledgeGraph),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[get("/books/knowledge-graph")]
pub async fn knowledge_graph(
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(catalog.knowledge_graph().await?))
}

#[utoipa::path(
    get,
    path = "/api/books/analytics",
    tag = "Catalog",
    responses(
        (status = 200, description = "Catalog and usage statistics", body = CatalogAnalytics),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[get("/books/analytics")]
pub async fn analytics(catalog: web::Data<CatalogService>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(catalog.analytics().await?))
}

/// Get a book with its related entries
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "Books",
    params(
        ("id" = i32, Path, description = "Book id"),
        ("userId" = Option<String>, Query, description = "Records a view for this reader")
    ),
    responses(
        (status = 200, description = "Book with up to five related entries", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[get("/books/{id}")]
pub async fn get_book(
    path: web::Path<i32>,
    params: web::Query<DetailParams>,
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, ApiError> {
    let detail = catalog
        .get_book(path.into_inner(), params.user_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/jsonld",
    tag = "Books",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "schema.org Book document"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[get("/books/{id}/jsonld")]
pub async fn get_book_json_ld(
    path: web::Path<i32>,
    catalog: web::Data<CatalogService>,
) -> Result<HttpResponse, ApiError> {
    let document = catalog.json_ld(path.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/ld+json")
        .json(document))
}

pub fn books_config(cfg: &mut web::ServiceConfig) {
    // `/books/{id}` must come after the literal paths
    cfg.service(list_books)
        .service(search_books)
        .service(get_recommendations)
        .service(rate_book)
        .service(sync_books)
        .service(rebuild_relations)
        .service(knowledge_graph)
        .service(analytics)
        .service(get_book_json_ld)
        .service(get_book);
}
