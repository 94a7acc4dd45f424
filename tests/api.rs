use actix_web::{http::StatusCode, test, App};
use chrono::Utc;
use digital_library_api::{
    app::AppServices,
    config::Config,
    models::Book,
    routes::{api_routes, openapi_route},
    storage::InMemoryCatalogStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database_max_connections: 1,
        frontend_url: None,
        sync_source_url: None,
        catalog_base_url: "http://localhost:3001/books".to_string(),
    }
}

fn entry(id: i32, title: &str, author: &str, genre: &str, year: i32) -> Book {
    Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        isbn: Some(format!("978-{}", id)),
        publication_year: Some(year),
        publisher: Some("Gramedia".to_string()),
        page_count: Some(240),
        genre: Some(genre.to_string()),
        description: None,
        cover_url: None,
        semantic_data: None,
        created_at: Utc::now(),
    }
}

fn services() -> AppServices {
    let store = InMemoryCatalogStore::with_books(vec![
        entry(1, "Database untuk Industri", "Budi Santoso", "Technology", 2020),
        entry(2, "Belajar SQL", "Budi Santoso", "Technology", 2021),
        entry(3, "Laut Bercerita", "Leila S. Chudori", "Fiction", 2017),
    ]);
    AppServices::new(Arc::new(store), &config())
}

macro_rules! app {
    ($services:expr) => {{
        let services = $services;
        test::init_service(
            App::new()
                .configure(move |cfg| services.configure(cfg))
                .service(api_routes())
                .service(openapi_route()),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_health() {
    let app = app!(services());

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_list_books_paginates() {
    let app = app!(services());

    let req = test::TestRequest::get()
        .uri("/api/books?limit=2&genre=tech")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["books"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["pages"], 1);
}

#[actix_web::test]
async fn test_search_requires_query() {
    let app = app!(services());

    let req = test::TestRequest::get().uri("/api/books/search").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_search_ranks_matches() {
    let app = app!(services());

    let req = test::TestRequest::get()
        .uri("/api/books/search?query=database&userId=u1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], 1);
    assert_eq!(results[0]["relevance_score"], 0.5);
    assert_eq!(body["semantic_query"]["entities"]["topics"], json!(["database"]));
}

#[actix_web::test]
async fn test_content_recommendations_need_book_id() {
    let app = app!(services());

    let req = test::TestRequest::get()
        .uri("/api/books/recommendations?type=content")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/books/recommendations?type=content&bookId=1&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["type"], "content");
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["id"], 2);
    assert!(recs[0]["recommendation_reason"]
        .as_str()
        .unwrap()
        .starts_with("Same author: Budi Santoso"));
}

#[actix_web::test]
async fn test_unknown_type_is_popular() {
    let app = app!(services());

    let req = test::TestRequest::get()
        .uri("/api/books/recommendations?type=trending")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["type"], "popular");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_rating_is_validated_and_counted() {
    let app = app!(services());

    let req = test::TestRequest::post()
        .uri("/api/books/rate")
        .set_json(json!({ "userId": "u1", "bookId": 3, "rating": 6 }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::post()
        .uri("/api/books/rate")
        .set_json(json!({ "userId": "u1", "bookId": 3, "rating": 5 }))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/books/recommendations?type=popular&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["recommendations"][0]["id"], 3);
    assert_eq!(body["recommendations"][0]["avg_rating"], 5.0);
}

#[actix_web::test]
async fn test_book_detail_and_relations() {
    let app = app!(services());

    let req = test::TestRequest::post()
        .uri("/api/books/relations/rebuild")
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["created"], 1);

    let req = test::TestRequest::get().uri("/api/books/1?userId=u1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "Database untuk Industri");
    assert_eq!(body["semantic_relations"][0]["id"], 2);

    let req = test::TestRequest::get().uri("/api/books/99").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_json_ld_and_knowledge_graph() {
    let app = app!(services());

    let req = test::TestRequest::get().uri("/api/books/3/jsonld").to_request();
    let doc: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(doc["@type"], "Book");
    assert_eq!(doc["@id"], "http://localhost:3001/books/3");

    let req = test::TestRequest::get()
        .uri("/api/books/knowledge-graph")
        .to_request();
    let graph: Value = test::call_and_read_body_json(&app, req).await;
    // three books, two authors, two genres
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 7);
    assert_eq!(graph["edges"].as_array().unwrap().len(), 6);
}

#[actix_web::test]
async fn test_sync_without_source_is_server_error() {
    let app = app!(services());

    let req = test::TestRequest::post().uri("/api/books/sync").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_semantic_endpoints() {
    let app = app!(services());

    let req = test::TestRequest::post()
        .uri("/api/semantic/entities")
        .set_json(json!({ "text": "A Python programming tutorial" }))
        .to_request();
    let bag: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(bag["topics"], json!(["programming", "python"]));
    assert_eq!(bag["concepts"], json!(["tutorial"]));

    let req = test::TestRequest::post()
        .uri("/api/semantic/query")
        .set_json(json!({ "text": "books by Tere Liye" }))
        .to_request();
    let query: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(query["intent"], "author_search");
}

#[actix_web::test]
async fn test_openapi_document() {
    let app = app!(services());

    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let doc: Value = test::call_and_read_body_json(&app, req).await;

    assert!(doc["paths"]["/api/books/recommendations"].is_object());
}
