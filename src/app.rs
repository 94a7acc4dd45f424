use crate::{
    config::Config,
    error::Result,
    handlers::{books, health, semantic},
    models,
    routes::{api_routes, openapi_route},
    services::{self, CatalogService, RecommendationEngine, SearchService},
    storage::{CatalogStore, InMemoryCatalogStore, PgCatalogStore},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use std::{net::TcpListener, sync::Arc};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Digital Library API",
        description = "Catalog browsing, semantic search and book recommendations"
    ),
    paths(
        health::health_check,
        books::list_books,
        books::search_books,
        books::get_recommendations,
        books::rate_book,
        books::sync_books,
        books::rebuild_relations,
        books::knowledge_graph,
        books::analytics,
        books::get_book,
        books::get_book_json_ld,
        semantic::extract_entities,
        semantic::analyse_query,
    ),
    components(schemas(
        models::Book,
        models::BookDetail,
        models::RelatedBook,
        models::BookListResponse,
        models::Pagination,
        models::HealthResponse,
        models::ErrorResponse,
        models::RateRequest,
        models::InteractionKind,
        models::InteractionRecord,
        models::Recommendation,
        models::RecommendationMode,
        models::RecommendationResponse,
        models::EntityBag,
        models::SearchIntent,
        models::SemanticQuery,
        models::SearchHit,
        models::SearchResponse,
        models::SemanticTextRequest,
        models::SimilarityEdge,
        models::GenreCount,
        models::AuthorCount,
        models::SearchTrend,
        models::InteractionCount,
        models::CatalogAnalytics,
        services::BuildReport,
        services::SyncReport,
        services::KnowledgeGraph,
        services::GraphNode,
        services::GraphEdge,
        services::NodeKind,
    )),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Books", description = "Catalog browsing, search and ratings"),
        (name = "Recommendations", description = "Content, collaborative, hybrid and popular recommendations"),
        (name = "Catalog", description = "Feed sync, similarity graph and analytics"),
        (name = "Semantic", description = "Entity extraction and query analysis")
    )
)]
pub struct ApiDoc;

/// Shared services handed to every actix worker.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: web::Data<CatalogService>,
    pub search: web::Data<SearchService>,
    pub engine: web::Data<RecommendationEngine>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CatalogStore>, config: &Config) -> Self {
        Self {
            catalog: web::Data::new(CatalogService::new(
                store.clone(),
                config.sync_source_url.clone(),
                config.catalog_base_url.clone(),
            )),
            search: web::Data::new(SearchService::new(store.clone())),
            engine: web::Data::new(RecommendationEngine::new(store)),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.catalog.clone())
            .app_data(self.search.clone())
            .app_data(self.engine.clone());
    }
}

/// Pick the catalog backend: PostgreSQL when a database URL is configured,
/// process memory otherwise.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn CatalogStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store =
                PgCatalogStore::connect(url, config.database_max_connections).await?;
            store.ensure_schema().await?;
            info!("Connected to PostgreSQL catalog");
            Ok(Arc::new(store))
        }
        None => {
            warn!("APP_DATABASE_URL is not set, using an in-memory catalog");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
    }
}

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        let store = connect_store(&self.config).await?;
        let services = AppServices::new(store, &self.config);
        let frontend_url = self.config.frontend_url.clone();

        HttpServer::new(move || {
            let cors = match frontend_url.as_deref() {
                Some(origin) => Cors::default()
                    .allowed_origin(origin)
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials(),
                None => Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            };
            let services = services.clone();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .configure(move |cfg| services.configure(cfg))
                .service(api_routes())
                .service(openapi_route())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
