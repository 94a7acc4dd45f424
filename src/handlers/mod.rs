pub mod books;
pub mod health;
pub mod semantic;

pub use books::books_config;
pub use health::health_check;
pub use semantic::semantic_config;
