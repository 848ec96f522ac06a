//! Infrastructure layer: HTTP and browser access, site extractors,
//! normalization, SQLite persistence and the background writer.

pub mod browser;
pub mod config;
pub mod database_connection;
pub mod db_writer;
pub mod extractors;
pub mod http_client;
pub mod logging;
pub mod normalizer;
pub mod product_repository;
pub mod vector_index;

pub use config::AppConfig;
pub use database_connection::DatabaseConnection;
pub use db_writer::{DbWriter, DirectSink, QueuedSink};
pub use extractors::default_registry;
pub use http_client::HttpClient;
pub use logging::init_logging;
pub use product_repository::ProductRepository;
pub use vector_index::{build_documents, NoopIndexer};
