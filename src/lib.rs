//! KoboldCpp serverless worker library.

pub mod backend;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;

pub use backend::BackendClient;
pub use config::WorkerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::RequestProxy;
