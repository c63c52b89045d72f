pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod upload;

pub use config::{Config, get_configuration};
pub use error::ApiError;
pub use server::{build_router, run};
pub use state::AppState;
