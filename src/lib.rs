// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

// App state for sharing across the application
use config::SelectionConfig;
use services::route_matcher::RouteMatcher;
use services::session::SessionStore;

pub struct AppState {
    pub matcher: RouteMatcher,
    pub sessions: SessionStore,
    pub selection: SelectionConfig,
}
