// Service layer modules
pub mod error_handler;
pub mod error_service;

// Re-exports for convenience
pub use error_handler::ErrorHandler;
pub use error_service::{ErrorService, GLOBAL_SCOPE};
