// Append-only store backends
pub mod memory;
pub mod postgrest_backend;
pub mod sqlite_backend;
pub mod r#trait;

pub use memory::MemoryStore;
pub use postgrest_backend::PostgrestStore;
pub use r#trait::{Ack, AppendOnlyStore};
pub use sqlite_backend::SqliteStore;

use crate::error::{AppError, Result};

const MAX_IDENTIFIER_LEN: usize = 63;

/// Check that `name` is safe to use as a table or column name: ASCII letters,
/// digits and underscores, not starting with a digit.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(AppError::InvalidIdentifier(name.to_string()))
    }
}
