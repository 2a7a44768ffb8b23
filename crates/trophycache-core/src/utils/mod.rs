//! Utility functions for formatting values shown to users.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{calculate_percentage, format_age, format_unlock_date, truncate_string};
