// Utility functions
pub mod codes;
pub mod error;
pub mod thread_pool;  // Dedicated prediction pool

pub use codes::*;
pub use error::*;
pub use thread_pool::*;
