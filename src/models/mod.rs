pub mod prediction;
pub mod user;

pub use prediction::*;
pub use user::*;
