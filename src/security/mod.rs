pub mod cors;
pub mod password;

pub use cors::CorsConfig;
pub use password::{PasswordError, PasswordHasher};
