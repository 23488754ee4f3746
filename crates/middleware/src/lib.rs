pub mod api_middleware;
pub mod security;
pub mod validation;

pub use security::jwt::{Claims, JwtService};
pub use security::password::PasswordService;
