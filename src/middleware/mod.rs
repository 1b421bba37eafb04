/// Middleware module
///
/// Access-token gate for protected scopes.

mod jwt_middleware;

pub use jwt_middleware::authenticate;
pub use jwt_middleware::JwtMiddleware;
