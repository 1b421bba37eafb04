/// Authentication module
///
/// Token issuance and verification, password hashing, the refresh-token
/// slot on user records, and the service that ties them together.

mod claims;
mod clock;
mod jwt;
mod password;
mod service;
mod session;

pub use claims::Claims;
pub use claims::Principal;
pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{TokenCodec, TokenKind};
pub use password::hash_password;
pub use password::verify_password;
pub use service::{AuthService, TokenPair};
pub use session::SessionStore;
