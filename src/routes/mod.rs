mod auth;
mod feed;
mod health_check;

pub use auth::{get_status, log_in, log_out, refresh, sign_up, update_status};
pub use feed::{create_post, delete_post, get_post, get_posts, update_post};
pub use health_check::health_check;
