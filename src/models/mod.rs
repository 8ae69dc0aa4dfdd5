mod like;
mod post;
mod user;

pub use like::LikeGraph;
pub use post::{normalize_category, Post};
pub use user::User;
