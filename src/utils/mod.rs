pub mod http_client;
pub mod text;

pub use text::{prefix_chars, truncate_with_ellipsis};
