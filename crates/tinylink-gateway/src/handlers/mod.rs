mod health;
mod url;

pub use health::health_handler;
pub use url::{redirect_handler, shorten_handler, shorten_segment_redirect_handler};
