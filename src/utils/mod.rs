pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{is_http_url, snapshot_file_stem, snapshot_key};
