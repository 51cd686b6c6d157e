pub mod http_client;
pub mod json_extraction;
pub mod text;
