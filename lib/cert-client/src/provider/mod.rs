pub mod certificate_api;
pub mod http_client;
