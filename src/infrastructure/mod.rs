// Infrastructure layer - External dependencies and adapters
pub mod care_api_client;
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod ws_transport;
