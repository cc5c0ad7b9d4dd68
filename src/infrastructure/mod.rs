// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_sink;
pub mod event_stream;
pub mod http_client;
pub mod sample_reader;
