pub mod api_client;
pub mod config;
pub mod merger;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prices;
pub mod progress;
pub mod scoring;
pub mod sources;
