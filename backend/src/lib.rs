// This file acts as the entry point for the `mnemo_backend` library.
// The server binary, the seeding tool and the integration tests all
// build on these modules.
pub mod auth;
pub mod config;
pub mod coordinates;
pub mod db;
pub mod error;
pub mod extractors;
pub mod web_server;
