pub mod aggregator;
pub mod config;
pub mod error;
pub mod file_reader;
pub mod logger;
pub mod model;
pub mod route;
pub mod shutdown;
pub mod upstream;
pub mod view_state;
