pub mod accumulator;
pub mod adapters;
pub mod endpoint;
pub mod errors;
pub mod history;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod transport;
