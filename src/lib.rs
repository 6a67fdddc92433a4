pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, tooling, tools};
pub use domain::{message, tool};
pub use infrastructure::{index, ingest, model};
