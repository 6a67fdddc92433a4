pub mod agent;
pub mod tooling;
pub mod tools;
