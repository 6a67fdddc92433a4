mod errors;
mod extractor;
mod models;
mod runner;


pub use errors::AgentError;
pub use extractor::{FALLBACK_CALL_ID, Route, route_message};
pub use models::{AgentOptions, AgentOutcome, AgentStep};
pub use runner::Agent;
