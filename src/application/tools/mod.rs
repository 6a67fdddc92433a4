mod plan;
mod search;

pub use plan::{EdaPlan, EdaPlanTool, PLAN_TOOL_NAME};
pub use search::{NO_RESULTS_MESSAGE, SEARCH_TOOL_NAME, SearchKbTool};
