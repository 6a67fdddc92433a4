mod registry;

pub use registry::{ToolError, ToolExecution, ToolHandler, ToolRegistry, ToolSpec};
