pub mod providers;
pub mod retry;
pub mod session;
pub mod tools;

pub use providers::{GeminiClient, MockClient};
pub use session::{Session, SessionClose, SessionConfig, SessionContext};
pub use tools::{RecallTool, ToolHandler, ToolInvocation, ToolOutcome, ToolRegistry, WebSearchTool};
