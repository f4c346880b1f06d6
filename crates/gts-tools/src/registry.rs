use std::collections::BTreeMap;

use tracing::debug;

use crate::{ToolName, ToolRequest, ToolResult};

/// A registered tool. Failures are reported in the returned ToolResult,
/// never by panicking.
pub type ToolFn = Box<dyn Fn(&ToolRequest) -> ToolResult + Send + Sync>;

/// Maps tool names to callables.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, ToolFn>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the tool for `name`.
    pub fn register<F>(&mut self, name: ToolName, tool: F)
    where
        F: Fn(&ToolRequest) -> ToolResult + Send + Sync + 'static,
    {
        self.tools.insert(name, Box::new(tool));
    }

    pub fn contains(&self, name: ToolName) -> bool {
        self.tools.contains_key(&name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<ToolName> {
        self.tools.keys().copied().collect()
    }

    /// Invoke the tool for `request.name`. Unregistered names fail with
    /// `unknown tool: <name>`.
    pub fn invoke(&self, request: &ToolRequest) -> ToolResult {
        match self.tools.get(&request.name) {
            Some(tool) => {
                debug!(tool = request.name.as_str(), "invoke");
                tool(request)
            }
            None => ToolResult::failure(format!("unknown tool: {}", request.name)),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
