use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed set of tool names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetPriceContext,
    EvaluateStrategy,
    SimulateAndVerify,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetPriceContext => "get_price_context",
            ToolName::EvaluateStrategy => "evaluate_strategy",
            ToolName::SimulateAndVerify => "simulate_and_verify",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolRequest {
    pub name: ToolName,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(name: ToolName) -> Self {
        Self {
            name,
            args: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }
}

/// Outcome of one tool invocation. `error` is set iff `ok` is false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolResult {
    pub ok: bool,
    #[serde(default)]
    pub output: Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result. Non-object outputs are wrapped as `{"value": ...}`.
    pub fn success(output: Value) -> Self {
        let output = match output {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            ok: true,
            output,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            output: Map::new(),
            error: Some(error.into()),
        }
    }
}

/// Which ceiling a budget breach hit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLimiter {
    MaxSteps,
    MaxToolCalls,
    MaxModelCalls,
    MaxMemoryOps,
    MaxMemoryBytes,
}

impl BudgetLimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetLimiter::MaxSteps => "max_steps",
            BudgetLimiter::MaxToolCalls => "max_tool_calls",
            BudgetLimiter::MaxModelCalls => "max_model_calls",
            BudgetLimiter::MaxMemoryOps => "max_memory_ops",
            BudgetLimiter::MaxMemoryBytes => "max_memory_bytes",
        }
    }

    /// Error string carried by a breach result.
    pub fn breach_message(&self) -> String {
        format!("budget exceeded: {}", self.as_str())
    }
}

impl std::fmt::Display for BudgetLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for BudgetLimiter {}

/// Caller-supplied ceilings for one bounded execution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_steps: u64,
    pub max_tool_calls: u64,
    #[serde(default)]
    pub max_model_calls: u64,
    #[serde(default)]
    pub max_memory_ops: u64,
    #[serde(default)]
    pub max_memory_bytes: u64,
}

impl Budget {
    pub fn new(max_steps: u64, max_tool_calls: u64) -> Self {
        Self {
            max_steps,
            max_tool_calls,
            max_model_calls: 0,
            max_memory_ops: 0,
            max_memory_bytes: 0,
        }
    }

    pub fn with_memory(mut self, max_memory_ops: u64, max_memory_bytes: u64) -> Self {
        self.max_memory_ops = max_memory_ops;
        self.max_memory_bytes = max_memory_bytes;
        self
    }

    pub fn with_model_calls(mut self, max_model_calls: u64) -> Self {
        self.max_model_calls = max_model_calls;
        self
    }
}

/// Running counters. Only the loop (or a metered memory wrapper) mutates them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetState {
    pub steps: u64,
    pub tool_calls: u64,
    pub model_calls: u64,
    pub memory_ops: u64,
    pub memory_bytes: u64,
}

impl BudgetState {
    pub fn increment_step(&mut self) {
        self.steps += 1;
    }

    pub fn increment_tool_calls(&mut self) {
        self.tool_calls += 1;
    }

    pub fn increment_model_calls(&mut self) {
        self.model_calls += 1;
    }

    pub fn increment_memory_ops(&mut self) {
        self.memory_ops += 1;
    }

    pub fn add_memory_bytes(&mut self, bytes: u64) {
        self.memory_bytes = self.memory_bytes.saturating_add(bytes);
    }

    /// First ceiling exceeded, checked in a fixed order.
    pub fn first_breach(&self, budget: &Budget) -> Option<BudgetLimiter> {
        if self.steps > budget.max_steps {
            Some(BudgetLimiter::MaxSteps)
        } else if self.tool_calls > budget.max_tool_calls {
            Some(BudgetLimiter::MaxToolCalls)
        } else if self.model_calls > budget.max_model_calls {
            Some(BudgetLimiter::MaxModelCalls)
        } else if self.memory_ops > budget.max_memory_ops {
            Some(BudgetLimiter::MaxMemoryOps)
        } else if self.memory_bytes > budget.max_memory_bytes {
            Some(BudgetLimiter::MaxMemoryBytes)
        } else {
            None
        }
    }

    pub fn within_budget(&self, budget: &Budget) -> bool {
        self.first_breach(budget).is_none()
    }
}
