use serde_json::Value;
use std::slice;

use super::call::ExtractedCall;

/// Final value of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Single-tool mode: the validated call
    Call(ExtractedCall),
    /// Multi-tool mode: every validated call, in document order
    Calls(Vec<ExtractedCall>),
    /// The model answered without a call and a call was not mandatory
    Text(String),
}

impl ToolOutcome {
    /// All calls carried by the outcome; empty for a text answer
    pub fn calls(&self) -> &[ExtractedCall] {
        match self {
            ToolOutcome::Call(call) => slice::from_ref(call),
            ToolOutcome::Calls(calls) => calls,
            ToolOutcome::Text(_) => &[],
        }
    }

    pub fn into_calls(self) -> Vec<ExtractedCall> {
        match self {
            ToolOutcome::Call(call) => vec![call],
            ToolOutcome::Calls(calls) => calls,
            ToolOutcome::Text(_) => Vec::new(),
        }
    }

    pub fn into_call(self) -> Option<ExtractedCall> {
        match self {
            ToolOutcome::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ToolOutcome::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ToolOutcome::Text(_))
    }

    /// JSON rendering: a call object, an array of calls, or a string
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Call(call) => serde_json::to_value(call).unwrap_or(Value::Null),
            ToolOutcome::Calls(calls) => serde_json::to_value(calls).unwrap_or(Value::Null),
            ToolOutcome::Text(text) => Value::String(text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_single_call_views() {
        let mut params = Map::new();
        params.insert("text".to_string(), json!("laundry"));
        let outcome = ToolOutcome::Call(ExtractedCall::new("AddTodo", params));

        assert_eq!(outcome.calls().len(), 1);
        assert!(!outcome.is_text());
        assert_eq!(
            outcome.to_json(),
            json!({"name": "AddTodo", "parameters": {"text": "laundry"}})
        );
        assert_eq!(outcome.into_call().unwrap().name, "AddTodo");
    }

    #[test]
    fn test_text_outcome_has_no_calls() {
        let outcome = ToolOutcome::Text("I cannot help with that.".to_string());
        assert!(outcome.calls().is_empty());
        assert_eq!(outcome.text(), Some("I cannot help with that."));
        assert!(outcome.into_calls().is_empty());
    }
}
