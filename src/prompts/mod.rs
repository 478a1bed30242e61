//! System prompt composition for the tag-based call protocol.

mod templates;

use crate::types::{ToolChoice, ToolSchema};
use templates::{
    MULTI_FUNCTION_CALLS_OPEN_ENDED, NO_CALL_DIRECTIVE, SINGLE_FUNCTION_OPEN_ENDED,
    SINGLE_FUNCTION_SPECIFIC_CALL, TOOL_MISMATCH_DIRECTIVE, VALIDATION_FEEDBACK_FOOTER,
    VALIDATION_FEEDBACK_HEADER,
};

/// Which instruction block the model receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode<'a> {
    /// Exactly one call, any declared tool
    SingleOpen,
    /// Exactly one call to the named tool
    SingleSpecific(&'a str),
    /// Any number of calls inside `<multiplefunctions>`
    Multiple,
}

impl<'a> PromptMode<'a> {
    /// A tool choice only pins single-tool mode; multi-tool mode stays open-ended.
    pub fn resolve(multiple_tools: bool, tool_choice: Option<&'a ToolChoice>) -> Self {
        match (multiple_tools, tool_choice) {
            (true, _) => PromptMode::Multiple,
            (false, Some(choice)) => PromptMode::SingleSpecific(&choice.name),
            (false, None) => PromptMode::SingleOpen,
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, PromptMode::Multiple)
    }

    pub fn pinned_tool(&self) -> Option<&'a str> {
        match *self {
            PromptMode::SingleSpecific(name) => Some(name),
            _ => None,
        }
    }
}

/// Build the system prompt for `mode`, appending `task` as a labelled directive.
pub fn compose_system_prompt(
    mode: &PromptMode<'_>,
    schemas: &[ToolSchema],
    task: Option<&str>,
) -> String {
    let functions = render_functions(schemas);

    let mut system = match mode {
        PromptMode::SingleOpen => SINGLE_FUNCTION_OPEN_ENDED.replace("{functions}", &functions),
        // Schema text may itself contain `{function_name}`.
        PromptMode::SingleSpecific(name) => SINGLE_FUNCTION_SPECIFIC_CALL
            .replace("{function_name}", name)
            .replace("{functions}", &functions),
        PromptMode::Multiple => MULTI_FUNCTION_CALLS_OPEN_ENDED.replace("{functions}", &functions),
    };

    if let Some(task) = task.map(str::trim).filter(|task| !task.is_empty()) {
        system.push_str("\n\nTask: ");
        system.push_str(task);
    }

    system
}

/// One compact JSON object per schema, separated by blank lines
pub fn render_functions(schemas: &[ToolSchema]) -> String {
    schemas
        .iter()
        .map(|schema| serde_json::to_string(schema).unwrap_or_else(|_| schema.name.clone()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn no_call_directive() -> &'static str {
    NO_CALL_DIRECTIVE
}

pub(crate) fn tool_mismatch_directive(function_name: &str) -> String {
    TOOL_MISMATCH_DIRECTIVE.replace("{function_name}", function_name)
}

pub(crate) fn validation_feedback(errors: &[String]) -> String {
    let mut feedback = String::from(VALIDATION_FEEDBACK_HEADER);
    for error in errors {
        feedback.push_str("\n- ");
        feedback.push_str(error);
    }
    feedback.push('\n');
    feedback.push_str(VALIDATION_FEEDBACK_FOOTER);
    feedback
}
