//! Operation requests and the suggestions they produce

use super::schemas::Assessment;
use crate::tree::{NodeDraft, ValidationError, ValidationIssue};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNT: u8 = 3;
pub const MAX_COUNT: u8 = 8;
pub const DEFAULT_DEPTH: u8 = 2;
pub const MAX_DEPTH: u8 = 3;
pub const MAX_INSTRUCTIONS_CHARS: usize = 1000;
pub const MAX_CONTEXT_CHARS: usize = 1000;

fn default_count() -> u8 {
    DEFAULT_COUNT
}

fn default_depth() -> u8 {
    DEFAULT_DEPTH
}

/// What the caller wants done at the target node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum IssueTreeOperation {
    #[serde(rename_all = "camelCase")]
    GenerateChild {
        #[serde(default = "default_count")]
        count: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GenerateSibling {
        #[serde(default = "default_count")]
        count: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CompleteSubtree {
        #[serde(default = "default_depth")]
        depth: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Assess {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SynthesizeTitle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
}

impl IssueTreeOperation {
    /// Wire name, also used as the focus label in prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateChild { .. } => "generate-child",
            Self::GenerateSibling { .. } => "generate-sibling",
            Self::CompleteSubtree { .. } => "complete-subtree",
            Self::Assess { .. } => "assess",
            Self::SynthesizeTitle { .. } => "synthesize-title",
        }
    }

    pub fn instructions(&self) -> Option<&str> {
        match self {
            Self::GenerateChild { instructions, .. }
            | Self::GenerateSibling { instructions, .. }
            | Self::CompleteSubtree { instructions, .. } => instructions.as_deref(),
            Self::Assess { focus } => focus.as_deref(),
            Self::SynthesizeTitle { context } => context.as_deref(),
        }
    }

    /// Check parameter ranges. Issue paths are relative to the request body.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        match self {
            Self::GenerateChild { count, .. } | Self::GenerateSibling { count, .. } => {
                if !(1..=MAX_COUNT).contains(count) {
                    issues.push(ValidationIssue::new(
                        "operation.count",
                        format!("must be between 1 and {}", MAX_COUNT),
                    ));
                }
            }
            Self::CompleteSubtree { depth, .. } => {
                if !(1..=MAX_DEPTH).contains(depth) {
                    issues.push(ValidationIssue::new(
                        "operation.depth",
                        format!("must be between 1 and {}", MAX_DEPTH),
                    ));
                }
            }
            Self::Assess { .. } | Self::SynthesizeTitle { .. } => {}
        }

        let (field, limit) = match self {
            Self::Assess { .. } => ("operation.focus", MAX_INSTRUCTIONS_CHARS),
            Self::SynthesizeTitle { .. } => ("operation.context", MAX_CONTEXT_CHARS),
            _ => ("operation.instructions", MAX_INSTRUCTIONS_CHARS),
        };
        if let Some(text) = self.instructions() {
            if text.chars().count() > limit {
                issues.push(ValidationIssue::new(
                    field,
                    format!("must be at most {} characters", limit),
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

/// Generated change for one target node. The caller decides whether to apply it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum IssueTreeSuggestion {
    #[serde(rename_all = "camelCase")]
    GenerateChild {
        target_node_id: String,
        nodes: Vec<NodeDraft>,
    },
    #[serde(rename_all = "camelCase")]
    GenerateSibling {
        target_node_id: String,
        nodes: Vec<NodeDraft>,
    },
    #[serde(rename_all = "camelCase")]
    CompleteSubtree {
        target_node_id: String,
        children: Vec<NodeDraft>,
    },
    #[serde(rename_all = "camelCase")]
    Assess {
        target_node_id: String,
        assessment: Assessment,
    },
    #[serde(rename_all = "camelCase")]
    SynthesizeTitle {
        target_node_id: String,
        synthesized_title: String,
    },
}

impl IssueTreeSuggestion {
    pub fn target_node_id(&self) -> &str {
        match self {
            Self::GenerateChild { target_node_id, .. }
            | Self::GenerateSibling { target_node_id, .. }
            | Self::CompleteSubtree { target_node_id, .. }
            | Self::Assess { target_node_id, .. }
            | Self::SynthesizeTitle { target_node_id, .. } => target_node_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateChild { .. } => "generate-child",
            Self::GenerateSibling { .. } => "generate-sibling",
            Self::CompleteSubtree { .. } => "complete-subtree",
            Self::Assess { .. } => "assess",
            Self::SynthesizeTitle { .. } => "synthesize-title",
        }
    }
}

/// Body of a successful edit response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionResponse {
    pub suggestion: IssueTreeSuggestion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Body of a successful standalone title synthesis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    pub synthesized_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
