//! Prompt construction
//!
//! Every operation gets a fixed system prompt and a user prompt made of the
//! focus-annotated outline plus a JSON summary of the target's surroundings.

use super::operations::IssueTreeOperation;
use crate::tree::ops::{find_parent, get_node_chain};
use crate::tree::{build_issue_tree_yaml, IssueNode, IssueTree, OutlineOptions};
use serde::Serialize;

const SHARED_RULES: &str = "\
You help users build issue trees: hierarchical decompositions of a problem \
into hypotheses, questions, actions and supporting data. Branches under the \
same parent must be mutually exclusive and, together, collectively \
exhaustive (MECE). Keep each node to one short, concrete statement. Never \
repeat a node that already exists at the same level. Node types you may use: \
hypothesis, question, action, data. Never use the type root.";

pub const GENERATE_CHILD_PROMPT: &str = "\
Propose new child nodes for the node marked in the outline. The children \
must break the marked node down further and must not overlap with its \
existing children.";

pub const GENERATE_SIBLING_PROMPT: &str = "\
Propose new sibling nodes for the node marked in the outline. Siblings share \
the marked node's parent and must cover parts of the parent that neither the \
marked node nor its existing siblings already cover.";

pub const COMPLETE_SUBTREE_PROMPT: &str = "\
Complete the subtree below the node marked in the outline. Add nested \
children no deeper than the requested depth, building on any children the \
node already has without duplicating them.";

pub const ASSESS_PROMPT: &str = "\
Assess the quality of the whole issue tree. Score each criterion from 1 \
(poor) to 5 (excellent): MECE structure, logical depth, clarity of wording, \
actionability and coverage of the root problem. Give an overall score from \
0 to 100, concrete strengths, concrete improvements and a short summary.";

pub const SYNTHESIZE_TITLE_PROMPT: &str = "\
Write a concise title for the problem described. The title is a single line \
of at most 150 characters, phrased as the key question the issue tree \
answers. Do not add quotes or a trailing explanation to the title itself.";

/// System prompt for an operation
pub fn system_prompt(operation: &IssueTreeOperation) -> String {
    let specific = match operation {
        IssueTreeOperation::GenerateChild { .. } => GENERATE_CHILD_PROMPT,
        IssueTreeOperation::GenerateSibling { .. } => GENERATE_SIBLING_PROMPT,
        IssueTreeOperation::CompleteSubtree { .. } => COMPLETE_SUBTREE_PROMPT,
        IssueTreeOperation::Assess { .. } => ASSESS_PROMPT,
        IssueTreeOperation::SynthesizeTitle { .. } => SYNTHESIZE_TITLE_PROMPT,
    };
    format!("{}\n\n{}", SHARED_RULES, specific)
}

/// Structured summary of where the operation applies
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    pub operation: &'static str,
    pub target_node_id: String,
    /// Contents from the root down to the target, inclusive
    pub path: Vec<String>,
    pub children: Vec<String>,
    /// Children of the target's parent, without the target. Empty for the root.
    pub siblings: Vec<String>,
}

impl OperationContext {
    /// `None` when `target_node_id` is not in the tree
    pub fn build(
        tree: &IssueTree,
        target_node_id: &str,
        operation: &IssueTreeOperation,
    ) -> Option<Self> {
        let chain = get_node_chain(&tree.root, target_node_id)?;
        let target = chain.last()?;
        let siblings = find_parent(&tree.root, target_node_id)
            .map(|parent| contents_except(&parent.children, target_node_id))
            .unwrap_or_default();

        Some(Self {
            operation: operation.name(),
            target_node_id: target_node_id.to_string(),
            path: chain.iter().map(|n| n.content.clone()).collect(),
            children: target.children.iter().map(|c| c.content.clone()).collect(),
            siblings,
        })
    }
}

fn contents_except(nodes: &[IssueNode], id: &str) -> Vec<String> {
    nodes
        .iter()
        .filter(|n| n.id != id)
        .map(|n| n.content.clone())
        .collect()
}

fn request_line(operation: &IssueTreeOperation) -> String {
    match operation {
        IssueTreeOperation::GenerateChild { count, .. } => {
            format!("Return up to {} new child nodes.", count)
        }
        IssueTreeOperation::GenerateSibling { count, .. } => {
            format!("Return up to {} new sibling nodes.", count)
        }
        IssueTreeOperation::CompleteSubtree { depth, .. } => {
            format!("Return new children nested at most {} levels deep.", depth)
        }
        IssueTreeOperation::Assess { .. } => "Return the assessment.".to_string(),
        IssueTreeOperation::SynthesizeTitle { .. } => {
            "Return a title for the marked node's problem.".to_string()
        }
    }
}

/// User prompt for an edit operation
pub fn user_prompt(tree: &IssueTree, context: &OperationContext, operation: &IssueTreeOperation) -> String {
    let outline = build_issue_tree_yaml(
        tree,
        OutlineOptions {
            focus_node_id: Some(&context.target_node_id),
            focus_label: Some(operation.name()),
        },
    );
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();

    let mut prompt = format!(
        "Issue tree (the target is marked with `# <-- {}`):\n{}\nOperation context:\n{}\n\n{}",
        operation.name(),
        outline,
        context_json,
        request_line(operation)
    );

    if let Some(extra) = operation.instructions().filter(|s| !s.trim().is_empty()) {
        let heading = match operation {
            IssueTreeOperation::Assess { .. } => "Focus the assessment on",
            IssueTreeOperation::SynthesizeTitle { .. } => "Additional context",
            _ => "User instructions",
        };
        prompt.push_str(&format!("\n\n{}: {}", heading, extra.trim()));
    }
    prompt
}

/// User prompt for standalone title synthesis
pub fn synthesis_prompt(problem_statement: &str, context: Option<&str>) -> String {
    let mut prompt = format!("Problem statement:\n{}", problem_statement.trim());
    if let Some(context) = context.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\n\nAdditional context: {}", context.trim()));
    }
    prompt
}
