//! Applying a suggestion to a tree

use super::operations::IssueTreeSuggestion;
use crate::tree::ops::{insert_child, insert_sibling, update_content};
use crate::tree::{IssueTree, NodeDraft, TreeError};

/// Apply a generated suggestion and return the new tree.
///
/// Children and subtrees are appended under the target, siblings under the
/// target's parent, and a synthesized title replaces the target's content.
/// Assessments carry no edit and are rejected.
pub fn apply_suggestion(
    tree: &IssueTree,
    suggestion: &IssueTreeSuggestion,
) -> Result<IssueTree, TreeError> {
    match suggestion {
        IssueTreeSuggestion::GenerateChild {
            target_node_id,
            nodes,
        }
        | IssueTreeSuggestion::CompleteSubtree {
            target_node_id,
            children: nodes,
        } => append_all(tree, nodes, |t, d| insert_child(t, target_node_id, d, None)),
        IssueTreeSuggestion::GenerateSibling {
            target_node_id,
            nodes,
        } => append_all(tree, nodes, |t, d| insert_sibling(t, target_node_id, d, None)),
        IssueTreeSuggestion::SynthesizeTitle {
            target_node_id,
            synthesized_title,
        } => update_content(tree, target_node_id, synthesized_title),
        IssueTreeSuggestion::Assess { .. } => Err(TreeError::InvalidOperation(
            "An assessment cannot be applied to a tree".to_string(),
        )),
    }
}

fn append_all<F>(tree: &IssueTree, drafts: &[NodeDraft], insert: F) -> Result<IssueTree, TreeError>
where
    F: Fn(&IssueTree, NodeDraft) -> Result<(IssueTree, String), TreeError>,
{
    drafts.iter().try_fold(tree.clone(), |current, draft| {
        insert(&current, draft.clone()).map(|(next, _)| next)
    })
}
