//! Request and response types for issue tree documents

use crate::tree::validate::validate_issue_tree;
use crate::tree::{
    IssueTree, IssueTreeUpdate, ListCursor, TreeSource, ValidationError, ValidationIssue,
};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// A validated request to create a document
#[derive(Debug, Clone)]
pub struct NewIssueTree {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to a single root node holding the title
    pub tree: Option<IssueTree>,
    pub source: TreeSource,
}

/// Options for a whole-document update
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Snapshot the pre-update tree as a revision
    pub semantic: bool,
    pub revision_label: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Pass back as `cursor` to get the next page; `None` on the last page
    pub next_cursor: Option<ListCursor>,
}

// ============================================================================
// Wire requests
// ============================================================================

/// Body of `POST /api/issue-trees`
#[derive(Debug, Deserialize)]
pub struct CreateIssueTreeRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Either `{root: IssueNode}` or a bare root node
    #[serde(default)]
    pub tree: Option<serde_json::Value>,
    #[serde(default)]
    pub source: Option<TreeSource>,
}

impl CreateIssueTreeRequest {
    pub fn validate(self) -> Result<NewIssueTree, ValidationError> {
        let mut issues = Vec::new();
        let title = check_title(&self.title, &mut issues);
        check_description(self.description.as_deref(), &mut issues);
        let tree = self
            .tree
            .as_ref()
            .and_then(|value| check_tree(value, &mut issues));

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }
        Ok(NewIssueTree {
            title,
            description: self.description,
            tree,
            source: self.source.unwrap_or_default(),
        })
    }
}

/// Body of `PATCH /api/issue-trees/{id}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueTreeRequest {
    #[serde(default)]
    pub tree: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub semantic: bool,
    #[serde(default)]
    pub revision_label: Option<String>,
}

impl UpdateIssueTreeRequest {
    pub fn validate(self) -> Result<(IssueTreeUpdate, UpdateOptions), ValidationError> {
        let mut issues = Vec::new();
        if self.tree.is_none() && self.title.is_none() && self.description.is_none() {
            issues.push(ValidationIssue::new(
                "",
                "at least one of tree, title or description is required",
            ));
        }
        let title = self
            .title
            .as_deref()
            .map(|t| check_title(t, &mut issues));
        check_description(self.description.as_deref(), &mut issues);
        let tree = self
            .tree
            .as_ref()
            .and_then(|value| check_tree(value, &mut issues));
        if self
            .revision_label
            .as_deref()
            .is_some_and(|l| l.trim().is_empty())
        {
            issues.push(ValidationIssue::new("revisionLabel", "must not be empty"));
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }
        Ok((
            IssueTreeUpdate {
                tree,
                title,
                description: self.description,
            },
            UpdateOptions {
                semantic: self.semantic,
                revision_label: self.revision_label.map(|l| l.trim().to_string()),
            },
        ))
    }
}

/// Optional body of `POST /api/issue-trees/{id}/fork`
#[derive(Debug, Default, Deserialize)]
pub struct ForkIssueTreeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<TreeSource>,
}

impl ForkIssueTreeRequest {
    /// Returns the checked title override, if any
    pub fn validate(&self) -> Result<Option<String>, ValidationError> {
        let mut issues = Vec::new();
        let title = self.title.as_deref().map(|t| check_title(t, &mut issues));
        if issues.is_empty() {
            Ok(title)
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

fn check_title(title: &str, issues: &mut Vec<ValidationIssue>) -> String {
    let trimmed = title.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        issues.push(ValidationIssue::new(
            "title",
            format!("must be 1 to {} characters", MAX_TITLE_CHARS),
        ));
    }
    trimmed.to_string()
}

fn check_description(description: Option<&str>, issues: &mut Vec<ValidationIssue>) {
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS) {
        issues.push(ValidationIssue::new(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_CHARS),
        ));
    }
}

/// Validate a tree field, re-rooting issue paths under `tree`
pub(crate) fn check_tree(value: &serde_json::Value, issues: &mut Vec<ValidationIssue>) -> Option<IssueTree> {
    match validate_issue_tree(value) {
        Ok(tree) => Some(tree),
        Err(err) => {
            issues.extend(err.issues.into_iter().map(|i| {
                let path = if i.path.is_empty() {
                    "tree".to_string()
                } else {
                    format!("tree.{}", i.path)
                };
                ValidationIssue::new(path, i.message)
            }));
            None
        }
    }
}
