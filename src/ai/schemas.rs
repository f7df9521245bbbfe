//! Response schemas for structured generation, and the typed outputs parsed
//! from them
//!
//! Schemas are written for strict JSON-schema mode: every property is listed
//! in `required`, optional values are nullable, and no extra properties are
//! allowed. Recursive subtrees are unrolled to the requested depth.

use crate::tree::validate::MAX_CONTENT_CHARS;
use crate::tree::{NodeDraft, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const GENERATED_NODES: &str = "generated_nodes";
pub const GENERATED_SUBTREE: &str = "generated_subtree";
pub const TREE_ASSESSMENT: &str = "tree_assessment";
pub const SYNTHESIZED_TITLE: &str = "synthesized_title";

pub const MAX_TITLE_CHARS: usize = 150;

/// One rubric line of an assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriterionScore {
    pub criterion: String,
    /// 1 (poor) ..= 5 (excellent)
    pub score: u8,
    pub rationale: String,
}

/// Rubric-based quality assessment of an issue tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// 0 ..= 100
    pub overall_score: u8,
    pub criteria: Vec<CriterionScore>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct NodesOutput {
    pub nodes: Vec<NodeDraft>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubtreeOutput {
    pub children: Vec<NodeDraft>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssessmentOutput {
    pub assessment: Assessment,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleOutput {
    pub synthesized_title: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

// ============================================================================
// Schemas
// ============================================================================

fn node_type_enum() -> Value {
    let names: Vec<&str> = NodeType::NON_ROOT.iter().map(|t| t.as_str()).collect();
    json!({ "type": "string", "enum": names })
}

fn explanation_schema() -> Value {
    json!({ "type": ["string", "null"] })
}

fn flat_node_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string" },
            "type": node_type_enum()
        },
        "required": ["content", "type"],
        "additionalProperties": false
    })
}

/// Up to `count` new nodes
pub fn generated_nodes_schema(count: u8) -> Value {
    json!({
        "type": "object",
        "properties": {
            "nodes": {
                "type": "array",
                "items": flat_node_schema(),
                "minItems": 1,
                "maxItems": count
            },
            "explanation": explanation_schema()
        },
        "required": ["nodes", "explanation"],
        "additionalProperties": false
    })
}

fn subtree_node_schema(levels: u8) -> Value {
    if levels <= 1 {
        return flat_node_schema();
    }
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string" },
            "type": node_type_enum(),
            "children": {
                "type": "array",
                "items": subtree_node_schema(levels - 1)
            }
        },
        "required": ["content", "type", "children"],
        "additionalProperties": false
    })
}

/// Nested children at most `depth` levels below the target
pub fn generated_subtree_schema(depth: u8) -> Value {
    json!({
        "type": "object",
        "properties": {
            "children": {
                "type": "array",
                "items": subtree_node_schema(depth),
                "minItems": 1
            },
            "explanation": explanation_schema()
        },
        "required": ["children", "explanation"],
        "additionalProperties": false
    })
}

pub fn assessment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "assessment": {
                "type": "object",
                "properties": {
                    "overallScore": { "type": "integer", "minimum": 0, "maximum": 100 },
                    "criteria": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "criterion": { "type": "string" },
                                "score": { "type": "integer", "minimum": 1, "maximum": 5 },
                                "rationale": { "type": "string" }
                            },
                            "required": ["criterion", "score", "rationale"],
                            "additionalProperties": false
                        }
                    },
                    "strengths": { "type": "array", "items": { "type": "string" } },
                    "improvements": { "type": "array", "items": { "type": "string" } },
                    "summary": { "type": "string" }
                },
                "required": ["overallScore", "criteria", "strengths", "improvements", "summary"],
                "additionalProperties": false
            },
            "explanation": explanation_schema()
        },
        "required": ["assessment", "explanation"],
        "additionalProperties": false
    })
}

pub fn synthesized_title_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "synthesizedTitle": { "type": "string", "minLength": 1, "maxLength": MAX_TITLE_CHARS },
            "explanation": explanation_schema()
        },
        "required": ["synthesizedTitle", "explanation"],
        "additionalProperties": false
    })
}

// ============================================================================
// Output checks
//
// Providers do not always honour the schema, so the ranges are checked again
// after decoding.
// ============================================================================

fn check_draft(draft: &NodeDraft, levels_left: u8, path: &str) -> Result<(), String> {
    if draft.node_type == NodeType::Root {
        return Err(format!("{}: generated node has type 'root'", path));
    }
    let content = draft.content.trim();
    if content.is_empty() {
        return Err(format!("{}: generated node has empty content", path));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(format!("{}: generated content is too long", path));
    }
    if !draft.children.is_empty() && levels_left <= 1 {
        return Err(format!("{}: generated subtree is deeper than requested", path));
    }
    for (i, child) in draft.children.iter().enumerate() {
        check_draft(child, levels_left - 1, &format!("{}.children[{}]", path, i))?;
    }
    Ok(())
}

/// Flat node list: 1..=`count` entries, no nested children
pub fn check_nodes(nodes: &[NodeDraft], count: u8) -> Result<(), String> {
    if nodes.is_empty() || nodes.len() > count as usize {
        return Err(format!(
            "expected between 1 and {} nodes, got {}",
            count,
            nodes.len()
        ));
    }
    for (i, node) in nodes.iter().enumerate() {
        check_draft(node, 1, &format!("nodes[{}]", i))?;
    }
    Ok(())
}

/// Nested subtree no deeper than `depth` levels
pub fn check_subtree(children: &[NodeDraft], depth: u8) -> Result<(), String> {
    if children.is_empty() {
        return Err("expected at least one child".to_string());
    }
    for (i, child) in children.iter().enumerate() {
        check_draft(child, depth, &format!("children[{}]", i))?;
    }
    Ok(())
}

pub fn check_assessment(assessment: &Assessment) -> Result<(), String> {
    if assessment.overall_score > 100 {
        return Err(format!(
            "overallScore {} is out of range 0..=100",
            assessment.overall_score
        ));
    }
    if assessment.criteria.is_empty() {
        return Err("assessment has no criteria".to_string());
    }
    if let Some(c) = assessment
        .criteria
        .iter()
        .find(|c| !(1..=5).contains(&c.score))
    {
        return Err(format!(
            "criterion '{}' score {} is out of range 1..=5",
            c.criterion, c.score
        ));
    }
    Ok(())
}

/// Trimmed title of 1..=150 characters
pub fn check_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        return Err(format!(
            "synthesized title must be 1..={} characters, got {}",
            MAX_TITLE_CHARS, len
        ));
    }
    Ok(title.to_string())
}
