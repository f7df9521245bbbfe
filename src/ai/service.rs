//! Issue tree AI service
//!
//! Resolves the target, renders prompt context, runs one structured
//! generation call and turns the checked output into a suggestion.

use super::operations::{
    IssueTreeOperation, IssueTreeSuggestion, SuggestionResponse, SynthesisResponse,
    MAX_CONTEXT_CHARS,
};
use super::prompts::{self, OperationContext};
use super::schemas::{self, Assessment, AssessmentOutput, NodesOutput, SubtreeOutput, TitleOutput};
use crate::cache::{CacheStore, JsonCache};
use crate::llm::{GenerationError, GenerationProvider, StructuredRequest};
use crate::tree::{assessment_cache_key, IssueTree, ValidationError, ValidationIssue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const MAX_PROBLEM_STATEMENT_CHARS: usize = 5000;

/// Failures of an AI operation
#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Target node not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The provider answered with something that does not fit the schema
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl From<GenerationError> for AiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Upstream(msg) => AiError::Upstream(msg),
            GenerationError::InvalidOutput(msg) => AiError::Generation(msg),
        }
    }
}

pub struct IssueTreeAiService {
    provider: Arc<dyn GenerationProvider>,
    cache: JsonCache,
    assessment_ttl: Duration,
}

impl IssueTreeAiService {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        cache: Arc<dyn CacheStore>,
        assessment_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache: JsonCache::new(cache),
            assessment_ttl,
        }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Run `operation` against `target_node_id` and return the suggestion.
    /// The tree itself is never modified.
    pub async fn generate_issue_tree_suggestion(
        &self,
        tree: &IssueTree,
        target_node_id: &str,
        operation: &IssueTreeOperation,
    ) -> Result<SuggestionResponse, AiError> {
        let context = OperationContext::build(tree, target_node_id, operation)
            .ok_or_else(|| AiError::TargetNotFound(target_node_id.to_string()))?;
        operation.validate()?;

        if matches!(operation, IssueTreeOperation::GenerateSibling { .. })
            && tree.root.id == target_node_id
        {
            return Err(AiError::InvalidOperation(
                "The root node cannot have siblings".to_string(),
            ));
        }

        let request = StructuredRequest {
            schema_name: String::new(),
            schema: serde_json::Value::Null,
            system_prompt: prompts::system_prompt(operation),
            user_prompt: prompts::user_prompt(tree, &context, operation),
        };
        let target_node_id = target_node_id.to_string();

        tracing::debug!(
            operation = operation.name(),
            target = %target_node_id,
            model = self.provider.model_name(),
            "Generating issue tree suggestion"
        );

        let response = match operation {
            IssueTreeOperation::GenerateChild { count, .. }
            | IssueTreeOperation::GenerateSibling { count, .. } => {
                let output: NodesOutput = self
                    .generate(request.with_schema(
                        schemas::GENERATED_NODES,
                        schemas::generated_nodes_schema(*count),
                    ))
                    .await?;
                schemas::check_nodes(&output.nodes, *count).map_err(AiError::Generation)?;
                let suggestion = if matches!(operation, IssueTreeOperation::GenerateChild { .. }) {
                    IssueTreeSuggestion::GenerateChild {
                        target_node_id,
                        nodes: output.nodes,
                    }
                } else {
                    IssueTreeSuggestion::GenerateSibling {
                        target_node_id,
                        nodes: output.nodes,
                    }
                };
                SuggestionResponse {
                    suggestion,
                    explanation: output.explanation,
                }
            }
            IssueTreeOperation::CompleteSubtree { depth, .. } => {
                let output: SubtreeOutput = self
                    .generate(request.with_schema(
                        schemas::GENERATED_SUBTREE,
                        schemas::generated_subtree_schema(*depth),
                    ))
                    .await?;
                schemas::check_subtree(&output.children, *depth).map_err(AiError::Generation)?;
                SuggestionResponse {
                    suggestion: IssueTreeSuggestion::CompleteSubtree {
                        target_node_id,
                        children: output.children,
                    },
                    explanation: output.explanation,
                }
            }
            IssueTreeOperation::Assess { .. } => {
                let output: AssessmentOutput = self
                    .generate(
                        request.with_schema(schemas::TREE_ASSESSMENT, schemas::assessment_schema()),
                    )
                    .await?;
                schemas::check_assessment(&output.assessment).map_err(AiError::Generation)?;
                SuggestionResponse {
                    suggestion: IssueTreeSuggestion::Assess {
                        target_node_id,
                        assessment: output.assessment,
                    },
                    explanation: output.explanation,
                }
            }
            IssueTreeOperation::SynthesizeTitle { .. } => {
                let output: TitleOutput = self
                    .generate(request.with_schema(
                        schemas::SYNTHESIZED_TITLE,
                        schemas::synthesized_title_schema(),
                    ))
                    .await?;
                let title =
                    schemas::check_title(&output.synthesized_title).map_err(AiError::Generation)?;
                SuggestionResponse {
                    suggestion: IssueTreeSuggestion::SynthesizeTitle {
                        target_node_id,
                        synthesized_title: title,
                    },
                    explanation: output.explanation,
                }
            }
        };

        Ok(response)
    }

    /// Assess the whole tree, served from cache when a fresh entry exists for
    /// its fingerprint. Cache failures never reach the caller.
    pub async fn assess_issue_tree(&self, tree: &IssueTree) -> Result<Assessment, AiError> {
        let key = assessment_cache_key(tree);
        if let Some(cached) = self.cache.get_json::<Assessment>(&key).await {
            tracing::debug!(key = %key, "Assessment cache hit");
            return Ok(cached);
        }

        let response = self
            .generate_issue_tree_suggestion(
                tree,
                &tree.root.id,
                &IssueTreeOperation::Assess { focus: None },
            )
            .await?;
        let IssueTreeSuggestion::Assess { assessment, .. } = response.suggestion else {
            return Err(AiError::Generation(
                "assess operation produced a non-assessment suggestion".to_string(),
            ));
        };

        self.cache
            .set_json(&key, &assessment, self.assessment_ttl)
            .await;
        Ok(assessment)
    }

    /// Title for a free-text problem statement
    pub async fn synthesize_title(
        &self,
        problem_statement: &str,
        context: Option<&str>,
    ) -> Result<SynthesisResponse, AiError> {
        let mut issues = Vec::new();
        let statement_len = problem_statement.trim().chars().count();
        if statement_len == 0 || statement_len > MAX_PROBLEM_STATEMENT_CHARS {
            issues.push(ValidationIssue::new(
                "problemStatement",
                format!("must be 1 to {} characters", MAX_PROBLEM_STATEMENT_CHARS),
            ));
        }
        if context.is_some_and(|c| c.chars().count() > MAX_CONTEXT_CHARS) {
            issues.push(ValidationIssue::new(
                "context",
                format!("must be at most {} characters", MAX_CONTEXT_CHARS),
            ));
        }
        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }

        let operation = IssueTreeOperation::SynthesizeTitle {
            context: context.map(str::to_string),
        };
        let request = StructuredRequest {
            schema_name: schemas::SYNTHESIZED_TITLE.to_string(),
            schema: schemas::synthesized_title_schema(),
            system_prompt: prompts::system_prompt(&operation),
            user_prompt: prompts::synthesis_prompt(problem_statement, context),
        };

        let output: TitleOutput = self.generate(request).await?;
        let synthesized_title =
            schemas::check_title(&output.synthesized_title).map_err(AiError::Generation)?;
        Ok(SynthesisResponse {
            synthesized_title,
            explanation: output.explanation,
        })
    }

    async fn generate<T: DeserializeOwned>(&self, request: StructuredRequest) -> Result<T, AiError> {
        let value = self.provider.generate_object(&request).await.map_err(|e| {
            tracing::warn!(schema = %request.schema_name, "Generation call failed: {}", e);
            AiError::from(e)
        })?;
        serde_json::from_value(value).map_err(|e| {
            AiError::Generation(format!(
                "output does not match schema '{}': {}",
                request.schema_name, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::mock::FailingCacheStore;
    use crate::cache::MemoryCache;
    use crate::llm::MockGenerationProvider;
    use crate::tree::{IssueNode, NodeType};
    use serde_json::json;

    /// root "Profitability is declining"
    /// ├─ rev "Revenue is decreasing"
    /// └─ cost "Costs are increasing"
    fn profitability_tree() -> IssueTree {
        let mut root = IssueNode::new_root("Profitability is declining");
        root.id = "root".into();
        let mut rev = IssueNode::new("Revenue is decreasing", NodeType::Hypothesis);
        rev.id = "rev".into();
        let mut cost = IssueNode::new("Costs are increasing", NodeType::Hypothesis);
        cost.id = "cost".into();
        IssueTree::new(root.with_child(rev).with_child(cost))
    }

    fn assessment_json() -> serde_json::Value {
        json!({
            "assessment": {
                "overallScore": 64,
                "criteria": [
                    {"criterion": "MECE", "score": 3, "rationale": "Revenue and cost split is exhaustive"}
                ],
                "strengths": ["Clear top-level split"],
                "improvements": ["Break down revenue further"],
                "summary": "A reasonable start"
            },
            "explanation": null
        })
    }

    fn service(provider: Arc<MockGenerationProvider>, cache: Arc<dyn CacheStore>) -> IssueTreeAiService {
        IssueTreeAiService::new(provider, cache, Duration::from_secs(60))
    }

    fn all_operations() -> Vec<IssueTreeOperation> {
        vec![
            IssueTreeOperation::GenerateChild {
                count: 3,
                instructions: None,
            },
            IssueTreeOperation::GenerateSibling {
                count: 3,
                instructions: None,
            },
            IssueTreeOperation::CompleteSubtree {
                depth: 2,
                instructions: None,
            },
            IssueTreeOperation::Assess { focus: None },
            IssueTreeOperation::SynthesizeTitle { context: None },
        ]
    }

    #[tokio::test]
    async fn test_target_not_found_for_every_operation() {
        let provider = Arc::new(MockGenerationProvider::new());
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));
        let tree = profitability_tree();

        for op in all_operations() {
            let err = svc
                .generate_issue_tree_suggestion(&tree, "nope", &op)
                .await
                .unwrap_err();
            assert!(
                matches!(err, AiError::TargetNotFound(ref id) if id == "nope"),
                "{} gave {:?}",
                op.name(),
                err
            );
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_child_on_revenue_node() {
        let provider = Arc::new(MockGenerationProvider::new().with_response(
            schemas::GENERATED_NODES,
            json!({
                "nodes": [
                    {"content": "Fewer customers", "type": "hypothesis"},
                    {"content": "Lower average order value", "type": "hypothesis"}
                ],
                "explanation": "Revenue = customers x order value"
            }),
        ));
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));
        let op = IssueTreeOperation::GenerateChild {
            count: 3,
            instructions: None,
        };

        let response = svc
            .generate_issue_tree_suggestion(&profitability_tree(), "rev", &op)
            .await
            .unwrap();

        assert_eq!(response.suggestion.target_node_id(), "rev");
        assert_eq!(response.suggestion.name(), "generate-child");
        match &response.suggestion {
            IssueTreeSuggestion::GenerateChild { nodes, .. } => assert_eq!(nodes.len(), 2),
            other => panic!("unexpected suggestion {:?}", other),
        }
        assert_eq!(
            response.explanation.as_deref(),
            Some("Revenue = customers x order value")
        );

        let request = &provider.requests()[0];
        assert_eq!(request.schema_name, schemas::GENERATED_NODES);
        assert!(request
            .user_prompt
            .contains("\"Revenue is decreasing\"  # <-- generate-child"));
        assert_eq!(request.schema["properties"]["nodes"]["maxItems"], 3);
    }

    #[tokio::test]
    async fn test_sibling_of_root_is_invalid() {
        let provider = Arc::new(MockGenerationProvider::new());
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));
        let op = IssueTreeOperation::GenerateSibling {
            count: 2,
            instructions: None,
        };
        let err = svc
            .generate_issue_tree_suggestion(&profitability_tree(), "root", &op)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidOperation(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_parameters_are_validation_errors() {
        let provider = Arc::new(MockGenerationProvider::new());
        let svc = service(provider, Arc::new(MemoryCache::new(10)));
        let op = IssueTreeOperation::CompleteSubtree {
            depth: 7,
            instructions: None,
        };
        let err = svc
            .generate_issue_tree_suggestion(&profitability_tree(), "cost", &op)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_output_outside_schema_is_generation_failure() {
        let provider = Arc::new(MockGenerationProvider::new().with_response(
            schemas::GENERATED_NODES,
            json!({"nodes": [{"content": "Another root", "type": "root"}]}),
        ));
        let svc = service(provider, Arc::new(MemoryCache::new(10)));
        let op = IssueTreeOperation::GenerateChild {
            count: 3,
            instructions: None,
        };
        let err = svc
            .generate_issue_tree_suggestion(&profitability_tree(), "rev", &op)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Generation(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let provider = Arc::new(MockGenerationProvider::failing("rate limited"));
        let svc = service(provider, Arc::new(MemoryCache::new(10)));
        let err = svc
            .generate_issue_tree_suggestion(
                &profitability_tree(),
                "root",
                &IssueTreeOperation::Assess { focus: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Upstream(ref m) if m == "rate limited"));
    }

    #[tokio::test]
    async fn test_complete_subtree() {
        let provider = Arc::new(MockGenerationProvider::new().with_response(
            schemas::GENERATED_SUBTREE,
            json!({
                "children": [{
                    "content": "Supplier prices rose",
                    "type": "hypothesis",
                    "children": [{"content": "Compare supplier quotes", "type": "action"}]
                }],
                "explanation": null
            }),
        ));
        let svc = service(provider, Arc::new(MemoryCache::new(10)));
        let op = IssueTreeOperation::CompleteSubtree {
            depth: 2,
            instructions: None,
        };
        let response = svc
            .generate_issue_tree_suggestion(&profitability_tree(), "cost", &op)
            .await
            .unwrap();
        match response.suggestion {
            IssueTreeSuggestion::CompleteSubtree { children, .. } => {
                assert_eq!(children[0].children[0].node_type, NodeType::Action);
            }
            other => panic!("unexpected suggestion {:?}", other),
        }
        assert!(response.explanation.is_none());
    }

    #[tokio::test]
    async fn test_assessment_is_cached_by_fingerprint() {
        let provider = Arc::new(
            MockGenerationProvider::new().with_response(schemas::TREE_ASSESSMENT, assessment_json()),
        );
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));
        let tree = profitability_tree();

        let first = svc.assess_issue_tree(&tree).await.unwrap();
        let second = svc.assess_issue_tree(&tree).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.overall_score, 64);
        assert_eq!(provider.calls(), 1);

        // a changed tree has a different fingerprint
        let mut changed = tree.clone();
        changed.root.content = "Profit fell".into();
        svc.assess_issue_tree(&changed).await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_assessment_survives_cache_outage() {
        let provider = Arc::new(
            MockGenerationProvider::new().with_response(schemas::TREE_ASSESSMENT, assessment_json()),
        );
        let svc = service(provider.clone(), Arc::new(FailingCacheStore));
        let tree = profitability_tree();

        assert!(svc.assess_issue_tree(&tree).await.is_ok());
        assert!(svc.assess_issue_tree(&tree).await.is_ok());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_title() {
        let provider = Arc::new(MockGenerationProvider::new().with_response(
            schemas::SYNTHESIZED_TITLE,
            json!({"synthesizedTitle": " Why is profitability declining? ", "explanation": "Key question"}),
        ));
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));

        let response = svc
            .synthesize_title("Our margins fell five points this year", Some("retail chain"))
            .await
            .unwrap();
        assert_eq!(response.synthesized_title, "Why is profitability declining?");
        assert!(provider.requests()[0]
            .user_prompt
            .contains("Additional context: retail chain"));
    }

    #[tokio::test]
    async fn test_synthesize_title_validates_input() {
        let provider = Arc::new(MockGenerationProvider::new());
        let svc = service(provider.clone(), Arc::new(MemoryCache::new(10)));

        let long_context = "c".repeat(1001);
        let err = svc
            .synthesize_title("   ", Some(long_context.as_str()))
            .await
            .unwrap_err();
        match err {
            AiError::Validation(v) => {
                let paths: Vec<_> = v.issues.iter().map(|i| i.path.clone()).collect();
                assert_eq!(paths, vec!["problemStatement", "context"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(provider.calls(), 0);
    }
}
