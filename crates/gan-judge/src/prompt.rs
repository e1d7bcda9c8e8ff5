//! Structured prompt assembly: builds the single document sent to the
//! judge on standard input.

use gan_core::{AuditRequest, Budget, RubricDimension};
use serde::Serialize;

const BASE_INSTRUCTIONS: &[&str] = &[
    "Evaluate each rubric dimension on a 0-100 scale.",
    "Compute the overall score as the rubric-weighted average of the dimension scores.",
    "Emit actionable inline comments anchored to specific files and lines.",
    "Emit citations in the form repo://path:start-end.",
    "Return a structured response matching the documented verdict schema.",
];

const ENHANCED_INSTRUCTIONS: &[&str] = &[
    "Execute the workflow steps declared in the system prompt in order.",
    "Emit a workflow_steps array with evidence and issues for each step.",
    "Emit a completion_analysis with a status and a next-step flag.",
];

/// The document handed to the judge on stdin: a single structured-data
/// object.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeDocument {
    pub task: String,
    pub candidate: String,
    pub context_pack: String,
    pub rubric: Vec<RubricDimension>,
    pub budget: Budget,
    pub instructions: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_instructions: Option<Vec<&'static str>>,
}

pub fn assemble(request: &AuditRequest) -> JudgeDocument {
    let enhanced = request.system_prompt.is_some();
    JudgeDocument {
        task: request.task.clone(),
        candidate: request.candidate.clone(),
        context_pack: request.context_pack.clone(),
        rubric: request.rubric.clone(),
        budget: request.budget,
        instructions: BASE_INSTRUCTIONS.to_vec(),
        system_prompt: request.system_prompt.clone(),
        enhanced_instructions: enhanced.then(|| ENHANCED_INSTRUCTIONS.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system_prompt: Option<&str>) -> AuditRequest {
        AuditRequest {
            task: "review".to_string(),
            candidate: "fn main() {}".to_string(),
            context_pack: "git diff --stat".to_string(),
            rubric: vec![RubricDimension {
                name: "correctness".to_string(),
                weight: 1.0,
                description: None,
            }],
            budget: Budget {
                max_cycles: 1,
                candidates: 1,
                threshold: 85,
            },
            system_prompt: system_prompt.map(str::to_string),
        }
    }

    #[test]
    fn test_assemble_without_system_prompt_has_no_enhanced_fields() {
        let doc = assemble(&request(None));
        assert!(doc.system_prompt.is_none());
        assert!(doc.enhanced_instructions.is_none());
        assert_eq!(doc.instructions.len(), BASE_INSTRUCTIONS.len());
    }

    #[test]
    fn test_assemble_with_system_prompt_adds_enhanced_instructions() {
        let doc = assemble(&request(Some("run the workflow")));
        assert_eq!(doc.system_prompt.as_deref(), Some("run the workflow"));
        assert!(doc.enhanced_instructions.is_some());
    }

    #[test]
    fn test_document_serializes_to_json() {
        let doc = assemble(&request(None));
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("system_prompt").is_none());
        assert_eq!(value["task"], "review");
    }
}
