//! Invocation: delegates one judge call to the Process Manager with a
//! fixed argument list.

use crate::config::JudgeConfig;
use crate::discovery::DiscoveredJudge;
use crate::prompt::JudgeDocument;
use gan_process::{ExecuteOutcome, ExecuteSpec, ProcessError, ProcessManager};

pub async fn invoke(
    discovered: &DiscoveredJudge,
    document: &JudgeDocument,
    config: &JudgeConfig,
    process_manager: &ProcessManager,
) -> Result<ExecuteOutcome, ProcessError> {
    let mut args = vec![
        "audit".to_string(),
        "--format".to_string(),
        "json".to_string(),
        "--headless".to_string(),
        "--stdin".to_string(),
    ];
    if document.system_prompt.is_some() {
        args.push("--enhanced".to_string());
    }
    args.extend(config.extra_args.iter().cloned());

    let stdin =
        serde_json::to_vec(document).expect("JudgeDocument always serializes to valid JSON");

    let spec = ExecuteSpec {
        executable: discovered.executable.clone(),
        args,
        cwd: Some(discovered.working_dir.clone()),
        env: discovered.env.clone(),
        stdin: Some(stdin),
        timeout: config.timeout,
    };

    process_manager.execute(spec).await
}
