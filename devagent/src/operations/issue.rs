use anyhow::Result;
use tracing::{info, instrument, warn};

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::extract::extract_triple;
use crate::core::types::{ExecutionResult, Payload};
use crate::io::github::IssueRequest;

/// File an issue drafted by the model from an error log.
pub struct CreateIssueFromLog;

impl OperationExecutor for CreateIssueFromLog {
    fn operation(&self) -> Operation {
        Operation::CreateIssueFromLog
    }

    #[instrument(skip_all, fields(op = "create_github_issue_from_error_log"))]
    fn execute(&self, tools: &Toolbox<'_>, args: &ResolvedArguments) -> Result<ExecutionResult> {
        let name = self.operation().name();
        let error_log = args.require("error_log")?;
        let text = tools.generate(tools.prompts.issue_from_log(error_log)?)?;

        let draft = match extract_triple(&text) {
            Ok(draft) => draft,
            Err(err) => {
                warn!(error = %err, "issue draft not parseable, not filing");
                return Ok(ExecutionResult::failed(
                    name,
                    format!("could not parse issue draft: {err}"),
                    Payload::ParseFailure {
                        raw: err.raw().to_string(),
                    },
                ));
            }
        };

        let request = IssueRequest {
            title: draft.title,
            body: draft.body,
            labels: draft.labels,
        };
        let response = tools.host.create_issue(&tools.settings.repo, &request)?;
        let payload = Payload::Issue {
            status: response.status,
            url: response.html_url(),
            title: request.title,
            labels: request.labels,
        };
        if !response.is_success() {
            warn!(status = response.status, "issue rejected");
            return Ok(ExecutionResult::failed(
                name,
                response.failure_message(),
                payload,
            ));
        }
        info!(status = response.status, "issue created");
        Ok(ExecutionResult::ok(name, payload))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::arguments::RawArguments;
    use crate::operations::resolve_arguments;
    use crate::test_support::Harness;

    fn args(log: &str) -> ResolvedArguments {
        let mut raw = RawArguments::new();
        raw.insert("error_log".to_string(), log.to_string());
        resolve_arguments(Operation::CreateIssueFromLog, raw).expect("resolve")
    }

    #[test]
    fn files_parsed_issue() {
        let harness = Harness::new();
        harness.model.push_text(
            "Title: Crash on start\nBody: Panics reading config.\nLabels: bug, crash",
        );

        let result = CreateIssueFromLog
            .execute(&harness.toolbox(), &args("thread 'main' panicked"))
            .expect("execute");

        assert!(result.success, "{result:?}");
        assert_eq!(
            harness.host.issues(),
            vec![IssueRequest {
                title: "Crash on start".to_string(),
                body: "Panics reading config.".to_string(),
                labels: vec!["bug".to_string(), "crash".to_string()],
            }]
        );
        assert!(harness.journal.contains("host issue acme/widgets"));
        let prompt = &harness.model.requests()[0].messages[1].content;
        assert!(prompt.contains("thread 'main' panicked"));
    }

    #[test]
    fn unparseable_draft_is_reported_without_filing() {
        let harness = Harness::new();
        harness.model.push_text("I think this is a config bug.");

        let result = CreateIssueFromLog
            .execute(&harness.toolbox(), &args("boom"))
            .expect("execute");

        assert!(!result.success);
        assert_eq!(
            result.payload,
            Payload::ParseFailure {
                raw: "I think this is a config bug.".to_string()
            }
        );
        assert!(harness.host.issues().is_empty());
    }

    #[test]
    fn draft_without_labels_is_reported_without_filing() {
        let harness = Harness::new();
        harness.model.push_text("Title: t\n\nBody: b");

        let result = CreateIssueFromLog
            .execute(&harness.toolbox(), &args("boom"))
            .expect("execute");

        assert!(!result.success);
        assert_eq!(
            result.payload,
            Payload::ParseFailure {
                raw: "Title: t\n\nBody: b".to_string()
            }
        );
        assert!(
            result
                .error
                .as_deref()
                .is_some_and(|e| e.contains("Labels:"))
        );
        assert!(harness.host.issues().is_empty());
        assert!(harness.journal.filtered(&["host"]).is_empty());
    }

    #[test]
    fn rejected_issue_reports_status() {
        let harness = Harness::new();
        harness
            .model
            .push_text("Title: t\nBody: b\nLabels: bug");
        harness.host.respond_with(410, json!({"message": "Issues are disabled for this repo"}));

        let result = CreateIssueFromLog
            .execute(&harness.toolbox(), &args("boom"))
            .expect("execute");

        assert!(!result.success);
        assert!(matches!(result.payload, Payload::Issue { status: 410, .. }));
        assert!(
            result
                .error
                .as_deref()
                .is_some_and(|e| e.contains("Issues are disabled"))
        );
    }
}
