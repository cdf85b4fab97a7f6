use anyhow::Result;
use tracing::{info, instrument, warn};

use super::{OperationExecutor, Toolbox};
use crate::core::arguments::ResolvedArguments;
use crate::core::catalog::Operation;
use crate::core::extract::{TitleBody, extract_pair, pair_or_default};
use crate::core::types::{ExecutionResult, Payload};
use crate::io::github::PullRequestDraft;

const DEFAULT_BASE: &str = "main";

/// Open a pull request from the current branch.
pub struct CreatePullRequest;

impl OperationExecutor for CreatePullRequest {
    fn operation(&self) -> Operation {
        Operation::CreatePullRequest
    }

    fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        &[("base", DEFAULT_BASE)]
    }

    #[instrument(skip_all, fields(op = "create_pull_request"))]
    fn execute(&self, tools: &Toolbox<'_>, args: &ResolvedArguments) -> Result<ExecutionResult> {
        let base = args.get("base").unwrap_or(DEFAULT_BASE).to_string();
        let head = tools.vcs.current_branch()?;

        let (title, body) = match (args.non_blank("title"), args.non_blank("body")) {
            (Some(title), Some(body)) => (title.to_string(), body.to_string()),
            (title, body) => {
                let generated = generate_description(tools, &base, &head)?;
                (
                    title.map_or(generated.title, str::to_string),
                    body.map_or(generated.body, str::to_string),
                )
            }
        };

        let draft = PullRequestDraft {
            title,
            head,
            base,
            body,
        };
        let response = tools
            .host
            .create_pull_request(&tools.settings.repo, &draft)?;
        let payload = Payload::PullRequest {
            status: response.status,
            number: response.number(),
            url: response.html_url(),
            title: draft.title,
            base: draft.base,
            head: draft.head,
        };
        if !response.is_success() {
            warn!(status = response.status, "pull request rejected");
            return Ok(ExecutionResult::failed(
                self.operation().name(),
                response.failure_message(),
                payload,
            ));
        }
        info!(status = response.status, "pull request created");
        Ok(ExecutionResult::ok(self.operation().name(), payload))
    }
}

fn generate_description(tools: &Toolbox<'_>, base: &str, head: &str) -> Result<TitleBody> {
    let diff = tools.vcs.diff(Some(&format!("origin/{base}...{head}")))?;
    let prompt = tools.prompts.pull_request(&diff, base, head)?;
    let text = tools.generate(prompt)?;
    if let Err(err) = extract_pair(&text) {
        warn!(error = %err, "pull request description not split, using default title");
    }
    Ok(pair_or_default(&text))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::arguments::RawArguments;
    use crate::core::extract::DEFAULT_TITLE;
    use crate::operations::resolve_arguments;
    use crate::test_support::Harness;

    fn args(pairs: &[(&str, &str)]) -> ResolvedArguments {
        let raw: RawArguments = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        resolve_arguments(Operation::CreatePullRequest, raw).expect("resolve")
    }

    #[test]
    fn generates_title_and_body_from_branch_diff() {
        let harness = Harness::new();
        harness
            .model
            .push_text("Document widgets\n\nAdds a section on widgets.");

        let result = CreatePullRequest
            .execute(&harness.toolbox(), &args(&[]))
            .expect("execute");

        assert!(result.success, "{result:?}");
        assert!(harness.journal.contains("git diff origin/main...feature"));
        assert_eq!(
            harness.host.pull_requests(),
            vec![PullRequestDraft {
                title: "Document widgets".to_string(),
                head: "feature".to_string(),
                base: "main".to_string(),
                body: "Adds a section on widgets.".to_string(),
            }]
        );
        assert!(harness.journal.contains("host pull_request acme/widgets"));
    }

    #[test]
    fn unsplittable_description_falls_back_to_default_title() {
        let harness = Harness::new();
        harness.model.push_text("Just one paragraph");

        CreatePullRequest
            .execute(&harness.toolbox(), &args(&[("base", "develop")]))
            .expect("execute");

        let draft = &harness.host.pull_requests()[0];
        assert_eq!(draft.title, DEFAULT_TITLE);
        assert_eq!(draft.body, "Just one paragraph");
        assert_eq!(draft.base, "develop");
    }

    #[test]
    fn provided_title_and_body_skip_the_model() {
        let harness = Harness::new();

        CreatePullRequest
            .execute(
                &harness.toolbox(),
                &args(&[("title", "Release 1.2"), ("body", "Bump versions")]),
            )
            .expect("execute");

        assert!(harness.model.requests().is_empty());
        assert_eq!(harness.host.pull_requests()[0].title, "Release 1.2");
    }

    #[test]
    fn provided_title_is_kept_when_body_is_generated() {
        let harness = Harness::new();
        harness.model.push_text("Generated title\n\nGenerated body");

        CreatePullRequest
            .execute(&harness.toolbox(), &args(&[("title", "Mine")]))
            .expect("execute");

        let draft = &harness.host.pull_requests()[0];
        assert_eq!(draft.title, "Mine");
        assert_eq!(draft.body, "Generated body");
    }

    #[test]
    fn non_success_status_is_a_failed_result() {
        let harness = Harness::new();
        harness.host.respond_with(
            422,
            json!({"message": "Validation Failed", "errors": [{"message": "A pull request already exists"}]}),
        );

        let result = CreatePullRequest
            .execute(&harness.toolbox(), &args(&[("title", "t"), ("body", "b")]))
            .expect("execute");

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("hosting API returned HTTP 422: Validation Failed")
        );
        assert!(matches!(result.payload, Payload::PullRequest { status: 422, .. }));
    }

    #[test]
    fn success_payload_reports_number_and_url() {
        let harness = Harness::new();
        harness.host.respond_with(
            201,
            json!({"number": 7, "html_url": "https://github.com/acme/widgets/pull/7"}),
        );

        let result = CreatePullRequest
            .execute(&harness.toolbox(), &args(&[("title", "t"), ("body", "b")]))
            .expect("execute");

        assert_eq!(
            result.payload,
            Payload::PullRequest {
                status: 201,
                number: Some(7),
                url: Some("https://github.com/acme/widgets/pull/7".to_string()),
                title: "t".to_string(),
                base: "main".to_string(),
                head: "feature".to_string(),
            }
        );
    }
}
