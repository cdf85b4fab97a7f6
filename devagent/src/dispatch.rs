//! Instruction dispatch: one model call selects operations, then each runs.
//!
//! The model sees the model-selectable catalog as tools. A reply without tool
//! calls becomes a single reply result. Otherwise every requested invocation is
//! validated and executed strictly in the order the model listed them; a
//! failure of one invocation is recorded and the batch continues.
//!
//! The direct path ([`Dispatcher::invoke_directly`]) skips selection and runs a
//! single operation chosen by the caller.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::arguments::{DispatchError, RawArguments, ResolvedArguments, decode_arguments};
use crate::core::catalog::{Operation, lookup_selectable, model_catalog};
use crate::core::types::{ExecutionResult, InvocationRequest, Payload};
use crate::io::llm::{ChatMessage, ChatRequest, ModelReply};
use crate::operations::{Toolbox, executor_for, resolve_arguments};

pub struct Dispatcher<'a> {
    tools: Toolbox<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(tools: Toolbox<'a>) -> Self {
        Self { tools }
    }

    /// Let the model pick operations for `instruction` and run them in order.
    ///
    /// Only the selection call itself can fail the whole dispatch.
    #[instrument(skip_all)]
    pub fn dispatch(&self, instruction: &str) -> Result<Vec<ExecutionResult>> {
        let repo = self.tools.settings.repo.to_string();
        let system = self.tools.prompts.dispatch_system(Some(&repo))?;
        let request = ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(instruction)],
            tools: model_catalog(),
        };
        let reply = self
            .tools
            .model
            .complete(&request)
            .context("ask model to select operations")?;

        match reply {
            ModelReply::Text(text) => {
                info!("model answered without selecting an operation");
                Ok(vec![ExecutionResult::reply(text.trim())])
            }
            ModelReply::Invocations(requests) => {
                info!(count = requests.len(), "model selected operations");
                Ok(requests
                    .iter()
                    .map(|request| self.run_request(request))
                    .collect())
            }
        }
    }

    /// Run one named operation without a selection call.
    ///
    /// `message` fills the operation's message parameter when it has one and
    /// is ignored otherwise.
    #[instrument(skip_all, fields(op = op.name()))]
    pub fn invoke_directly(&self, op: Operation, message: Option<&str>) -> Result<ExecutionResult> {
        let mut raw = RawArguments::new();
        match (op.message_parameter(), message) {
            (Some(param), Some(message)) => {
                raw.insert(param.to_string(), message.to_string());
            }
            (None, Some(_)) => debug!("operation takes no message, ignoring it"),
            (_, None) => {}
        }
        let args = match resolve_arguments(op, raw) {
            Ok(args) => args,
            Err(err) => {
                warn!(error = %err, "direct invocation rejected");
                return Ok(ExecutionResult::failed(
                    op.name(),
                    err.to_string(),
                    Payload::Empty,
                ));
            }
        };
        executor_for(op).execute(&self.tools, &args)
    }

    /// [`Self::invoke_directly`] by CLI selector or canonical operation name.
    pub fn invoke_by_name(&self, name: &str, message: Option<&str>) -> Result<ExecutionResult> {
        let op = Operation::from_cli_selector(name)
            .or_else(|| Operation::from_name(name))
            .ok_or_else(|| DispatchError::UnknownOperation {
                name: name.to_string(),
            })?;
        self.invoke_directly(op, message)
    }

    #[instrument(skip_all, fields(op = %request.operation_name))]
    fn run_request(&self, request: &InvocationRequest) -> ExecutionResult {
        let name = request.operation_name.as_str();
        match self.prepare(request) {
            Ok((op, args)) => self.execute(op, &args),
            Err(err) => {
                warn!(error = %err, "invocation rejected");
                ExecutionResult::failed(
                    name,
                    err.to_string(),
                    Payload::Rejected {
                        raw_arguments: request.raw_arguments.clone(),
                    },
                )
            }
        }
    }

    fn prepare(
        &self,
        request: &InvocationRequest,
    ) -> Result<(Operation, ResolvedArguments), DispatchError> {
        let op = lookup_selectable(&request.operation_name).ok_or_else(|| {
            DispatchError::UnknownOperation {
                name: request.operation_name.clone(),
            }
        })?;
        let raw = decode_arguments(op.spec(), &request.raw_arguments)?;
        let args = resolve_arguments(op, raw)?;
        Ok((op, args))
    }

    fn execute(&self, op: Operation, args: &ResolvedArguments) -> ExecutionResult {
        match executor_for(op).execute(&self.tools, args) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "operation failed");
                ExecutionResult::failed(op.name(), format!("{err:#}"), Payload::Empty)
            }
        }
    }
}
