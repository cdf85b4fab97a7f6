//! `devagent`: ask a language model to operate on the current git repository.
//!
//! `ask` lets the model pick operations for a free-form instruction, `run`
//! invokes one operation directly, and `catalog` lists what is available.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use devagent::core::catalog::Operation;
use devagent::core::types::ExecutionResult;
use devagent::dispatch::Dispatcher;
use devagent::exit_codes;
use devagent::io::config::{CONFIG_FILE_NAME, Credentials, Settings, load_config};
use devagent::io::git::Git;
use devagent::io::github::{GitHub, GitHubConfig};
use devagent::io::llm::{OpenAiClient, OpenAiClientConfig};
use devagent::io::prompt::PromptEngine;
use devagent::logging;
use devagent::operations::Toolbox;

#[derive(Parser)]
#[command(
    name = "devagent",
    version,
    about = "Natural-language git and GitHub assistant"
)]
struct Cli {
    /// Repository working tree (defaults to the current directory).
    #[arg(long, global = true)]
    repo: Option<PathBuf>,
    /// Config file (defaults to `<repo>/.devagent.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Let the model choose and run operations for an instruction.
    Ask {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        instruction: Vec<String>,
    },
    /// Run one operation directly, e.g. `commit_and_push` or `create_pr`.
    Run {
        selector: String,
        /// Commit message (`commit_and_push`) or error log (`create_issue`).
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List the available operations.
    Catalog,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    if let Command::Catalog = cli.command {
        print!("{}", render_catalog());
        return Ok(exit_codes::OK);
    }

    let repo_root = match &cli.repo {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| repo_root.join(CONFIG_FILE_NAME));
    let config = load_config(&config_path)?;
    let credentials = Credentials::from_env(&repo_root)?;
    let git = Git::new(&repo_root, config.git_limits());
    let settings = Settings::new(config, credentials, &git)?;
    debug!(repo = %settings.repo, root = %repo_root.display(), "starting");

    let model = OpenAiClient::new(OpenAiClientConfig {
        base_url: settings.config.openai_base_url.clone(),
        api_key: settings.credentials.openai_api_key.clone(),
        model: settings.config.model.clone(),
        timeout: settings.config.http_timeout(),
    })?;
    let host = GitHub::new(GitHubConfig {
        api_url: settings.config.github_api_url.clone(),
        token: settings.credentials.github_token.clone(),
        timeout: settings.config.http_timeout(),
    })?;
    let prompts = PromptEngine::new(settings.config.prompt_input_limit_bytes);
    let dispatcher = Dispatcher::new(Toolbox {
        settings: &settings,
        vcs: &git,
        model: &model,
        host: &host,
        prompts: &prompts,
    });

    let results = match cli.command {
        Command::Ask { instruction } => dispatcher.dispatch(&instruction.join(" "))?,
        Command::Run { selector, message } => {
            vec![dispatcher.invoke_by_name(&selector, message.as_deref())?]
        }
        Command::Catalog => Vec::new(),
    };
    Ok(report(&results))
}

/// Print every result and pick the exit code.
fn report(results: &[ExecutionResult]) -> i32 {
    for result in results {
        println!("{}", result.render());
    }
    if results.iter().all(|result| result.success) {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    }
}

fn render_catalog() -> String {
    let mut out = String::new();
    for op in Operation::ALL {
        let scope = if op.is_model_selectable() {
            ""
        } else {
            " (run only)"
        };
        out.push_str(&format!(
            "{:<16} {}{}\n    {}\n",
            op.cli_selector(),
            op.name(),
            scope,
            op.spec().description
        ));
    }
    out
}
