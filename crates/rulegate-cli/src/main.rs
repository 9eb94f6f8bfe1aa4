//! rulegate - required checks and ruleset payloads for GitHub repositories
//!
//! ## Commands
//!
//! - `checks`: list the checks reported on the default branch, pull requests
//!   and refs, merged by name
//! - `validate`: validate a ruleset payload file without contacting GitHub
//! - `apply`: validate, then create or update a repository ruleset

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rulegate_core::{
    prepare_ruleset_payload, validate_ruleset_with, BuiltinSchemaSource, CheckDiscovery,
    DiscoveryReport, DocumentType, FileSchemaSource, RepositoryApi, SchemaSource,
    SourceSelection, ValidationReport,
};
use rulegate_github::{GithubClient, GithubConfig, Repository};
use serde_json::Value;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "rulegate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discover required checks and validate GitHub repository rulesets", long_about = None)]
struct Cli {
    #[command(flatten)]
    remote: RemoteArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How to reach the repository.
#[derive(Args, Debug, Clone, Default)]
struct RemoteArgs {
    /// Repository as OWNER/NAME, HOST/OWNER/NAME or URL
    #[arg(short = 'R', long, global = true, env = "GH_REPO")]
    repo: Option<String>,

    /// API token
    #[arg(long, global = true, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL (defaults to the repository host's API)
    #[arg(long, global = true, env = "GITHUB_API_URL")]
    api_url: Option<String>,
}

impl RemoteArgs {
    fn client(&self) -> Result<GithubClient> {
        let repo = self
            .repo
            .as_deref()
            .context("no repository given: pass --repo OWNER/NAME or set GH_REPO")?;
        let repo = Repository::parse(repo)?;

        let mut config = GithubConfig::from_env();
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(token) = &self.token {
            config = config.with_token(token);
        }
        Ok(GithubClient::new(repo, config)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List checks observed on the default branch, pull requests and refs
    Checks {
        /// Extra ref to inspect (branch, tag or SHA); repeatable
        #[arg(long = "ref", value_name = "REF")]
        refs: Vec<String>,

        /// Pull request number to inspect; repeatable
        #[arg(long = "pr", value_name = "NUMBER")]
        prs: Vec<u64>,

        /// Also inspect the latest open pull request, else the latest merged one
        #[arg(long)]
        latest_pr: bool,

        /// Skip the default branch
        #[arg(long)]
        no_default: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a ruleset payload (use - for stdin)
    Validate {
        file: PathBuf,

        /// Schema description to use instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create or update a ruleset from a payload file
    Apply {
        file: PathBuf,

        /// Update this ruleset instead of creating a new one
        #[arg(long)]
        ruleset_id: Option<u64>,

        /// Validate and print the payload without submitting it
        #[arg(long)]
        dry_run: bool,

        /// Schema description to use instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    rulegate_core::init_tracing(cli.log_json, level);

    match cli.command {
        Commands::Checks {
            refs,
            prs,
            latest_pr,
            no_default,
            json,
        } => {
            let client = cli.remote.client()?;
            let selection = source_selection(refs, prs, latest_pr, no_default);
            cmd_checks(Arc::new(client), &selection, json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { file, schema, json } => {
            let valid = cmd_validate(&file, schema.as_deref(), json)?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Apply {
            file,
            ruleset_id,
            dry_run,
            schema,
        } => {
            cmd_apply(&cli.remote, &file, ruleset_id, dry_run, schema.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn source_selection(
    refs: Vec<String>,
    prs: Vec<u64>,
    latest_pr: bool,
    no_default: bool,
) -> SourceSelection {
    SourceSelection {
        include_default_branch: !no_default,
        pull_requests: prs,
        latest_pr,
        refs,
    }
}

async fn cmd_checks(
    api: Arc<dyn RepositoryApi>,
    selection: &SourceSelection,
    json: bool,
) -> Result<DiscoveryReport> {
    let result = CheckDiscovery::new(api).discover(selection).await;
    let report = DiscoveryReport::from_result(&result);

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_human());
    }
    Ok(report)
}

/// Read a JSON document from a file, or stdin for `-`.
fn load_document(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))?
    };
    serde_json::from_str(&text).context(format!("{:?} is not valid JSON", path))
}

fn schema_source(schema: Option<&Path>) -> Box<dyn SchemaSource> {
    match schema {
        Some(path) => Box::new(FileSchemaSource::new(path, DocumentType::RepositoryRuleset)),
        None => Box::new(BuiltinSchemaSource),
    }
}

/// Strip server-owned fields, then validate what remains.
///
/// The prepared payload keeps every key the user wrote and gains no
/// defaults, so misspelled or missing fields are reported.
fn check_payload(document: &Value, schema: Option<&Path>) -> Result<(Value, ValidationReport)> {
    let payload = prepare_ruleset_payload(document);
    let violations = validate_ruleset_with(schema_source(schema).as_ref(), &payload)
        .context("Failed to load the ruleset schema")?;
    debug!(violations = violations.len(), "payload checked");
    Ok((payload, ValidationReport::new(violations)))
}

fn cmd_validate(file: &Path, schema: Option<&Path>, json: bool) -> Result<bool> {
    let document = load_document(file)?;
    let (_, report) = check_payload(&document, schema)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_human());
    }
    Ok(report.valid)
}

async fn cmd_apply(
    remote: &RemoteArgs,
    file: &Path,
    ruleset_id: Option<u64>,
    dry_run: bool,
    schema: Option<&Path>,
) -> Result<Value> {
    let document = load_document(file)?;
    let (payload, report) = check_payload(&document, schema)?;

    if !report.valid {
        eprint!("{}", report.render_human());
        bail!(
            "refusing to submit a ruleset with {} violation(s)",
            report.violations.len()
        );
    }

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(payload);
    }

    let client = remote.client()?;
    let response = match ruleset_id {
        Some(id) => client
            .update_ruleset(id, &payload)
            .await
            .context(format!("Failed to update ruleset {id}"))?,
        None => client
            .create_ruleset(&payload)
            .await
            .context("Failed to create ruleset")?,
    };

    let id = response.get("id").and_then(Value::as_u64);
    let name = response
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    info!(?id, name, "ruleset submitted");
    match (ruleset_id, id) {
        (Some(_), Some(id)) => println!("Updated ruleset {id} ({name}) on {}", client.repository()),
        (None, Some(id)) => println!("Created ruleset {id} ({name}) on {}", client.repository()),
        _ => println!("Submitted ruleset {name} to {}", client.repository()),
    }
    Ok(response)
}
