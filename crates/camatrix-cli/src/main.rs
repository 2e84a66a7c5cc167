//! camatrix: Conditional Access impact matrix generator.
//!
//! Computes, for every user in the directory, which Conditional Access
//! policies apply to them, exports the matrix as CSV and JSON, and
//! optionally diffs the run against a previous snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Full run, artifacts in the working directory
//! camatrix
//!
//! # Guests only, capped at 50 users, compared against last week's snapshot
//! camatrix -t guest -l 50 --compare 2026-08-23-CA-Impact-Matrix.json
//! ```
//!
//! Credentials come from `CAMATRIX_TENANT_ID`, `CAMATRIX_CLIENT_ID` and
//! `CAMATRIX_CLIENT_SECRET`.

mod config;
mod export;
mod report;
mod update;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use camatrix_domain::{diff_snapshots, DiffOptions, MatrixBuilder, MatrixOptions, UserKind};
use camatrix_graph::{GraphClient, TokenProvider};

use crate::config::Settings;

/// Conditional Access impact matrix generator.
#[derive(Parser, Debug)]
#[command(name = "camatrix")]
#[command(version, about, long_about = None)]
struct Args {
    /// Do not start the local web report after a comparison
    #[arg(long)]
    cli_only: bool,

    /// Diff this run against a previously exported JSON snapshot
    #[arg(long, value_name = "FILE")]
    compare: Option<PathBuf>,

    /// Only evaluate users of this type
    #[arg(short = 't', long = "type", value_enum)]
    user_type: Option<UserTypeArg>,

    /// Cap the number of evaluated users
    #[arg(short = 'l', long)]
    limit: Option<usize>,

    /// Only evaluate (transitive) members of this group
    #[arg(short = 'g', long, value_name = "GROUP_ID")]
    group: Option<String>,

    /// Also evaluate report-only policies, not just enforced ones
    #[arg(long)]
    include_report_only: bool,

    /// Report users that are absent from the compared snapshot
    #[arg(long)]
    report_new_users: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UserTypeArg {
    Member,
    Guest,
}

impl From<UserTypeArg> for UserKind {
    fn from(arg: UserTypeArg) -> Self {
        match arg {
            UserTypeArg::Member => UserKind::Member,
            UserTypeArg::Guest => UserKind::Guest,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = update::CURRENT_VERSION, "camatrix starting");

    let settings = Settings::from_env()?;
    let http = reqwest::Client::new();

    update::check_for_update(&http).await;

    let token = TokenProvider::new(
        http.clone(),
        &settings.tenant_id,
        &settings.client_id,
        &settings.client_secret,
    )?;
    let client = Arc::new(GraphClient::new(http, token));

    client.verify_connection().await?;
    info!(tenant = %settings.tenant_id, "connected to tenant");

    let options = MatrixOptions {
        include_report_only: args.include_report_only,
        user_kind: args.user_type.map(Into::into),
        group_id: args.group.clone(),
        limit: args.limit,
    };

    let matrix = MatrixBuilder::new(client, options).build().await?;
    info!(rows = matrix.rows.len(), "matrix generated");

    let today = chrono::Local::now().date_naive();
    let (csv_name, json_name) = export::artifact_names(today);
    export_artifact(&csv_name, || export::write_csv(Path::new(&csv_name), &matrix));
    export_artifact(&json_name, || {
        export::write_json(Path::new(&json_name), &matrix.rows)
    });

    if let Some(compare_path) = &args.compare {
        compare_and_report(compare_path, &matrix.rows, &args, settings.report_port).await?;
    }

    Ok(())
}

/// Serialization failures are reported but do not abort the remaining
/// steps; the matrix itself was computed successfully.
fn export_artifact(name: &str, write: impl FnOnce() -> anyhow::Result<()>) {
    match write() {
        Ok(()) => info!("'{name}' saved in current directory"),
        Err(err) => error!("could not save '{name}': {err:#}"),
    }
}

/// Diffs against the given snapshot; a missing or unreadable snapshot skips
/// only this step.
async fn compare_and_report(
    compare_path: &Path,
    current: &[camatrix_domain::MatrixRow],
    args: &Args,
    report_port: u16,
) -> anyhow::Result<()> {
    info!("comparing with {}", compare_path.display());

    let previous = match export::read_snapshot(compare_path) {
        Ok(rows) => rows,
        Err(err) => {
            error!("could not compare: {err:#}");
            return Ok(());
        }
    };

    let options = DiffOptions {
        report_new_users: args.report_new_users,
    };
    let changes = diff_snapshots(&previous, current, &options);
    info!(count = changes.len(), "impact(s) found");
    for change in &changes {
        info!(
            upn = %change.upn,
            policy = %change.policy,
            old = change.old,
            new = change.new,
            "impact"
        );
    }

    if !args.cli_only {
        report::serve_report(&changes, report_port).await?;
    }

    Ok(())
}
