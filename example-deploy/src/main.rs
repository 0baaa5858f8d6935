use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kube_apply::{
    deploy::{self, DeployParams, Mode},
    Applier, ApplyClient, Credentials,
};
use std::path::PathBuf;

/// Applies Kubernetes manifests: creates objects, or updates existing ones
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the Kubernetes API server.
    /// In-cluster credentials are used when neither this nor --token is given
    #[arg(long, env = "CLUSTER_URL")]
    cluster_url: Option<String>,
    /// Bearer token
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Namespace for manifests that do not specify one
    #[arg(long, default_value = "default")]
    namespace: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply single manifest
    Apply { manifest: PathBuf },
    /// Delete object described by manifest
    Delete { manifest: PathBuf },
    /// Apply (or delete) every .yaml/.yml file in a directory
    Deploy {
        #[arg(long, default_value = ".")]
        workspace: PathBuf,
        /// Directory relative to the workspace
        #[arg(long)]
        source_path: Option<PathBuf>,
        #[arg(long)]
        delete: bool,
    },
}

fn credentials(args: &Args) -> anyhow::Result<Credentials> {
    match (&args.cluster_url, &args.token) {
        (Some(url), Some(token)) => Ok(Credentials::new(url, token)),
        (None, None) => Credentials::in_cluster().context("failed to infer in-cluster credentials"),
        _ => anyhow::bail!("--cluster-url and --token must be specified together"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let credentials = credentials(&args)?;
    tracing::info!(cluster = credentials.cluster_url.as_str(), "Connecting");
    let client = ApplyClient::from_credentials(&credentials)?;
    let applier = Applier::new(client, &args.namespace);

    match args.command {
        Command::Apply { manifest } => {
            let mut resource = deploy::load_manifest(&manifest).await?;
            let response = deploy::deploy_manifest(&applier, &mut resource).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                anyhow::bail!("server responded with {}", response.status());
            }
        }
        Command::Delete { manifest } => {
            let mut resource = deploy::load_manifest(&manifest).await?;
            let response = applier
                .delete(&mut resource)
                .await
                .with_context(|| format!("failed to delete {}", resource))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                anyhow::bail!("server responded with {}", response.status());
            }
        }
        Command::Deploy {
            workspace,
            source_path,
            delete,
        } => {
            let params = DeployParams {
                workspace,
                source_path,
                mode: if delete { Mode::Delete } else { Mode::Apply },
            };
            let report = deploy::deploy_directory(&applier, &params).await?;
            tracing::info!(files = report.files.len(), "Deployment finished");
            if !report.is_success() {
                for failed in report.failed() {
                    tracing::error!(file = %failed.path.display(), outcome = ?failed.outcome, "Not deployed");
                }
                anyhow::bail!("some manifests were not deployed");
            }
        }
    }
    Ok(())
}
