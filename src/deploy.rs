//! Deploying manifests from a workspace directory

use crate::{applier::Applier, client::ApiResponse, errors, resource::Resource};
use anyhow::Context as _;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    Delete,
}

#[derive(Debug, Clone)]
pub struct DeployParams {
    /// Directory all manifests must come from
    pub workspace: PathBuf,
    /// Subdirectory of `workspace` to deploy. Whole workspace if `None`
    pub source_path: Option<PathBuf>,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Server responded, possibly with an error status
    Completed { status_code: u16 },
    /// File could not be read or parsed
    LoadFailed(String),
    /// Request failed before a response was produced
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct DeployReport {
    pub files: Vec<FileOutcome>,
}

impl DeployReport {
    /// True if every manifest got a 2xx response
    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| {
            matches!(f.outcome, Outcome::Completed { status_code } if (200..300).contains(&status_code))
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| match f.outcome {
            Outcome::Completed { status_code } => !(200..300).contains(&status_code),
            _ => true,
        })
    }
}

/// Joins `child` onto `base`, refusing absolute paths and paths leaving `base`.
///
/// Only lexical; symlinks are not resolved.
pub fn resolve_safe_child_path(base: &Path, child: &Path) -> anyhow::Result<PathBuf> {
    let mut depth = 0usize;
    let mut resolved = base.to_path_buf();
    for component in child.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    anyhow::bail!(
                        "path {} is outside of {}",
                        child.display(),
                        base.display()
                    );
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                anyhow::bail!("path {} must be relative", child.display());
            }
        }
    }
    Ok(resolved)
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Recursively lists `.yaml` and `.yml` files, sorted by path.
pub fn find_manifests(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        if entry.file_type().is_file() && is_manifest(entry.path()) {
            manifests.push(entry.into_path());
        }
    }
    Ok(manifests)
}

/// Reads single-document manifest. JSON manifests are accepted too.
pub async fn load_manifest(path: &Path) -> anyhow::Result<Resource> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let resource = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(resource)
}

fn log_response(target: &str, response: &ApiResponse) {
    if response.is_success() {
        tracing::info!("Deployment response for {}: {}", target, response);
    } else {
        tracing::warn!(
            class = ?errors::classify_response(response),
            "Deployment response for {}: {}",
            target,
            response
        );
    }
}

/// Applies one parsed manifest.
#[tracing::instrument(skip_all, fields(resource = %resource))]
pub async fn deploy_manifest(
    applier: &Applier,
    resource: &mut Resource,
) -> anyhow::Result<ApiResponse> {
    match applier.apply(resource).await {
        Ok(response) => {
            log_response(&resource.to_string(), &response);
            Ok(response)
        }
        Err(err) => {
            tracing::error!("Deployment failed: {:#}", err);
            Err(err).context("deployment failed")
        }
    }
}

/// Deploys every manifest under the source directory, one by one.
///
/// Per-file failures are logged and recorded in the report; remaining
/// files are still processed. Errors are only returned if the directory
/// itself cannot be resolved or listed.
#[tracing::instrument(skip(applier))]
pub async fn deploy_directory(
    applier: &Applier,
    params: &DeployParams,
) -> anyhow::Result<DeployReport> {
    let root = match &params.source_path {
        Some(source) => resolve_safe_child_path(&params.workspace, source)?,
        None => params.workspace.clone(),
    };
    let manifests = find_manifests(&root)?;
    tracing::info!(count = manifests.len(), root = %root.display(), "Found manifests");

    let mut report = DeployReport::default();
    for path in manifests {
        let file = path.strip_prefix(&root).unwrap_or(&path).display().to_string();

        let mut resource = match load_manifest(&path).await {
            Ok(r) => r,
            Err(err) => {
                tracing::error!("Error processing file {}: {:#}", file, err);
                report.files.push(FileOutcome {
                    path,
                    outcome: Outcome::LoadFailed(format!("{:#}", err)),
                });
                continue;
            }
        };

        let result = match params.mode {
            Mode::Apply => applier.apply(&mut resource).await,
            Mode::Delete => applier.delete(&mut resource).await,
        };
        let outcome = match result {
            Ok(response) => {
                log_response(&file, &response);
                Outcome::Completed {
                    status_code: response.status_code,
                }
            }
            Err(err) => {
                let err = anyhow::Error::new(err);
                tracing::error!("Deployment failed for {}: {:#}", file, err);
                Outcome::Failed(format!("{:#}", err))
            }
        };
        report.files.push(FileOutcome { path, outcome });
    }
    Ok(report)
}
