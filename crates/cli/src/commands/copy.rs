//! copy - Copy blobs into the destination bucket
//!
//! The default action of the binary. Resolves the run configuration, builds
//! both clients and hands them to the orchestrator.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bc_blob::BlobClient;
use bc_core::{ConfigManager, ConfigOverrides, Error, FileConfig, Orchestrator, RunConfig};
use bc_s3::S3Client;
use clap::Args;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Reporter, RunSummary};

/// Where each required parameter can be supplied
const PARAMETER_SOURCES: &[(&str, &str, &str)] = &[
    ("region", "--region", "AWS_REGION"),
    ("bucket", "--bucket", "S3_BUCKET"),
    ("access_key_id", "--access-key-id", "AWS_ACCESS_KEY_ID"),
    ("secret_access_key", "--secret-access-key", "AWS_SECRET_ACCESS_KEY"),
    ("source_token", "--source-token", "BLOB_READ_WRITE_TOKEN"),
];

/// Copy options
#[derive(Args, Debug, Default)]
pub struct CopyArgs {
    /// Objects transferred concurrently per batch [default: 10]
    #[arg(short, long, env = "BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Only copy keys starting with this prefix [default: production/]
    #[arg(short, long, env = "KEY_PREFIX")]
    pub prefix: Option<String>,

    /// Objects requested per listing page [default: 1000]
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Destination region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Destination bucket
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    /// Destination access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// Destination secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Custom S3 endpoint for S3-compatible services
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(
        long,
        env = "S3_FORCE_PATH_STYLE",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub path_style: bool,

    /// Blob listing API URL [default: https://blob.vercel-storage.com]
    #[arg(long, env = "BLOB_API_URL")]
    pub source_url: Option<String>,

    /// Blob listing API token
    #[arg(long, env = "BLOB_READ_WRITE_TOKEN", hide_env_values = true)]
    pub source_token: Option<String>,

    /// Check which objects would be copied without fetching or writing
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file [default: <config dir>/blobcopy/config.toml]
    #[arg(long, env = "BLOBCOPY_CONFIG")]
    pub config: Option<PathBuf>,
}

impl CopyArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            batch_size: self.batch_size,
            key_prefix: self.prefix.clone(),
            page_size: self.page_size,
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            endpoint: self.endpoint.clone(),
            force_path_style: self.path_style.then_some(true),
            source_url: self.source_url.clone(),
            source_token: self.source_token.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// Execute a copy run
pub async fn execute(args: CopyArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&formatter, &e);
            return ExitCode::from_error(&e);
        }
    };
    tracing::debug!(?config, "resolved configuration");

    let source = match BlobClient::new(&config.source) {
        Ok(client) => client,
        Err(e) => {
            formatter.error(&format!("Failed to create source client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let dest = match S3Client::new(&config.destination).await {
        Ok(client) => client,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let orchestrator = Orchestrator::new(Arc::new(source), Arc::new(dest));
    let reporter = Reporter::new(output_config, config.dry_run);
    let started = Instant::now();

    match orchestrator.run(&config, &reporter).await {
        Ok(totals) => {
            reporter.finish(&RunSummary::completed(
                totals,
                started.elapsed(),
                config.dry_run,
            ));
            ExitCode::Success
        }
        Err(aborted) => {
            reporter.finish(&RunSummary::aborted(
                aborted.totals,
                started.elapsed(),
                config.dry_run,
                aborted.error.to_string(),
            ));
            formatter.error(&format!("Run aborted: {}", aborted.error));
            ExitCode::from_error(&aborted.error)
        }
    }
}

/// Merge flags, environment and config file into a run configuration
pub fn resolve_config(args: &CopyArgs) -> bc_core::Result<RunConfig> {
    let file = load_file_config(args.config.clone())?;
    RunConfig::resolve(args.overrides(), file)
}

fn load_file_config(path: Option<PathBuf>) -> bc_core::Result<FileConfig> {
    let manager = match path {
        Some(path) if !path.exists() => {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => ConfigManager::with_path(path),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                tracing::debug!("skipping config file: {e}");
                return Ok(FileConfig::default());
            }
        },
    };
    manager.load()
}

fn report_config_error(formatter: &Formatter, error: &Error) {
    formatter.error(&error.to_string());

    if let Error::MissingParameters(missing) = error {
        for name in missing {
            if let Some((_, flag, env)) = PARAMETER_SOURCES.iter().find(|(n, _, _)| n == name) {
                formatter.error(&format!("  {name}: pass {flag} or set {env}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated_args(dir: &TempDir) -> CopyArgs {
        let path = dir.path().join("config.toml");
        if !path.exists() {
            std::fs::write(&path, "schema_version = 1\n").unwrap();
        }
        CopyArgs {
            config: Some(path),
            ..Default::default()
        }
    }

    fn complete_args(dir: &TempDir) -> CopyArgs {
        CopyArgs {
            region: Some("us-east-1".into()),
            bucket: Some("archive".into()),
            access_key_id: Some("AKIA".into()),
            secret_access_key: Some("secret".into()),
            source_token: Some("token".into()),
            ..isolated_args(dir)
        }
    }

    #[test]
    fn test_parameter_sources_cover_required_parameters() {
        let dir = TempDir::new().unwrap();
        let err = resolve_config(&isolated_args(&dir)).unwrap_err();
        let Error::MissingParameters(missing) = err else {
            panic!("expected missing parameters");
        };
        for name in &missing {
            assert!(
                PARAMETER_SOURCES.iter().any(|(n, _, _)| n == name),
                "{name} has no flag/env description"
            );
        }
        assert_eq!(missing.len(), PARAMETER_SOURCES.len());
    }

    #[test]
    fn test_resolve_with_flags_only() {
        let dir = TempDir::new().unwrap();
        let args = CopyArgs {
            batch_size: Some(3),
            path_style: true,
            ..complete_args(&dir)
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.batch_size.get(), 3);
        assert_eq!(config.key_prefix, "production/");
        assert!(config.destination.force_path_style);
    }

    #[test]
    fn test_resolve_reads_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "schema_version = 1\n[run]\nkey_prefix = \"uploads/\"\n[source]\ntoken = \"from-file\"\n",
        )
        .unwrap();
        let args = CopyArgs {
            source_token: None,
            ..complete_args(&dir)
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.key_prefix, "uploads/");
        assert_eq!(config.source.token, "from-file");
    }

    #[test]
    fn test_named_config_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let args = CopyArgs {
            config: Some(dir.path().join("absent.toml")),
            ..complete_args(&dir)
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[tokio::test]
    async fn test_missing_configuration_exits_before_work() {
        let dir = TempDir::new().unwrap();
        let output = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let code = execute(isolated_args(&dir), output).await;
        assert_eq!(code, ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_zero_batch_size_exits_with_usage_error() {
        let dir = TempDir::new().unwrap();
        let args = CopyArgs {
            batch_size: Some(0),
            ..complete_args(&dir)
        };
        let output = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(execute(args, output).await, ExitCode::UsageError);
    }
}
