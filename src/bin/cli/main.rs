use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use object_store_provisioner::{
    app::{AppBuilder, AppConfig, AppServices, BackendKind},
    domain::value_objects::ObjectKey,
    ports::services::{BucketService, ObjectService},
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "object-store-provisioner")]
#[command(about = "Provision and operate buckets on S3-compatible object storage", long_about = None)]
struct Cli {
    /// TOML configuration file with connection settings and declared buckets
    #[arg(short, long, env = "STORAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend type (s3 or memory)
    #[arg(long, env = "STORAGE_BACKEND")]
    backend: Option<String>,

    /// S3 endpoint URL
    #[arg(long, env = "STORAGE_URL")]
    endpoint: Option<String>,

    /// S3 access key
    #[arg(long, env = "STORAGE_ACCESS_KEY")]
    access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "STORAGE_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// S3 region
    #[arg(long, env = "STORAGE_REGION")]
    region: Option<String>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the declared buckets that do not exist yet
    Provision,

    /// Inspect and manage buckets
    Bucket {
        #[command(subcommand)]
        command: BucketCommands,
    },

    /// Inspect and transfer objects
    Object {
        #[command(subcommand)]
        command: ObjectCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BucketCommands {
    /// List all buckets
    List,

    /// Check whether a bucket exists
    Exists {
        /// Bucket name
        name: String,
    },

    /// Show a bucket from the bucket listing
    Get {
        /// Bucket name
        name: String,
    },

    /// Create a bucket without any feature enabled
    Create {
        /// Bucket name
        name: String,
    },

    /// Remove an empty bucket
    Remove {
        /// Bucket name
        name: String,
    },

    /// Show versioning, object lock and policy of a bucket
    Describe {
        /// Bucket name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ObjectCommands {
    /// Show object metadata
    Stat {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// Upload a local file
    Upload {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// File path to upload
        file: PathBuf,
        /// User metadata as KEY=VALUE, repeatable
        #[arg(short, long = "metadata", value_parser = parse_metadata)]
        metadata: Vec<(String, String)>,
    },

    /// Download an object to a local file
    Download {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Output file path, defaults to the last segment of the key
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove an object
    Remove {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
}

fn parse_metadata(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => AppConfig::default(),
        };

        if let Some(backend) = &self.backend {
            config.backend = backend.parse::<BackendKind>()?;
        }
        if let Some(endpoint) = &self.endpoint {
            config.connection.url = endpoint.clone();
        }
        if let Some(access_key) = &self.access_key {
            config.connection.access_key = access_key.clone();
        }
        if let Some(secret_key) = &self.secret_key {
            config.connection.secret_key = secret_key.clone();
        }
        if let Some(region) = &self.region {
            config.connection.region = region.clone();
        }

        // Buckets are only reconciled by the `provision` command
        config.auto_create_buckets = false;
        Ok(config)
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.log_level.to_lowercase()))
            .context("Invalid log level")?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

async fn provision(app: &AppServices, config: &AppConfig, json: bool) -> Result<()> {
    let report = app.reconciler.reconcile(&config.buckets).await;
    let failures = report
        .failures
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>();

    let summary = serde_json::json!({
        "outcomes": report.outcomes,
        "failures": failures,
    });
    emit(json, &summary, |_| {
        let mut lines = report
            .outcomes
            .iter()
            .map(|outcome| format!("{:<40} {:?}", outcome.bucket, outcome.action))
            .collect::<Vec<_>>();
        lines.extend(failures.iter().map(|failure| format!("FAILED {}", failure)));
        lines.join("\n")
    })?;

    report
        .into_result()
        .context("Bucket provisioning failed")?;
    Ok(())
}

async fn run_bucket_command(app: &AppServices, command: BucketCommands, json: bool) -> Result<()> {
    let storage = &app.storage;
    match command {
        BucketCommands::List => {
            let buckets = storage.list_buckets().await?;
            emit(json, &buckets, |buckets| {
                buckets
                    .iter()
                    .map(|bucket| match bucket.creation_date {
                        Some(created) => format!("{}  {}", created.to_rfc3339(), bucket.name),
                        None => bucket.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        BucketCommands::Exists { name } => {
            let exists = storage.bucket_exists(&name).await?;
            emit(json, &exists, |exists| exists.to_string())
        }
        BucketCommands::Get { name } => {
            let bucket = storage.get_bucket(&name).await?;
            emit(json, &bucket, |bucket| format!("{:#?}", bucket))
        }
        BucketCommands::Create { name } => {
            let bucket = storage.create_bucket(&name).await?;
            emit(json, &bucket, |bucket| format!("Created bucket {}", bucket.name))
        }
        BucketCommands::Remove { name } => {
            storage.remove_bucket(&name).await?;
            emit(json, &name, |name| format!("Removed bucket {}", name))
        }
        BucketCommands::Describe { name } => {
            let configuration = storage.describe_bucket(&name).await?;
            emit(json, &configuration, |configuration| {
                format!("{:#?}", configuration)
            })
        }
    }
}

async fn run_object_command(app: &AppServices, command: ObjectCommands, json: bool) -> Result<()> {
    let storage = &app.storage;
    match command {
        ObjectCommands::Stat { bucket, key } => {
            let metadata = storage.stat_object(&key, &bucket).await?;
            emit(json, &metadata, |metadata| format!("{:#?}", metadata))
        }
        ObjectCommands::Upload {
            bucket,
            key,
            file,
            metadata,
        } => {
            let metadata = (!metadata.is_empty()).then(|| metadata.into_iter().collect::<HashMap<_, _>>());
            storage.upload(&file, &key, &bucket, metadata).await?;
            emit(json, &key, |key| format!("Uploaded {} to {}/{}", file.display(), bucket, key))
        }
        ObjectCommands::Download {
            bucket,
            key,
            output,
        } => {
            let destination = match output {
                Some(path) => path,
                None => PathBuf::from(ObjectKey::new(key.as_str())?.file_name()),
            };
            let path = storage.download_to_path(&destination, &key, &bucket).await?;
            emit(json, &path, |path| format!("Downloaded {}/{} to {}", bucket, key, path.display()))
        }
        ObjectCommands::Remove { bucket, key } => {
            storage.remove_object(&key, &bucket).await?;
            emit(json, &key, |key| format!("Removed {}/{}", bucket, key))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging()?;

    let config = cli.to_app_config()?;
    info!(backend = ?config.backend, endpoint = %config.connection.url, "Starting object-store-provisioner");

    let app = AppBuilder::new()
        .with_config(config.clone())
        .build()
        .await
        .context("Failed to build application")?;

    match cli.command {
        Commands::Provision => provision(&app, &config, cli.json).await,
        Commands::Bucket { command } => run_bucket_command(&app, command, cli.json).await,
        Commands::Object { command } => run_object_command(&app, command, cli.json).await,
    }
}
