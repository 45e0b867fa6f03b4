use anyhow::{Context, bail};
use aws_lambda_events::event::s3::S3Event;
use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use strava_upload_notifier::config::NotifierConfig;
use strava_upload_notifier::infrastructure::{storage, telemetry};
use strava_upload_notifier::services::strava::StravaClient;
use strava_upload_notifier::{AppState, handle_upload};
use tracing::{error, info};

/// Run a single upload notification against the real services, outside Lambda.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// S3 notification JSON to replay
    #[arg(short, long, conflicts_with_all = ["bucket", "key"])]
    event: Option<PathBuf>,

    /// Bucket of the uploaded object (used with --key)
    #[arg(short, long, requires = "key")]
    bucket: Option<String>,

    /// Key of the uploaded object, as it would appear in the notification
    #[arg(short, long, requires = "bucket")]
    key: Option<String>,
}

fn synthetic_event(bucket: &str, key: &str) -> anyhow::Result<S3Event> {
    let event = serde_json::json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "eventTime": "1970-01-01T00:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": { "principalId": "local" },
            "requestParameters": { "sourceIPAddress": "127.0.0.1" },
            "responseElements": {},
            "s3": {
                "s3SchemaVersion": "1.0",
                "bucket": { "name": bucket, "ownerIdentity": { "principalId": "local" } },
                "object": { "key": key }
            }
        }]
    });
    Ok(serde_json::from_value(event)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    telemetry::init_tracing();

    let event = match (&args.event, &args.bucket, &args.key) {
        (Some(path), _, _) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<S3Event>(&raw)
                .with_context(|| format!("{} is not an S3 notification", path.display()))?
        }
        (None, Some(bucket), Some(key)) => synthetic_event(bucket, key)?,
        _ => bail!("pass either --event <file> or --bucket <name> --key <key>"),
    };

    let config = NotifierConfig::from_env()?;
    info!("🔧 Loaded configuration: {:?}", config);

    let aws_config = storage::load_aws_config().await;
    let state = AppState {
        storage: storage::setup_storage(&aws_config),
        mailer: storage::setup_mailer(&aws_config, &config),
        activities: Arc::new(StravaClient::new(config.strava_base_url.clone())),
        config,
    };

    match handle_upload(&state, event).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) => {
            error!("❌ Invocation aborted: {}", e);
            Err(e.into())
        }
    }
}
