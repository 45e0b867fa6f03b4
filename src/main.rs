use aws_lambda_events::event::s3::S3Event;
use dotenvy::dotenv;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use std::sync::Arc;
use strava_upload_notifier::config::NotifierConfig;
use strava_upload_notifier::infrastructure::{storage, telemetry};
use strava_upload_notifier::models::InvocationOutcome;
use strava_upload_notifier::services::strava::StravaClient;
use strava_upload_notifier::{AppState, handle_upload};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();
    telemetry::init_lambda_tracing();

    // Fail at cold start rather than on the first event
    let config = NotifierConfig::from_env()?;
    info!(
        "🚀 Starting upload notifier: {} recipient(s), {} cc, link expiry {}h",
        config.recipients.len(),
        config.cc.len(),
        config.link_expiry.as_secs() / 3600
    );

    let aws_config = storage::load_aws_config().await;
    let state = AppState {
        storage: storage::setup_storage(&aws_config),
        mailer: storage::setup_mailer(&aws_config, &config),
        activities: Arc::new(StravaClient::new(config.strava_base_url.clone())),
        config,
    };
    let state = &state;

    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        let (payload, context) = event.into_parts();
        info!(request_id = %context.request_id, "Invocation started");
        let outcome: InvocationOutcome = handle_upload(state, payload).await?;
        Ok::<_, Error>(outcome)
    }))
    .await
}
