use crate::config::NotifierConfig;
use crate::services::mailer::SesMailer;
use crate::services::storage::S3StorageService;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;
use tracing::info;

/// Shared AWS configuration from the ambient credential chain (the Lambda
/// execution role, or a local profile).
pub async fn load_aws_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

pub fn setup_storage(aws_config: &SdkConfig) -> Arc<S3StorageService> {
    let s3_client = aws_sdk_s3::Client::new(aws_config);
    info!(
        "☁️  S3 client ready (region: {})",
        aws_config
            .region()
            .map(|r| r.as_ref())
            .unwrap_or("unset")
    );
    Arc::new(S3StorageService::new(s3_client))
}

/// SES always sends from the configured region, whatever region the
/// function itself runs in.
pub fn setup_mailer(aws_config: &SdkConfig, config: &NotifierConfig) -> Arc<SesMailer> {
    let ses_config = aws_sdk_ses::config::Builder::from(aws_config)
        .region(Region::new(config.ses_region.clone()))
        .build();
    info!("✉️  SES client ready (region: {})", config.ses_region);
    Arc::new(SesMailer::new(aws_sdk_ses::Client::from_conf(ses_config)))
}
