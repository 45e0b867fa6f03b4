use crate::AppState;
use crate::error::{NotifierError, Result};
use crate::models::{DispatchStatus, EmailMessage, InvocationOutcome, ObjectMetadata, UploadEvent};
use crate::services::templates::{TemplateValues, render_template_file};
use aws_lambda_events::event::s3::S3Event;
use percent_encoding::percent_decode_str;
use tracing::{Span, error, info, warn};

/// Pulls bucket and key out of the first record of an S3 notification.
///
/// Keys arrive form-URL-encoded (`+` for spaces), so they are decoded before
/// being used against the S3 API.
pub fn extract_upload_event(event: &S3Event) -> Result<UploadEvent> {
    let record = event
        .records
        .first()
        .ok_or_else(|| NotifierError::Event("event contains no records".to_string()))?;

    let bucket = record
        .s3
        .bucket
        .name
        .as_deref()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| NotifierError::Event("record has no bucket name".to_string()))?;
    let raw_key = record
        .s3
        .object
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| NotifierError::Event("record has no object key".to_string()))?;

    Ok(UploadEvent {
        bucket: bucket.to_string(),
        key: decode_object_key(raw_key)?,
    })
}

fn decode_object_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|e| NotifierError::Event(format!("object key {:?} is not UTF-8: {}", raw, e)))
}

/// Handles one upload event end to end.
///
/// Metadata and dispatch failures are logged and absorbed; everything else
/// aborts the invocation before any email is sent.
#[tracing::instrument(name = "handle_upload", skip_all, fields(bucket, key))]
pub async fn handle_upload(state: &AppState, event: S3Event) -> Result<InvocationOutcome> {
    // 1. Extract
    let upload = extract_upload_event(&event)?;
    Span::current().record("bucket", upload.bucket.as_str());
    Span::current().record("key", upload.key.as_str());
    info!("📥 Upload received: {}/{}", upload.bucket, upload.key);

    // 2. Metadata (degraded on failure)
    let (metadata, metadata_degraded) = match state
        .storage
        .get_object_metadata(&upload.bucket, &upload.key)
        .await
    {
        Ok(metadata) => {
            info!("Metadata: activity name = {}", metadata.original_name);
            info!("Metadata: activity id = {}", metadata.activity_id);
            info!("Metadata: original file = {}", metadata.external_id);
            (metadata, false)
        }
        Err(e) => {
            warn!("⚠️  {}; continuing with empty metadata", e);
            (ObjectMetadata::default(), true)
        }
    };

    // 3. Authenticate + lookup
    let config = &state.config;
    let token = state
        .activities
        .exchange_token(&config.client_id, &config.client_secret, &config.code)
        .await?;
    let activity = state
        .activities
        .get_activity(&metadata.activity_id, &token)
        .await?;

    let name_changed = activity.name != metadata.original_name;
    if name_changed {
        info!(
            original = %metadata.original_name,
            current = %activity.name,
            "The activity name has changed since its file was downloaded"
        );
    } else {
        info!("The activity name has NOT changed since its file was downloaded");
    }

    // 4. Compose
    let url = state
        .storage
        .generate_presigned_url(&upload.bucket, &upload.key, config.link_expiry)
        .await?;
    let values = TemplateValues {
        url,
        current_activity_name: activity.name.clone(),
        activity_id: metadata.activity_id.clone(),
        external_id: metadata.external_id.clone(),
    };
    let html_body = render_template_file(&config.html_template, &values).await?;
    let text_body = render_template_file(&config.text_template, &values).await?;

    let message = EmailMessage {
        sender: config.sender.clone(),
        to: config.recipients.clone(),
        cc: config.cc.clone(),
        subject: config.subject.clone(),
        html_body,
        text_body,
    };

    // 5. Dispatch (absorbed on failure)
    let dispatch = match state.mailer.send(&message).await {
        Ok(message_id) => {
            info!("✅ Email sent! Message ID: {}", message_id);
            DispatchStatus::Sent { message_id }
        }
        Err(e) => {
            error!("❌ {}", e);
            DispatchStatus::Failed {
                reason: e.to_string(),
            }
        }
    };

    Ok(InvocationOutcome {
        bucket: upload.bucket,
        key: upload.key,
        activity_id: metadata.activity_id,
        current_activity_name: activity.name,
        name_changed,
        metadata_degraded,
        dispatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s3_event(bucket: Option<&str>, key: Option<&str>) -> S3Event {
        serde_json::from_value(json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "eu-west-1",
                "eventTime": "2024-05-04T07:12:33.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": { "principalId": "AWS:AIDAEXAMPLE" },
                "requestParameters": { "sourceIPAddress": "203.0.113.7" },
                "responseElements": {
                    "x-amz-request-id": "C3D13FE58DE4C810",
                    "x-amz-id-2": "FMyUVURIY8/IgAtTv8xRjskZQpcIZ9KG4V5Wp6S7S/JRWeUWerMUE5JgHvANOjpD"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "ride-uploaded",
                    "bucket": {
                        "name": bucket,
                        "ownerIdentity": { "principalId": "A3NL1KOZZKExample" },
                        "arn": "arn:aws:s3:::rides"
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                        "sequencer": "0055AED6DCD90281E5"
                    }
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_bucket_and_key() {
        let upload = extract_upload_event(&s3_event(Some("b"), Some("k"))).unwrap();
        assert_eq!(upload.bucket, "b");
        assert_eq!(upload.key, "k");
    }

    #[test]
    fn test_extract_decodes_key() {
        let upload =
            extract_upload_event(&s3_event(Some("b"), Some("rides/Morning+Ride%281%29.fit")))
                .unwrap();
        assert_eq!(upload.key, "rides/Morning Ride(1).fit");
    }

    #[test]
    fn test_extract_rejects_missing_fields() {
        assert!(matches!(
            extract_upload_event(&s3_event(None, Some("k"))),
            Err(NotifierError::Event(_))
        ));
        assert!(matches!(
            extract_upload_event(&s3_event(Some("b"), None)),
            Err(NotifierError::Event(_))
        ));
        let empty: S3Event = serde_json::from_value(json!({ "Records": [] })).unwrap();
        assert!(matches!(
            extract_upload_event(&empty),
            Err(NotifierError::Event(_))
        ));
    }
}
