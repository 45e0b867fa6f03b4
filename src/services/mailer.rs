use crate::error::{NotifierError, Result};
use crate::models::EmailMessage;
use async_trait::async_trait;
use aws_sdk_ses::Client;
use aws_sdk_ses::error::DisplayErrorContext;
use aws_sdk_ses::types::{Body, Content, Destination, Message};

const CHARSET: &str = "UTF-8";

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the message, returning the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String>;
}

/// Amazon SES transport. The client's region decides where mail is sent from.
pub struct SesMailer {
    client: Client,
}

impl SesMailer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn utf8_content(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset(CHARSET)
        .build()
        .map_err(|e| NotifierError::Dispatch(format!("invalid message content: {}", e)))
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String> {
        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .set_cc_addresses(Some(message.cc.clone()))
            .build();

        let body = Body::builder()
            .html(utf8_content(&message.html_body)?)
            .text(utf8_content(&message.text_body)?)
            .build();

        let content = Message::builder()
            .subject(utf8_content(&message.subject)?)
            .body(body)
            .build();

        let output = self
            .client
            .send_email()
            .source(&message.sender)
            .destination(destination)
            .message(content)
            .send()
            .await
            .map_err(|e| NotifierError::Dispatch(DisplayErrorContext(&e).to_string()))?;

        Ok(output.message_id().to_string())
    }
}
