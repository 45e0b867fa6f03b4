use crate::error::{NotifierError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SES_REGION: &str = "eu-west-1";
pub const DEFAULT_STRAVA_BASE_URL: &str = "https://www.strava.com";
pub const MAX_LINK_EXPIRY_HOURS: u64 = 7 * 24;

const REQUIRED_KEYS: [&str; 7] = [
    "CLIENT_ID",
    "CLIENT_SECRET",
    "CODE",
    "SENDER",
    "RECIPIENT_EMAIL",
    "CC_EMAIL",
    "EMAIL_SUBJECT",
];

/// Runtime configuration for the upload notifier
#[derive(Clone)]
pub struct NotifierConfig {
    /// Strava application client id
    pub client_id: String,

    /// Strava application client secret
    pub client_secret: String,

    /// Authorization code obtained through the manual OAuth consent step
    pub code: String,

    /// Verified SES sender address
    pub sender: String,

    /// To addresses (one or more)
    pub recipients: Vec<String>,

    /// Cc addresses (one or more)
    pub cc: Vec<String>,

    /// Subject line of the notification
    pub subject: String,

    /// SES region (default: "eu-west-1")
    pub ses_region: String,

    /// Lifetime of the presigned download link (default: 48 hours)
    pub link_expiry: Duration,

    /// HTML body template (default: "templates/html_body.txt")
    pub html_template: PathBuf,

    /// Plain-text body template (default: "templates/text_body.txt")
    pub text_template: PathBuf,

    /// Strava API origin (default: "https://www.strava.com")
    pub strava_base_url: String,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("code", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("cc", &self.cc)
            .field("subject", &self.subject)
            .field("ses_region", &self.ses_region)
            .field("link_expiry", &self.link_expiry)
            .field("html_template", &self.html_template)
            .field("text_template", &self.text_template)
            .field("strava_base_url", &self.strava_base_url)
            .finish()
    }
}

impl NotifierConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Fails listing every missing required key at once, so a misconfigured
    /// deployment is fixed in one round.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(NotifierError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| get(key).unwrap_or_default();

        let recipients = parse_address_list(&required("RECIPIENT_EMAIL"));
        if recipients.is_empty() {
            return Err(NotifierError::Config(
                "RECIPIENT_EMAIL contains no addresses".to_string(),
            ));
        }
        let cc = parse_address_list(&required("CC_EMAIL"));
        if cc.is_empty() {
            return Err(NotifierError::Config(
                "CC_EMAIL contains no addresses".to_string(),
            ));
        }

        let expiry_hours: u64 = match get("LINK_EXPIRY_HOURS") {
            Some(v) => v.trim().parse().map_err(|_| {
                NotifierError::Config(format!("LINK_EXPIRY_HOURS is not a number: {}", v))
            })?,
            None => 48,
        };
        // SigV4 presigned URLs cannot outlive one week
        let link_expiry_secs = Some(expiry_hours)
            .filter(|h| (1..=MAX_LINK_EXPIRY_HOURS).contains(h))
            .and_then(|h| h.checked_mul(3600))
            .ok_or_else(|| {
                NotifierError::Config(format!(
                    "LINK_EXPIRY_HOURS must be between 1 and {}, got {}",
                    MAX_LINK_EXPIRY_HOURS, expiry_hours
                ))
            })?;

        Ok(Self {
            client_id: required("CLIENT_ID"),
            client_secret: required("CLIENT_SECRET"),
            code: required("CODE"),
            sender: required("SENDER"),
            recipients,
            cc,
            subject: required("EMAIL_SUBJECT"),
            ses_region: get("SES_REGION").unwrap_or_else(|| DEFAULT_SES_REGION.to_string()),
            link_expiry: Duration::from_secs(link_expiry_secs),
            html_template: get("HTML_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("templates/html_body.txt")),
            text_template: get("TEXT_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("templates/text_body.txt")),
            strava_base_url: get("STRAVA_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_STRAVA_BASE_URL.to_string()),
        })
    }
}

fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("CLIENT_ID", "1234"),
            ("CLIENT_SECRET", "shh"),
            ("CODE", "abc"),
            ("SENDER", "rides@example.com"),
            ("RECIPIENT_EMAIL", "coach@example.com"),
            ("CC_EMAIL", "me@example.com"),
            ("EMAIL_SUBJECT", "New ride uploaded"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<NotifierConfig> {
        NotifierConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.ses_region, "eu-west-1");
        assert_eq!(config.link_expiry, Duration::from_secs(48 * 3600));
        assert_eq!(config.strava_base_url, "https://www.strava.com");
        assert_eq!(config.html_template, PathBuf::from("templates/html_body.txt"));
        assert_eq!(config.recipients, vec!["coach@example.com"]);
        assert_eq!(config.cc, vec!["me@example.com"]);
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let mut vars = base_env();
        vars.remove("CODE");
        vars.insert("SENDER", "   ");
        let err = load(&vars).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CODE"));
        assert!(msg.contains("SENDER"));
        assert!(!msg.contains("CLIENT_ID"));
    }

    #[test]
    fn test_address_lists() {
        let mut vars = base_env();
        vars.insert("RECIPIENT_EMAIL", "a@example.com, b@example.com,,");
        let config = load(&vars).unwrap();
        assert_eq!(config.recipients, vec!["a@example.com", "b@example.com"]);

        vars.insert("CC_EMAIL", " , ");
        assert!(matches!(load(&vars), Err(NotifierError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_env();
        vars.insert("LINK_EXPIRY_HOURS", "2");
        vars.insert("SES_REGION", "us-east-1");
        vars.insert("STRAVA_BASE_URL", "http://127.0.0.1:9999/");
        let config = load(&vars).unwrap();
        assert_eq!(config.link_expiry, Duration::from_secs(7200));
        assert_eq!(config.ses_region, "us-east-1");
        assert_eq!(config.strava_base_url, "http://127.0.0.1:9999");

        vars.insert("LINK_EXPIRY_HOURS", "two");
        assert!(matches!(load(&vars), Err(NotifierError::Config(_))));
    }

    #[test]
    fn test_link_expiry_bounds() {
        let mut vars = base_env();
        vars.insert("LINK_EXPIRY_HOURS", "1");
        assert_eq!(load(&vars).unwrap().link_expiry, Duration::from_secs(3600));
        vars.insert("LINK_EXPIRY_HOURS", "168");
        assert_eq!(
            load(&vars).unwrap().link_expiry,
            Duration::from_secs(7 * 24 * 3600)
        );

        for value in ["0", "169", "18446744073709551615"] {
            vars.insert("LINK_EXPIRY_HOURS", value);
            let err = load(&vars).unwrap_err();
            assert!(matches!(err, NotifierError::Config(_)), "{}", value);
            assert!(err.to_string().contains("between 1 and 168"));
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("shh"));
        assert!(printed.contains("<redacted>"));
    }
}
