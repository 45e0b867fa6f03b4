pub mod mailer;
pub mod storage;
pub mod strava;
pub mod templates;
