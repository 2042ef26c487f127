//! Typed settings documents stored in the `settings` JSON columns.

use serde::{Deserialize, Serialize};

/// Accepted in place of an address: resolved to the submitter's email at send time.
pub const SENDER_EMAIL_PLACEHOLDER: &str = "{{sender-email}}";

/// Longest display name accepted for recipient names.
pub const MAX_NAME_LEN: usize = 40;

// ── Form ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    #[serde(default)]
    pub honeypots: Vec<String>,
    #[serde(default)]
    pub fields: FormFields,
    #[serde(default)]
    pub mailer: MailerSettings,
}

/// Submission field names the widget posts, each optionally required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    #[serde(default)]
    pub name: FieldSetting,
    #[serde(default)]
    pub email: FieldSetting,
    #[serde(default)]
    pub phone: FieldSetting,
    #[serde(default)]
    pub url: FieldSetting,
    #[serde(default)]
    pub subject: FieldSetting,
    #[serde(default)]
    pub content: FieldSetting,
    #[serde(default)]
    pub policy: FieldSetting,
}

impl FormFields {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldSetting)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("url", &self.url),
            ("subject", &self.subject),
            ("content", &self.content),
            ("policy", &self.policy),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSetting {
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailerSettings {
    #[serde(rename = "type", default)]
    pub sender_type: SenderType,
    pub smtp: Option<SmtpSettings>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderType {
    #[default]
    #[serde(rename = "SMTP")]
    Smtp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub encryption: SmtpEncryption,
    #[serde(default)]
    pub authentication: SmtpAuthentication,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmtpEncryption {
    None,
    #[default]
    Tls,
    StartTls,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmtpAuthentication {
    #[serde(rename = "NONE")]
    None,
    #[default]
    #[serde(rename = "PLAIN")]
    Plain,
    #[serde(rename = "LOGIN")]
    Login,
    #[serde(rename = "CRAM-MD5")]
    CramMd5,
}

impl FormSettings {
    /// Returns the first rule violation as a client-facing message.
    pub fn validate(&self) -> Result<(), String> {
        for (field, setting) in self.fields.iter() {
            if let Some(name) = &setting.name {
                if !is_valid_field_name(name) {
                    return Err(format!("invalid name for field {field}: {name}"));
                }
            }
        }
        for honeypot in &self.honeypots {
            if !is_valid_field_name(honeypot) {
                return Err(format!("invalid honeypot field name: {honeypot}"));
            }
        }
        match (self.mailer.sender_type, &self.mailer.smtp) {
            (SenderType::Smtp, None) => Err("SMTP settings are required".to_owned()),
            (SenderType::Smtp, Some(smtp)) => smtp.validate(),
        }
    }
}

impl SmtpSettings {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("SMTP host is required".to_owned());
        }
        if self.port == 0 {
            return Err("SMTP port must be between 1 and 65535".to_owned());
        }
        if self.user.is_empty() || self.password.is_empty() {
            return Err("SMTP user and password are required".to_owned());
        }
        Ok(())
    }
}

// ── User ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_locale() -> String {
    "en_US".to_owned()
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            timezone: default_timezone(),
        }
    }
}

// ── Recipient ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSettings {
    #[serde(default)]
    pub reply_to: Option<ReplyTo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub name: Option<String>,
    pub email: String,
}

// ── Validation helpers ───────────────────────────────────────────────────────

/// `^[A-Za-z][A-Za-z0-9_:.-]*$`
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

/// Host name made of dot-separated labels; at least two labels.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

pub fn is_valid_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && local.len() <= 64
                && !local.chars().any(|c| c.is_whitespace() || c == '@')
                && is_valid_domain(domain)
        }
        None => false,
    }
}

/// Email address or the sender placeholder.
pub fn is_valid_target_email(email: &str) -> bool {
    email == SENDER_EMAIL_PLACEHOLDER || is_valid_email(email)
}
