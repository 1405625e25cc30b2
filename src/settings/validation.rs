//! Submission rules.
//!
//! `validate` is pure: it looks only at the submitted map and never touches a
//! store, so the all-or-nothing decision can be tested on its own.

use crate::settings::types::{FieldError, SettingsField, ValidatedSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::SecretString;
use std::borrow::Cow;
use std::collections::HashMap;
use url::{Host, Url};
use validator::{Validate, ValidationError};

/// Letters only.
static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid regex"));

/// Letters, digits, dashes and underscores.
static ALPHA_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

/// Validation view of a submission. Blank values are `None`, so `required`
/// rejects them and optional rules skip them.
#[derive(Debug, Default, Validate)]
struct SettingsForm {
    #[validate(
        required(message = "The Site Name field is required."),
        length(max = 100, message = "The Site Name may not be greater than 100 characters.")
    )]
    site_name: Option<String>,

    #[validate(
        required(message = "The Site Skin field is required."),
        regex(
            path = *ALPHA_DASH,
            message = "The Site Skin may only contain letters, numbers, dashes and underscores."
        )
    )]
    site_skin: Option<String>,

    #[validate(
        required(message = "The Mail Driver field is required."),
        regex(path = *ALPHA, message = "The Mail Driver may only contain letters.")
    )]
    mail_driver: Option<String>,

    #[validate(custom(function = "validate_mail_host"))]
    mail_host: Option<String>,

    #[validate(custom(function = "validate_numeric"))]
    mail_port: Option<String>,

    #[validate(
        required(message = "The Mail from Address field is required."),
        email(message = "The Mail from Address must be a valid email address.")
    )]
    mail_from_address: Option<String>,

    #[validate(
        required(message = "The Mail from Name field is required."),
        length(max = 100, message = "The Mail from Name may not be greater than 100 characters.")
    )]
    mail_from_name: Option<String>,

    #[validate(regex(path = *ALPHA, message = "The Encryption may only contain letters."))]
    mail_encryption: Option<String>,

    #[validate(length(
        max = 100,
        message = "The Server Username may not be greater than 100 characters."
    ))]
    mail_username: Option<String>,

    #[validate(length(
        max = 100,
        message = "The Server Password may not be greater than 100 characters."
    ))]
    mail_password: Option<String>,
}

impl SettingsForm {
    fn from_input(input: &HashMap<String, String>) -> Self {
        let present = |field: SettingsField| {
            input
                .get(field.form_key())
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };
        Self {
            site_name: present(SettingsField::SiteName),
            site_skin: present(SettingsField::SiteSkin),
            mail_driver: present(SettingsField::MailDriver),
            mail_host: present(SettingsField::MailHost),
            mail_port: present(SettingsField::MailPort),
            mail_from_address: present(SettingsField::MailFromAddress),
            mail_from_name: present(SettingsField::MailFromName),
            mail_encryption: present(SettingsField::MailEncryption),
            mail_username: present(SettingsField::MailUsername),
            mail_password: present(SettingsField::MailPassword),
        }
    }
}

/// Name of the `SettingsForm` member that carries `field`.
fn struct_field(field: SettingsField) -> &'static str {
    match field {
        SettingsField::SiteName => "site_name",
        SettingsField::SiteSkin => "site_skin",
        SettingsField::CronToken => "cron_token",
        SettingsField::MailDriver => "mail_driver",
        SettingsField::MailHost => "mail_host",
        SettingsField::MailPort => "mail_port",
        SettingsField::MailFromAddress => "mail_from_address",
        SettingsField::MailFromName => "mail_from_name",
        SettingsField::MailEncryption => "mail_encryption",
        SettingsField::MailUsername => "mail_username",
        SettingsField::MailPassword => "mail_password",
    }
}

/// Accepts an absolute URL or a bare host name / IP address.
fn validate_mail_host(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let is_url = Url::parse(value).is_ok_and(|url| url.has_host());
    if is_url || Host::parse(value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("url")
            .with_message(Cow::Borrowed("The Server Name format is invalid.")))
    }
}

fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(ValidationError::new("numeric")
            .with_message(Cow::Borrowed("The Server Port must be a number."))),
    }
}

/// Check every writable field of `input`. Keys outside the writable set are
/// ignored. On failure, one message per invalid field is returned in field
/// order.
pub fn validate(input: &HashMap<String, String>) -> Result<ValidatedSettings, Vec<FieldError>> {
    let form = SettingsForm::from_input(input);

    if let Err(errors) = form.validate() {
        let by_field = errors.field_errors();
        let field_errors = SettingsField::WRITABLE
            .into_iter()
            .filter_map(|field| {
                let first = by_field.get(struct_field(field))?.first()?;
                let message = first
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("The {} is invalid.", field.label()));
                Some(FieldError::new(field, message))
            })
            .collect();
        return Err(field_errors);
    }

    let raw = |field: SettingsField| input.get(field.form_key()).cloned().unwrap_or_default();
    Ok(ValidatedSettings {
        site_name: raw(SettingsField::SiteName),
        site_skin: raw(SettingsField::SiteSkin),
        mail_driver: raw(SettingsField::MailDriver),
        mail_host: raw(SettingsField::MailHost),
        mail_port: raw(SettingsField::MailPort),
        mail_from_address: raw(SettingsField::MailFromAddress),
        mail_from_name: raw(SettingsField::MailFromName),
        mail_encryption: raw(SettingsField::MailEncryption),
        mail_username: raw(SettingsField::MailUsername),
        mail_password: SecretString::new(raw(SettingsField::MailPassword)),
    })
}
