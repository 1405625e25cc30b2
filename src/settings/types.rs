//! Settings schema
//!
//! The page manages eleven configuration keys. Each one has a form key (the
//! camelCase name used in HTML forms), a store key (the dotted name in the
//! configuration store) and a display label. `cronToken` is shown but never
//! accepted from a form.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Page title shared by the form view.
pub const SETTINGS_TITLE: &str = "Settings";

/// Status message after a successful save.
pub const SAVED_MESSAGE: &str = "The Settings was successfully updated.";

/// Status message after a rejected submission.
pub const REJECTED_MESSAGE: &str = "Please correct the errors below.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingsField {
    SiteName,
    SiteSkin,
    CronToken,
    MailDriver,
    MailHost,
    MailPort,
    MailFromAddress,
    MailFromName,
    MailEncryption,
    MailUsername,
    MailPassword,
}

impl SettingsField {
    /// Every managed key, in display order.
    pub const ALL: [Self; 11] = [
        Self::SiteName,
        Self::SiteSkin,
        Self::CronToken,
        Self::MailDriver,
        Self::MailHost,
        Self::MailPort,
        Self::MailFromAddress,
        Self::MailFromName,
        Self::MailEncryption,
        Self::MailUsername,
        Self::MailPassword,
    ];

    /// Keys accepted from a submitted form, in validation order.
    pub const WRITABLE: [Self; 10] = [
        Self::SiteName,
        Self::SiteSkin,
        Self::MailDriver,
        Self::MailHost,
        Self::MailPort,
        Self::MailFromAddress,
        Self::MailFromName,
        Self::MailEncryption,
        Self::MailUsername,
        Self::MailPassword,
    ];

    pub fn form_key(self) -> &'static str {
        match self {
            Self::SiteName => "siteName",
            Self::SiteSkin => "siteSkin",
            Self::CronToken => "cronToken",
            Self::MailDriver => "mailDriver",
            Self::MailHost => "mailHost",
            Self::MailPort => "mailPort",
            Self::MailFromAddress => "mailFromAddress",
            Self::MailFromName => "mailFromName",
            Self::MailEncryption => "mailEncryption",
            Self::MailUsername => "mailUsername",
            Self::MailPassword => "mailPassword",
        }
    }

    pub fn store_key(self) -> &'static str {
        match self {
            Self::SiteName => "app.name",
            Self::SiteSkin => "app.color_scheme",
            Self::CronToken => "app.cronToken",
            Self::MailDriver => "mail.driver",
            Self::MailHost => "mail.host",
            Self::MailPort => "mail.port",
            Self::MailFromAddress => "mail.from.address",
            Self::MailFromName => "mail.from.name",
            Self::MailEncryption => "mail.encryption",
            Self::MailUsername => "mail.username",
            Self::MailPassword => "mail.password",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SiteName => "Site Name",
            Self::SiteSkin => "Site Skin",
            Self::CronToken => "Cron Token",
            Self::MailDriver => "Mail Driver",
            Self::MailHost => "Server Name",
            Self::MailPort => "Server Port",
            Self::MailFromAddress => "Mail from Address",
            Self::MailFromName => "Mail from Name",
            Self::MailEncryption => "Encryption",
            Self::MailUsername => "Server Username",
            Self::MailPassword => "Server Password",
        }
    }

    pub fn is_writable(self) -> bool {
        self != Self::CronToken
    }

    pub fn from_form_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.form_key() == key)
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_key())
    }
}

/// Current values of all managed keys, as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub site_name: String,
    pub site_skin: String,
    pub cron_token: String,
    pub mail_driver: String,
    pub mail_host: String,
    pub mail_port: String,
    pub mail_from_address: String,
    pub mail_from_name: String,
    pub mail_encryption: String,
    pub mail_username: String,
    pub mail_password: String,
}

impl SettingsRecord {
    pub fn get(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::SiteName => &self.site_name,
            SettingsField::SiteSkin => &self.site_skin,
            SettingsField::CronToken => &self.cron_token,
            SettingsField::MailDriver => &self.mail_driver,
            SettingsField::MailHost => &self.mail_host,
            SettingsField::MailPort => &self.mail_port,
            SettingsField::MailFromAddress => &self.mail_from_address,
            SettingsField::MailFromName => &self.mail_from_name,
            SettingsField::MailEncryption => &self.mail_encryption,
            SettingsField::MailUsername => &self.mail_username,
            SettingsField::MailPassword => &self.mail_password,
        }
    }

    pub fn set(&mut self, field: SettingsField, value: impl Into<String>) {
        let slot = match field {
            SettingsField::SiteName => &mut self.site_name,
            SettingsField::SiteSkin => &mut self.site_skin,
            SettingsField::CronToken => &mut self.cron_token,
            SettingsField::MailDriver => &mut self.mail_driver,
            SettingsField::MailHost => &mut self.mail_host,
            SettingsField::MailPort => &mut self.mail_port,
            SettingsField::MailFromAddress => &mut self.mail_from_address,
            SettingsField::MailFromName => &mut self.mail_from_name,
            SettingsField::MailEncryption => &mut self.mail_encryption,
            SettingsField::MailUsername => &mut self.mail_username,
            SettingsField::MailPassword => &mut self.mail_password,
        };
        *slot = value.into();
    }

    /// Replace writable fields with the values a rejected submission carried,
    /// so the form redisplays what the administrator typed.
    pub fn overlay_input(&mut self, input: &HashMap<String, String>) {
        for field in SettingsField::WRITABLE {
            if let Some(value) = input.get(field.form_key()) {
                self.set(field, value.clone());
            }
        }
    }

    /// Copy with the mail password replaced by a fixed mask.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.mail_password.is_empty() {
            copy.mail_password = "********".to_string();
        }
        copy
    }
}

/// A submission that passed every rule. Absent optional fields hold the
/// empty string.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub site_name: String,
    pub site_skin: String,
    pub mail_driver: String,
    pub mail_host: String,
    pub mail_port: String,
    pub mail_from_address: String,
    pub mail_from_name: String,
    pub mail_encryption: String,
    pub mail_username: String,
    pub mail_password: SecretString,
}

impl ValidatedSettings {
    /// `(store key, value)` pairs for every writable field.
    pub fn store_entries(&self) -> Vec<(&'static str, &str)> {
        SettingsField::WRITABLE
            .into_iter()
            .map(|field| (field.store_key(), self.value(field)))
            .collect()
    }

    fn value(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::SiteName => &self.site_name,
            SettingsField::SiteSkin => &self.site_skin,
            SettingsField::MailDriver => &self.mail_driver,
            SettingsField::MailHost => &self.mail_host,
            SettingsField::MailPort => &self.mail_port,
            SettingsField::MailFromAddress => &self.mail_from_address,
            SettingsField::MailFromName => &self.mail_from_name,
            SettingsField::MailEncryption => &self.mail_encryption,
            SettingsField::MailUsername => &self.mail_username,
            SettingsField::MailPassword => self.mail_password.expose_secret(),
            SettingsField::CronToken => "",
        }
    }
}

/// One message for one invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: SettingsField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: SettingsField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Result of one `submit_settings` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Every field validated and the batch was written.
    Saved { status: String },
    /// Nothing was written. `input` holds the writable fields as submitted.
    Rejected {
        status: String,
        errors: Vec<FieldError>,
        input: HashMap<String, String>,
    },
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}
