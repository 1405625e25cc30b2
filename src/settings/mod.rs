//! Settings module: the admin page for site and mailer configuration.
//!
//! `service` holds the two operations (show the form, submit it), `validation`
//! the field rules, `view` the HTML, and `handler` the routes.

pub mod flash;
pub mod handler;
pub mod service;
pub mod types;
pub mod validation;
pub mod view;

pub use flash::{Flash, FlashLevel};
pub use handler::admin_routes;
pub use service::SettingsService;
pub use types::{
    FieldError, SettingsField, SettingsRecord, SubmitOutcome, ValidatedSettings, SAVED_MESSAGE,
    SETTINGS_TITLE,
};
pub use validation::validate;
pub use view::{HtmlSettingsView, SettingsPage, SettingsView};
