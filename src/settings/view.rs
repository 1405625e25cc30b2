//! HTML rendering for the settings and login pages.

use crate::settings::flash::Flash;
use crate::settings::types::{SettingsField, SettingsRecord};
use std::fmt::Write;

/// Everything the settings form needs to render.
#[derive(Debug, Clone)]
pub struct SettingsPage<'a> {
    pub title: &'a str,
    pub record: &'a SettingsRecord,
    pub flash: Option<&'a Flash>,
    pub csrf_token: &'a str,
}

/// Turns page data into a response body.
pub trait SettingsView: Send + Sync {
    fn render_settings(&self, page: &SettingsPage<'_>) -> String;

    fn render_login(&self, error: Option<&str>) -> String;
}

/// Built-in renderer producing a plain, dependency-free HTML form.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSettingsView;

const APPLICATION_FIELDS: [SettingsField; 3] = [
    SettingsField::SiteName,
    SettingsField::SiteSkin,
    SettingsField::CronToken,
];

const MAILER_FIELDS: [SettingsField; 8] = [
    SettingsField::MailDriver,
    SettingsField::MailHost,
    SettingsField::MailPort,
    SettingsField::MailFromAddress,
    SettingsField::MailFromName,
    SettingsField::MailEncryption,
    SettingsField::MailUsername,
    SettingsField::MailPassword,
];

impl HtmlSettingsView {
    fn field_error<'a>(flash: Option<&'a Flash>, field: SettingsField) -> Option<&'a str> {
        flash?
            .errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn write_fieldset(
        out: &mut String,
        legend: &str,
        fields: &[SettingsField],
        page: &SettingsPage<'_>,
    ) {
        let _ = writeln!(out, "<fieldset><legend>{}</legend>", escape_html(legend));
        for &field in fields {
            let key = field.form_key();
            let input_type = match field {
                SettingsField::MailPassword => "password",
                SettingsField::MailFromAddress => "email",
                _ => "text",
            };
            let readonly = if field.is_writable() { "" } else { " readonly" };
            let _ = writeln!(
                out,
                r#"<div class="form-group"><label for="{key}">{label}</label><input type="{input_type}" id="{key}" name="{key}" value="{value}"{readonly}>"#,
                label = escape_html(field.label()),
                value = escape_html(page.record.get(field)),
            );
            if let Some(message) = Self::field_error(page.flash, field) {
                let _ = write!(
                    out,
                    r#"<span class="help-block error">{}</span>"#,
                    escape_html(message)
                );
            }
            out.push_str("</div>\n");
        }
        out.push_str("</fieldset>\n");
    }
}

impl SettingsView for HtmlSettingsView {
    fn render_settings(&self, page: &SettingsPage<'_>) -> String {
        let mut body = String::with_capacity(4096);

        if let Some(flash) = page.flash {
            let _ = writeln!(
                body,
                r#"<div class="alert alert-{}">{}</div>"#,
                flash.level.as_str(),
                escape_html(&flash.message)
            );
            if !flash.errors.is_empty() {
                body.push_str("<ul class=\"errors\">\n");
                for error in &flash.errors {
                    let _ = writeln!(body, "<li>{}</li>", escape_html(&error.message));
                }
                body.push_str("</ul>\n");
            }
        }

        body.push_str("<form method=\"post\" action=\"/admin/settings\">\n");
        let _ = writeln!(
            body,
            r#"<input type="hidden" name="_token" value="{}">"#,
            escape_html(page.csrf_token)
        );
        Self::write_fieldset(&mut body, "Application", &APPLICATION_FIELDS, page);
        Self::write_fieldset(&mut body, "Mailer", &MAILER_FIELDS, page);
        body.push_str("<button type=\"submit\">Save</button>\n</form>\n");
        let _ = writeln!(
            body,
            r#"<form method="post" action="/admin/logout"><input type="hidden" name="_token" value="{}"><button type="submit">Sign out</button></form>"#,
            escape_html(page.csrf_token)
        );

        layout(page.title, &body)
    }

    fn render_login(&self, error: Option<&str>) -> String {
        let mut body = String::new();
        if let Some(message) = error {
            let _ = writeln!(
                body,
                r#"<div class="alert alert-danger">{}</div>"#,
                escape_html(message)
            );
        }
        body.push_str(
            "<form method=\"post\" action=\"/admin/login\">\n\
             <label for=\"token\">Admin Token</label>\
             <input type=\"password\" id=\"token\" name=\"token\">\n\
             <button type=\"submit\">Sign in</button>\n</form>\n",
        );
        layout("Sign in", &body)
    }
}

fn layout(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::flash::FlashLevel;
    use crate::settings::types::FieldError;
    use std::collections::HashMap;

    fn record() -> SettingsRecord {
        SettingsRecord {
            site_name: "My <Site>".to_string(),
            cron_token: "abc123".to_string(),
            mail_from_address: "a@b.com".to_string(),
            ..SettingsRecord::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_contains_every_field_and_token() {
        let record = record();
        let html = HtmlSettingsView.render_settings(&SettingsPage {
            title: "Settings",
            record: &record,
            flash: None,
            csrf_token: "csrf-value",
        });

        for field in SettingsField::ALL {
            assert!(
                html.contains(&format!("name=\"{}\"", field.form_key())),
                "missing {field}"
            );
        }
        assert!(html.contains("<title>Settings</title>"));
        assert!(html.contains(r#"name="_token" value="csrf-value""#));
        assert!(html.contains("value=\"My &lt;Site&gt;\""));
        assert!(html.contains(r#"name="cronToken" value="abc123" readonly"#));
        assert!(html.contains(r#"<form method="post" action="/admin/logout"><input type="hidden" name="_token" value="csrf-value">"#));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn test_render_flash_and_field_errors() {
        let record = record();
        let flash = Flash {
            level: FlashLevel::Danger,
            message: "Please correct the errors below.".to_string(),
            errors: vec![FieldError::new(
                SettingsField::MailFromAddress,
                "The Mail from Address must be a valid email address.",
            )],
            input: HashMap::new(),
        };
        let html = HtmlSettingsView.render_settings(&SettingsPage {
            title: "Settings",
            record: &record,
            flash: Some(&flash),
            csrf_token: "t",
        });

        assert!(html.contains(r#"class="alert alert-danger""#));
        assert!(html.contains("<li>The Mail from Address must be a valid email address.</li>"));
        assert!(html.contains(r#"<span class="help-block error">The Mail from Address"#));
    }

    #[test]
    fn test_render_login_with_error() {
        let html = HtmlSettingsView.render_login(Some("Invalid token"));
        assert!(html.contains("action=\"/admin/login\""));
        assert!(html.contains("Invalid token"));
    }
}
