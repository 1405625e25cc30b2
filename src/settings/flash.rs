//! One-shot status messages carried across the redirect that follows a POST.
//!
//! The message lives in a private (encrypted and authenticated) cookie: it may
//! contain the rejected input, including the mail password.

use crate::settings::types::{FieldError, SubmitOutcome};
use cookie::SameSite;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower_cookies::{Cookie, Cookies, Key};
use tracing::{debug, warn};

pub const FLASH_COOKIE: &str = "flash";

/// Preserved input values are cut to this many characters.
pub const MAX_PRESERVED_CHARS: usize = 255;

/// Browsers silently drop cookies whose `name=value` exceeds this size.
pub const MAX_COOKIE_BYTES: usize = 4096;

/// Nonce and authentication tag added by the private jar before base64.
const PRIVATE_COOKIE_OVERHEAD: usize = 12 + 16;

/// Size of `flash=<value>` once `payload_len` bytes are sealed and base64 encoded.
fn sealed_cookie_len(payload_len: usize) -> usize {
    FLASH_COOKIE.len() + 1 + (payload_len + PRIVATE_COOKIE_OVERHEAD).div_ceil(3) * 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub input: HashMap<String, String>,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
            errors: Vec::new(),
            input: HashMap::new(),
        }
    }

    pub fn from_outcome(outcome: &SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Saved { status } => Self::success(status.clone()),
            SubmitOutcome::Rejected {
                status,
                errors,
                input,
            } => Self {
                level: FlashLevel::Danger,
                message: status.clone(),
                errors: errors.clone(),
                input: input
                    .iter()
                    .map(|(k, v)| (k.clone(), v.chars().take(MAX_PRESERVED_CHARS).collect()))
                    .collect(),
            },
        }
    }

    /// Serialize the message, dropping preserved input (largest value first)
    /// until the sealed cookie fits in [`MAX_COOKIE_BYTES`]. The message and
    /// errors are always kept.
    fn fitted_payload(&self) -> serde_json::Result<String> {
        let mut payload = serde_json::to_string(self)?;
        if sealed_cookie_len(payload.len()) <= MAX_COOKIE_BYTES {
            return Ok(payload);
        }

        let mut trimmed = self.clone();
        let mut by_size: Vec<String> = trimmed.input.keys().cloned().collect();
        by_size.sort_by_key(|k| std::cmp::Reverse(trimmed.input[k].len()));
        for key in by_size {
            trimmed.input.remove(&key);
            payload = serde_json::to_string(&trimmed)?;
            if sealed_cookie_len(payload.len()) <= MAX_COOKIE_BYTES {
                break;
            }
        }
        debug!(
            kept = trimmed.input.len(),
            dropped = self.input.len() - trimmed.input.len(),
            "Dropped preserved input to fit the flash cookie"
        );
        Ok(payload)
    }

    /// Store the message for the next request.
    pub fn put(&self, cookies: &Cookies, key: &Key, secure: bool) {
        match self.fitted_payload() {
            Ok(payload) => {
                if sealed_cookie_len(payload.len()) > MAX_COOKIE_BYTES {
                    warn!(
                        bytes = sealed_cookie_len(payload.len()),
                        "Flash cookie exceeds browser limits"
                    );
                }
                let cookie = Cookie::build((FLASH_COOKIE, payload))
                    .path("/admin")
                    .http_only(true)
                    .secure(secure)
                    .same_site(SameSite::Strict)
                    .build();
                cookies.private(key).add(cookie);
            }
            Err(e) => warn!(error = %e, "Failed to serialize flash message, dropping it"),
        }
    }

    /// Read and remove the pending message, if any.
    pub fn take(cookies: &Cookies, key: &Key) -> Option<Self> {
        let private = cookies.private(key);
        let cookie = private.get(FLASH_COOKIE)?;
        private.remove(Cookie::build(FLASH_COOKIE).path("/admin").build());

        match serde_json::from_str(cookie.value()) {
            Ok(flash) => Some(flash),
            Err(e) => {
                debug!(error = %e, "Discarding unreadable flash cookie");
                None
            }
        }
    }
}
