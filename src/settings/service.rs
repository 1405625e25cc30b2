// src/settings/service.rs

use crate::error::Result;
use crate::settings::types::{
    SettingsField, SettingsRecord, SubmitOutcome, REJECTED_MESSAGE, SAVED_MESSAGE, SETTINGS_TITLE,
};
use crate::settings::validation::validate;
use crate::storage::ConfigStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reads and writes the managed settings keys through a [`ConfigStore`].
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn ConfigStore>,
}

impl std::fmt::Debug for SettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsService")
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl SettingsService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Current values of all eleven keys plus the page title. Keys missing
    /// from the store read as the empty string.
    #[instrument(level = "debug", skip(self), fields(store = self.store.backend_name()))]
    pub async fn show_settings_form(&self) -> Result<(&'static str, SettingsRecord)> {
        let mut record = SettingsRecord::default();
        for field in SettingsField::ALL {
            if let Some(value) = self.store.get(field.store_key()).await? {
                record.set(field, value);
            }
        }
        debug!("Loaded settings record");
        Ok((SETTINGS_TITLE, record))
    }

    /// Validate a submission and, only when every field passes, write all ten
    /// writable keys as one batch. `cronToken` and unknown keys are ignored.
    #[instrument(level = "debug", skip_all, fields(store = self.store.backend_name()))]
    pub async fn submit_settings(&self, input: &HashMap<String, String>) -> Result<SubmitOutcome> {
        match validate(input) {
            Ok(settings) => {
                let entries = settings.store_entries();
                self.store.set_many(&entries).await?;
                info!(keys = entries.len(), "Settings updated");
                Ok(SubmitOutcome::Saved {
                    status: SAVED_MESSAGE.to_string(),
                })
            }
            Err(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.form_key()).collect();
                warn!(?fields, "Settings submission rejected");
                let preserved = SettingsField::WRITABLE
                    .into_iter()
                    .filter_map(|field| {
                        input
                            .get(field.form_key())
                            .map(|value| (field.form_key().to_string(), value.clone()))
                    })
                    .collect();
                Ok(SubmitOutcome::Rejected {
                    status: REJECTED_MESSAGE.to_string(),
                    errors,
                    input: preserved,
                })
            }
        }
    }
}
