//! Find the email addresses registered under a first and last name.

use super::{Failure, FailureKind, FlowError, FormState, UiResult, mask_email};
use crate::provider::UserDirectory;
use tracing::{debug, error, instrument};

pub const FIELD_FIRST_NAME: &str = "first_name";
pub const FIELD_LAST_NAME: &str = "last_name";

pub const REQUIRED_MESSAGE: &str = "Please enter both your first and last name.";
pub const NOT_FOUND_MESSAGE: &str = "No account was found with that name.";
pub const RETRY_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Clone, Debug)]
pub struct LookupConfig {
    pub collection: String,
    pub name_field: String,
    pub email_field: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            collection: "users".to_string(),
            name_field: "name".to_string(),
            email_field: "email".to_string(),
        }
    }
}

/// The name stored on account documents: `"{first} {last}"`, as typed.
#[must_use]
pub fn full_name(first: &str, last: &str) -> String {
    format!("{first} {last}")
}

/// Masked emails of every account whose name matches exactly.
///
/// Documents without a string email are skipped. An empty list means no match.
///
/// # Errors
/// Returns `FlowError::Validation` before any call when a name is blank, and
/// `FlowError::Provider` when the directory query fails.
#[instrument(skip_all, fields(first_len = first.len(), last_len = last.len()))]
pub async fn find_emails(
    directory: &dyn UserDirectory,
    config: &LookupConfig,
    first: &str,
    last: &str,
) -> Result<Vec<String>, FlowError> {
    if first.trim().is_empty() {
        return Err(FlowError::Validation(FIELD_FIRST_NAME));
    }
    if last.trim().is_empty() {
        return Err(FlowError::Validation(FIELD_LAST_NAME));
    }

    let name = full_name(first, last);

    let documents = directory
        .find_by_field(&config.collection, &config.name_field, &name)
        .await?;

    debug!("{} documents match", documents.len());

    Ok(documents
        .iter()
        .filter_map(|document| document.get_str(&config.email_field))
        .map(mask_email)
        .collect())
}

#[derive(Debug)]
pub struct LookupForm {
    form: FormState,
    result: UiResult<Vec<String>>,
}

impl Default for LookupForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(&[FIELD_FIRST_NAME, FIELD_LAST_NAME]),
            result: UiResult::Idle,
        }
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.form.set(FIELD_FIRST_NAME, value);
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.form.set(FIELD_LAST_NAME, value);
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub fn result(&self) -> &UiResult<Vec<String>> {
        &self.result
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.result.is_loading()
    }

    /// Run the lookup and replace the result.
    ///
    /// No match yields `Failure(NotFound)`; the payload list is then empty.
    pub async fn submit(
        &mut self,
        directory: &dyn UserDirectory,
        config: &LookupConfig,
    ) -> &UiResult<Vec<String>> {
        self.result = UiResult::Loading;

        let first = self.form.get(FIELD_FIRST_NAME).to_string();
        let last = self.form.get(FIELD_LAST_NAME).to_string();

        self.result = match find_emails(directory, config, &first, &last).await {
            Ok(emails) if emails.is_empty() => {
                UiResult::Failure(Failure::new(FailureKind::NotFound, NOT_FOUND_MESSAGE))
            }
            Ok(emails) => UiResult::Success(emails),
            Err(err) => UiResult::Failure(failure_for(&err)),
        };

        &self.result
    }
}

fn failure_for(err: &FlowError) -> Failure {
    match err {
        FlowError::Validation(_) => Failure::new(FailureKind::Validation, REQUIRED_MESSAGE),
        FlowError::Provider(e) => {
            error!("Error looking up accounts by name: {}", e);

            Failure::new(FailureKind::Unavailable, RETRY_MESSAGE)
        }
    }
}
