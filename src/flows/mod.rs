//! The three authentication flows and the state they share.
//!
//! Every flow follows the same shape: a [`FormState`] collects input, `submit`
//! validates it, makes exactly one outbound call and replaces the flow's
//! [`UiResult`]. `submit` takes `&mut self`, so one form can never have two
//! calls outstanding.

pub mod login;
pub mod lookup;
pub mod mask;
pub mod reset;

use crate::provider::ProviderError;
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

pub use self::login::{LoginConfig, LoginForm, Navigation};
pub use self::lookup::{LookupConfig, LookupForm};
pub use self::mask::mask_email;
pub use self::reset::ResetForm;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("missing required field: {0}")]
    Validation(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Named text fields of a form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormState {
    fields: BTreeMap<&'static str, String>,
    secret: Vec<&'static str>,
}

impl FormState {
    #[must_use]
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            fields: names.iter().map(|name| (*name, String::new())).collect(),
            secret: Vec::new(),
        }
    }

    /// Mark a field as secret: it is kept but never printed.
    #[must_use]
    pub fn with_secret(mut self, name: &'static str) -> Self {
        self.fields.entry(name).or_default();
        self.secret.push(name);
        self
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        self.fields.insert(name, value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// The field's value, or a validation error when it is blank.
    ///
    /// # Errors
    /// Returns `FlowError::Validation` naming the field.
    pub fn require(&self, name: &'static str) -> Result<&str, FlowError> {
        let value = self.get(name);

        if value.trim().is_empty() {
            return Err(FlowError::Validation(name));
        }

        Ok(value)
    }

    pub fn clear(&mut self) {
        for value in self.fields.values_mut() {
            value.clear();
        }
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.fields {
            if self.secret.contains(name) {
                map.entry(name, &"***");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

/// What went wrong, as far as a client needs to know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    NotFound,
    InvalidEmail,
    Unauthorized,
    Unavailable,
}

/// A user-facing failure message and its category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    #[must_use]
    pub fn new(kind: FailureKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result state driving what a flow shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiResult<T> {
    Idle,
    Loading,
    Success(T),
    Failure(Failure),
}

impl<T> Default for UiResult<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> UiResult<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.failure().map(|failure| failure.message.as_str())
    }
}

/// Flow settings that come from configuration.
#[derive(Clone, Debug, Default)]
pub struct FlowConfig {
    pub lookup: LookupConfig,
    pub login: LoginConfig,
}

/// Log capture for asserting what reaches the subscriber.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod capture {
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::{MakeWriter, format::FmtSpan};

    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        /// Install a TRACE subscriber for the current thread that writes
        /// events and closed spans, with their fields, into the buffer.
        pub fn install(&self) -> DefaultGuard {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::TRACE)
                .with_span_events(FmtSpan::CLOSE)
                .finish();

            tracing::subscriber::set_default(subscriber)
        }

        pub fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
