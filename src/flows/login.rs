//! Sign in and pick the route the client navigates to.

use super::{Failure, FailureKind, FlowError, FormState, UiResult};
use crate::{
    provider::{Document, UserDirectory},
    session::SessionContext,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";

pub const REQUIRED_MESSAGE: &str = "Please enter your email and password.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";

/// The flag value that grants the privileged route.
pub const PRIVILEGED_FLAG: f64 = 1.0;

#[derive(Clone, Debug)]
pub struct LoginConfig {
    pub collection: String,
    pub flag_field: String,
    pub privileged_route: String,
    pub default_route: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            collection: "users".to_string(),
            flag_field: "admin".to_string(),
            privileged_route: "/admin".to_string(),
            default_route: "/".to_string(),
        }
    }
}

/// Where to go after a successful sign in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub route: String,
    pub uid: String,
}

/// True only for a JSON number equal to 1; `true`, `"1"` and absence are not.
#[must_use]
pub fn is_privileged(flag: Option<&Value>) -> bool {
    matches!(flag, Some(Value::Number(n)) if n.as_f64() == Some(PRIVILEGED_FLAG))
}

/// Route for an authorization document (or its absence).
#[must_use]
pub fn route_for<'a>(document: Option<&Document>, config: &'a LoginConfig) -> &'a str {
    if is_privileged(document.and_then(|doc| doc.get(&config.flag_field))) {
        &config.privileged_route
    } else {
        &config.default_route
    }
}

/// Authenticate, then read the authorization document keyed by the uid as
/// the signed-in user.
///
/// # Errors
/// Returns `FlowError::Validation` before any call when a field is blank and
/// `FlowError::Provider` when sign in or the document read fails.
#[instrument(skip_all, fields(email_len = email.len()))]
pub async fn sign_in(
    session: &SessionContext,
    directory: &dyn UserDirectory,
    config: &LoginConfig,
    email: &str,
    password: &SecretString,
) -> Result<Navigation, FlowError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(FlowError::Validation(FIELD_EMAIL));
    }

    if password.expose_secret().trim().is_empty() {
        return Err(FlowError::Validation(FIELD_PASSWORD));
    }

    let identity = session.sign_in(email, password).await?;

    let document = directory
        .get_as(&identity, &config.collection, &identity.uid)
        .await?;

    let route = route_for(document.as_ref(), config);

    debug!("uid {} routed to {}", identity.uid, route);

    Ok(Navigation {
        route: route.to_string(),
        uid: identity.uid,
    })
}

/// Every failure except validation collapses into one message, so a client
/// cannot tell a wrong password from an unknown account.
fn failure_for(err: &FlowError) -> Failure {
    match err {
        FlowError::Validation(_) => Failure::new(FailureKind::Validation, REQUIRED_MESSAGE),
        FlowError::Provider(e) => {
            error!("Login failed: {}", e);

            Failure::new(FailureKind::Unauthorized, INVALID_CREDENTIALS_MESSAGE)
        }
    }
}

#[derive(Debug)]
pub struct LoginForm {
    form: FormState,
    result: UiResult<Navigation>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            form: FormState::new(&[FIELD_EMAIL]).with_secret(FIELD_PASSWORD),
            result: UiResult::Idle,
        }
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.form.set(FIELD_EMAIL, value);
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.form.set(FIELD_PASSWORD, value);
    }

    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[must_use]
    pub fn result(&self) -> &UiResult<Navigation> {
        &self.result
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.result.is_loading()
    }

    pub async fn submit(
        &mut self,
        session: &SessionContext,
        directory: &dyn UserDirectory,
        config: &LoginConfig,
    ) -> &UiResult<Navigation> {
        self.result = UiResult::Loading;

        let email = self.form.get(FIELD_EMAIL).to_string();
        let password = SecretString::from(self.form.get(FIELD_PASSWORD).to_string());

        self.result = match sign_in(session, directory, config, &email, &password).await {
            Ok(navigation) => UiResult::Success(navigation),
            Err(err) => UiResult::Failure(failure_for(&err)),
        };

        &self.result
    }
}
