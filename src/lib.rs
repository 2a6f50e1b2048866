//! # Wicket (login, password reset and email lookup)
//!
//! `wicket` serves the three authentication flows of a web application that
//! delegates identity and storage to a hosted backend:
//!
//! - **Find email:** look up accounts by first and last name and return their
//!   email addresses, masked for display.
//! - **Forgot password:** ask the identity provider to send a reset email and
//!   surface its categorized errors.
//! - **Login:** authenticate with email and password, read the account's
//!   authorization document and decide which route the client navigates to.
//!
//! ## Backends
//!
//! The hosted services sit behind two narrow traits, [`provider::AuthProvider`]
//! and [`provider::UserDirectory`]. The `memory` backend is used for local
//! development and tests; the `firebase` backend talks to the Identity Toolkit
//! and Firestore REST APIs.
//!
//! ## Error surface
//!
//! Every failure is caught at the flow boundary and converted into a single
//! user-facing message. Login failures never say whether the account exists.

pub mod api;
pub mod cli;
pub mod flows;
pub mod provider;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
