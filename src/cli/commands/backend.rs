use crate::provider::firebase::{DEFAULT_FIRESTORE_URL, DEFAULT_IDENTITY_URL};
use anyhow::bail;
use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};
use secrecy::SecretString;
use std::path::PathBuf;

pub const ARG_BACKEND: &str = "backend";
pub const ARG_SEED_FILE: &str = "seed-file";
pub const ARG_FIREBASE_API_KEY: &str = "firebase-api-key";
pub const ARG_FIREBASE_PROJECT_ID: &str = "firebase-project-id";
pub const ARG_FIREBASE_IDENTITY_URL: &str = "firebase-identity-url";
pub const ARG_FIREBASE_FIRESTORE_URL: &str = "firebase-firestore-url";

pub const BACKEND_MEMORY: &str = "memory";
pub const BACKEND_FIREBASE: &str = "firebase";

#[derive(Debug, Clone)]
pub enum Options {
    Memory {
        seed_file: Option<PathBuf>,
    },
    Firebase {
        api_key: SecretString,
        project_id: String,
        identity_url: String,
        firestore_url: String,
    },
}

impl Options {
    /// Parse backend arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the firebase backend is selected without its credentials.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // clap passes empty env vars through as ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let backend = get_non_empty(ARG_BACKEND).unwrap_or_else(|| BACKEND_MEMORY.to_string());

        if backend == BACKEND_MEMORY {
            return Ok(Self::Memory {
                seed_file: get_non_empty(ARG_SEED_FILE).map(PathBuf::from),
            });
        }

        let Some(api_key) = get_non_empty(ARG_FIREBASE_API_KEY) else {
            bail!("missing required argument: --{ARG_FIREBASE_API_KEY}");
        };

        let Some(project_id) = get_non_empty(ARG_FIREBASE_PROJECT_ID) else {
            bail!("missing required argument: --{ARG_FIREBASE_PROJECT_ID}");
        };

        Ok(Self::Firebase {
            api_key: SecretString::from(api_key),
            project_id,
            identity_url: get_non_empty(ARG_FIREBASE_IDENTITY_URL)
                .unwrap_or_else(|| DEFAULT_IDENTITY_URL.to_string()),
            firestore_url: get_non_empty(ARG_FIREBASE_FIRESTORE_URL)
                .unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BACKEND)
                .short('b')
                .long(ARG_BACKEND)
                .help("Identity and document backend")
                .env("WICKET_BACKEND")
                .default_value(BACKEND_MEMORY)
                .value_parser(PossibleValuesParser::new([BACKEND_MEMORY, BACKEND_FIREBASE])),
        )
        .arg(
            Arg::new(ARG_SEED_FILE)
                .long(ARG_SEED_FILE)
                .help("JSON file with accounts to load into the memory backend")
                .env("WICKET_SEED_FILE"),
        )
        .arg(
            Arg::new(ARG_FIREBASE_API_KEY)
                .long(ARG_FIREBASE_API_KEY)
                .help("Firebase web API key")
                .env("WICKET_FIREBASE_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_FIREBASE_PROJECT_ID)
                .long(ARG_FIREBASE_PROJECT_ID)
                .help("Firebase project id")
                .env("WICKET_FIREBASE_PROJECT_ID"),
        )
        .arg(
            Arg::new(ARG_FIREBASE_IDENTITY_URL)
                .long(ARG_FIREBASE_IDENTITY_URL)
                .help("Identity Toolkit base URL")
                .env("WICKET_FIREBASE_IDENTITY_URL")
                .default_value(DEFAULT_IDENTITY_URL),
        )
        .arg(
            Arg::new(ARG_FIREBASE_FIRESTORE_URL)
                .long(ARG_FIREBASE_FIRESTORE_URL)
                .help("Firestore base URL")
                .env("WICKET_FIREBASE_FIRESTORE_URL")
                .default_value(DEFAULT_FIRESTORE_URL),
        )
}
