use crate::{
    api,
    cli::commands::backend::{BACKEND_FIREBASE, BACKEND_MEMORY, Options},
    flows::FlowConfig,
    provider::{
        Backend,
        firebase::{FirebaseConfig, FirestoreDirectory, IdentityToolkit, http_client},
        memory::InMemoryBackend,
    },
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub backend: Options,
    pub flows: FlowConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the backend cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let backend = build_backend(args.backend, &args.flows).await?;

    api::new(args.port, backend, args.flows).await
}

/// Build the backend selected on the command line.
///
/// # Errors
/// Returns an error if the seed file cannot be loaded or the Firebase settings are invalid.
pub async fn build_backend(options: Options, flows: &FlowConfig) -> Result<Backend> {
    match options {
        Options::Memory { seed_file } => {
            let memory = InMemoryBackend::new(flows.login.collection.as_str())
                .with_profile_fields(
                    flows.lookup.name_field.as_str(),
                    flows.lookup.email_field.as_str(),
                );

            if let Some(path) = seed_file {
                memory.load_seed_file(&path).await?;
            }

            let memory = Arc::new(memory);

            Ok(Backend::new(BACKEND_MEMORY, memory.clone(), memory))
        }
        Options::Firebase {
            api_key,
            project_id,
            identity_url,
            firestore_url,
        } => {
            let config = FirebaseConfig::new(api_key, &project_id, &identity_url, &firestore_url)?;
            let client = http_client()?;

            Ok(Backend::new(
                BACKEND_FIREBASE,
                Arc::new(IdentityToolkit::new(client.clone(), config.clone())),
                Arc::new(FirestoreDirectory::new(client, config)),
            ))
        }
    }
}

fn log_startup_args(args: &Args) {
    let backend = match &args.backend {
        Options::Memory { seed_file } => format!(
            "{BACKEND_MEMORY} (seed: {})",
            seed_file
                .as_ref()
                .map_or_else(|| "none".to_string(), |path| path.display().to_string())
        ),
        Options::Firebase {
            project_id,
            identity_url,
            firestore_url,
            ..
        } => format!("{BACKEND_FIREBASE} (project: {project_id}, identity: {identity_url}, firestore: {firestore_url})"),
    };

    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("backend", backend),
        ("collection", args.flows.login.collection.clone()),
        ("name_field", args.flows.lookup.name_field.clone()),
        ("email_field", args.flows.lookup.email_field.clone()),
        ("admin_field", args.flows.login.flag_field.clone()),
        ("admin_route", args.flows.login.privileged_route.clone()),
        ("default_route", args.flows.login.default_route.clone()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
