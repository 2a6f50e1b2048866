use crate::flows::{FlowConfig, LoginConfig, LookupConfig};
use anyhow::bail;
use clap::{Arg, ArgMatches, Command};

pub const ARG_USERS_COLLECTION: &str = "users-collection";
pub const ARG_NAME_FIELD: &str = "name-field";
pub const ARG_EMAIL_FIELD: &str = "email-field";
pub const ARG_ADMIN_FIELD: &str = "admin-field";
pub const ARG_ADMIN_ROUTE: &str = "admin-route";
pub const ARG_DEFAULT_ROUTE: &str = "default-route";

#[derive(Debug, Clone)]
pub struct Options {
    pub users_collection: String,
    pub name_field: String,
    pub email_field: String,
    pub admin_field: String,
    pub admin_route: String,
    pub default_route: String,
}

impl Options {
    /// Parse flow arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is blank or a route is not an absolute path.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get = |id: &str| -> anyhow::Result<String> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => bail!("missing required argument: --{id}"),
            }
        };

        let options = Self {
            users_collection: get(ARG_USERS_COLLECTION)?,
            name_field: get(ARG_NAME_FIELD)?,
            email_field: get(ARG_EMAIL_FIELD)?,
            admin_field: get(ARG_ADMIN_FIELD)?,
            admin_route: get(ARG_ADMIN_ROUTE)?,
            default_route: get(ARG_DEFAULT_ROUTE)?,
        };

        for (id, route) in [
            (ARG_ADMIN_ROUTE, &options.admin_route),
            (ARG_DEFAULT_ROUTE, &options.default_route),
        ] {
            if !route.starts_with('/') {
                bail!("--{id} must start with '/', got: {route}");
            }
        }

        Ok(options)
    }

    #[must_use]
    pub fn into_config(self) -> FlowConfig {
        FlowConfig {
            lookup: LookupConfig {
                collection: self.users_collection.clone(),
                name_field: self.name_field,
                email_field: self.email_field,
            },
            login: LoginConfig {
                collection: self.users_collection,
                flag_field: self.admin_field,
                privileged_route: self.admin_route,
                default_route: self.default_route,
            },
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USERS_COLLECTION)
                .long(ARG_USERS_COLLECTION)
                .help("Collection holding one document per account, keyed by uid")
                .env("WICKET_USERS_COLLECTION")
                .default_value("users"),
        )
        .arg(
            Arg::new(ARG_NAME_FIELD)
                .long(ARG_NAME_FIELD)
                .help("Document field with the account's full name")
                .env("WICKET_NAME_FIELD")
                .default_value("name"),
        )
        .arg(
            Arg::new(ARG_EMAIL_FIELD)
                .long(ARG_EMAIL_FIELD)
                .help("Document field with the account's email")
                .env("WICKET_EMAIL_FIELD")
                .default_value("email"),
        )
        .arg(
            Arg::new(ARG_ADMIN_FIELD)
                .long(ARG_ADMIN_FIELD)
                .help("Document field holding the admin flag (numeric 1 grants admin)")
                .env("WICKET_ADMIN_FIELD")
                .default_value("admin"),
        )
        .arg(
            Arg::new(ARG_ADMIN_ROUTE)
                .long(ARG_ADMIN_ROUTE)
                .help("Route returned to admins after login")
                .env("WICKET_ADMIN_ROUTE")
                .default_value("/admin"),
        )
        .arg(
            Arg::new(ARG_DEFAULT_ROUTE)
                .long(ARG_DEFAULT_ROUTE)
                .help("Route returned to everyone else after login")
                .env("WICKET_DEFAULT_ROUTE")
                .default_value("/"),
        )
}
