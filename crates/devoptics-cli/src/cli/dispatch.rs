use anyhow::{Context, Result};
use devoptics_core::Role;

use crate::cli::actions::Action;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: {}", name))
}

fn role(matches: &clap::ArgMatches) -> Result<Role> {
    required(matches, "role").map(|r| Role::parse(&r))
}

/// The `--api-url` override, from whichever subcommand level it was given at.
pub fn api_url(matches: &clap::ArgMatches) -> Option<String> {
    let mut found = matches.get_one::<String>("api-url").cloned();
    let mut current = matches;
    while let Some((_, sub)) = current.subcommand() {
        if let Some(url) = sub.get_one::<String>("api-url") {
            found = Some(url.clone());
        }
        current = sub;
    }
    found
}

/// Turn parsed arguments into an [`Action`].
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login {
            email: required(sub, "email")?,
            password: sub.get_one::<String>("password").cloned(),
        },
        Some(("signup", sub)) => Action::Signup {
            full_name: required(sub, "full-name")?,
            email: required(sub, "email")?,
            password: sub.get_one::<String>("password").cloned(),
            role: role(sub)?,
        },
        Some(("logout", _)) => Action::Logout,
        Some(("whoami", _)) => Action::Whoami,
        Some(("access", sub)) => Action::Access {
            all: sub.get_flag("all"),
        },
        Some(("users", sub)) => match sub.subcommand() {
            Some(("list", _)) => Action::ListUsers,
            Some(("create", create)) => Action::CreateUser {
                full_name: required(create, "full-name")?,
                email: required(create, "email")?,
                password: create.get_one::<String>("password").cloned(),
                role: role(create)?,
            },
            Some(("set-role", set)) => Action::SetRole {
                user_id: required(set, "user-id")?,
                role: role(set)?,
            },
            _ => anyhow::bail!("missing users subcommand"),
        },
        Some(("overview", _)) => Action::Overview,
        Some(("cluster", sub)) => Action::Cluster {
            name: required(sub, "name")?,
        },
        _ => anyhow::bail!("missing subcommand"),
    };
    Ok(action)
}
