use anyhow::{bail, Result};
use devoptics_core::{
    capabilities_of, Capability, ClusterHealth, NewUser, Role, SessionManager, UserProfile,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login {
        email: String,
        password: Option<String>,
    },
    Signup {
        full_name: String,
        email: String,
        password: Option<String>,
        role: Role,
    },
    Logout,
    Whoami,
    Access {
        all: bool,
    },
    ListUsers,
    CreateUser {
        full_name: String,
        email: String,
        password: Option<String>,
        role: Role,
    },
    SetRole {
        user_id: String,
        role: Role,
    },
    Overview,
    Cluster {
        name: String,
    },
}

impl Action {
    /// Execute the action against the current session.
    /// # Errors
    /// Returns an error if the action fails or the session lacks the capability it needs.
    pub async fn execute(self, session: &SessionManager) -> Result<()> {
        match self {
            Action::Login { email, password } => {
                let password = password_or_prompt(password)?;
                let user = session.login(&email, &password).await?;
                println!("Signed in as {}", describe(&user));
            }
            Action::Signup {
                full_name,
                email,
                password,
                role,
            } => {
                let password = password_or_prompt(password)?;
                let user = session.signup(&full_name, &email, &password, role).await?;
                println!("Account created, signed in as {}", describe(&user));
            }
            Action::Logout => {
                session.logout()?;
                println!("Signed out");
            }
            Action::Whoami => match session.current_user() {
                Some(user) => println!("{}", describe(&user)),
                None => println!("Not signed in"),
            },
            Action::Access { all } => print_access(session, all),
            Action::ListUsers => {
                require(session, Capability::ManageUsers)?;
                let users = session.api().list_users().await?;
                if users.is_empty() {
                    println!("No accounts");
                }
                for user in &users {
                    println!("{:<24} {}", user.id, describe(user));
                }
            }
            Action::CreateUser {
                full_name,
                email,
                password,
                role,
            } => {
                require(session, Capability::ManageUsers)?;
                let password = password_or_prompt(password)?;
                let user = NewUser::new(full_name.trim(), email.trim(), password, role);
                if let Some(field) = user.missing_field() {
                    bail!("The {} is required", field);
                }
                session.api().create_user(&user).await?;
                println!("Created {} ({})", user.email, user.role);
            }
            Action::SetRole { user_id, role } => {
                require(session, Capability::ManageUsers)?;
                session.api().update_user_role(&user_id, &role).await?;
                println!("Role of {} set to {}", user_id, role);
            }
            Action::Overview => {
                require(session, Capability::ViewAdminOverview)?;
                println!("{}", session.api().admin_overview().await?);
            }
            Action::Cluster { name } => {
                require(session, Capability::ViewClusterHealth)?;
                let health = session.api().cluster_health(&name).await?;
                print_cluster(&health);
            }
        }
        Ok(())
    }
}

/// Fail unless the signed-in role grants `capability`. Sends nothing.
fn require(session: &SessionManager, capability: Capability) -> Result<()> {
    let Some(role) = session.current_role() else {
        bail!("Not signed in. Run `devoptics login` first");
    };
    if !session.can(capability) {
        debug!(role = %role, capability = %capability, "Access check failed");
        bail!("Your role ({}) does not allow {}", role, capability);
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

fn describe(user: &UserProfile) -> String {
    format!("{} <{}> ({})", user.full_name, user.email, user.role)
}

fn print_access(session: &SessionManager, all: bool) {
    let current = session.current_role();
    if all {
        for role in Role::ALL {
            let marker = if current.as_ref() == Some(&role) { "*" } else { " " };
            println!("{} {:<8} {}", marker, role, role.description());
            for capability in capabilities_of(&role) {
                println!("      {}", capability);
            }
        }
        return;
    }

    let Some(role) = current else {
        println!("Not signed in");
        return;
    };
    println!("{}: {}", role, role.description());
    let capabilities = session.capabilities();
    if capabilities.is_empty() {
        println!("  (no capabilities)");
    }
    for capability in capabilities {
        println!("  {}", capability);
    }
}

fn print_cluster(health: &ClusterHealth) {
    let state = if health.is_healthy() { "ok" } else { "attention" };
    println!(
        "{} {} [{}] as of {}",
        health.cluster_name, health.status, state, health.timestamp
    );
    for (signal, value) in &health.signals {
        println!("  {:<16} {}", signal, value);
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::time::Duration;

    use devoptics_core::auth::{MemoryStorage, Storage};
    use devoptics_core::LogNavigator;

    use super::*;

    /// Base URL of a port nothing is listening on, so any request would fail
    /// with a network error rather than an access error.
    fn unreachable_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{}", addr)
    }

    fn session_as(role: Option<Role>) -> SessionManager {
        let storage = MemoryStorage::new();
        if let Some(role) = role {
            let user = format!(
                r#"{{"id":"u1","fullName":"Ann","email":"a@b.com","role":"{}"}}"#,
                role
            );
            storage
                .set(&[("fbisdevoptics.token", "t1"), ("fbisdevoptics.user", user.as_str())])
                .expect("seed storage");
        }
        SessionManager::with_storage(
            storage,
            &unreachable_url(),
            Duration::from_secs(2),
            Arc::new(LogNavigator),
        )
        .expect("session opens")
    }

    #[test]
    fn test_require_signed_out() {
        let err = require(&session_as(None), Capability::ViewDashboards).unwrap_err();
        assert!(err.to_string().contains("Not signed in"));
    }

    #[test]
    fn test_require_checks_capability() {
        let analyst = session_as(Some(Role::Analyst));
        assert!(require(&analyst, Capability::ViewClusterHealth).is_ok());

        let err = require(&analyst, Capability::ManageUsers).unwrap_err();
        assert_eq!(err.to_string(), "Your role (analyst) does not allow manage-users");
    }

    #[test]
    fn test_unrecognized_role_is_denied() {
        let session = session_as(Some(Role::parse("auditor")));
        assert!(require(&session, Capability::ViewDashboards).is_err());
    }

    #[tokio::test]
    async fn test_gated_action_sends_nothing_without_capability() {
        let viewer = session_as(Some(Role::Viewer));
        let err = Action::Overview.execute(&viewer).await.unwrap_err();

        // A network error would mean the request went out.
        assert!(err.to_string().contains("does not allow view-admin-overview"));
        assert!(viewer.is_signed_in());
    }

    #[tokio::test]
    async fn test_whoami_and_logout_work_offline() {
        let session = session_as(Some(Role::Manager));
        Action::Whoami.execute(&session).await.unwrap();
        Action::Logout.execute(&session).await.unwrap();
        assert!(!session.is_signed_in());
        Action::Logout.execute(&session).await.unwrap();
    }
}
