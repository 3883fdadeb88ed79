//! Campus event registration server.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `campus-config.yaml` (or defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured storage backend, running migrations for `PostgreSQL`
//! 4. Make sure the configured administrator account exists
//! 5. Serve the HTTP API until `Ctrl-C`, then drain in-flight requests

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use campus_api::{AppState, ServerConfig, start_server};
use campus_db::{PgCampusStore, PostgresConfig, PostgresPool};
use campus_registry::{CampusStore, MemoryStore, RegistryError};
use campus_types::{NewUser, Role, User};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{
    AdminSection, Backend, CampusConfig, ConfigSource, LogFormat, LoggingConfig, StorageConfig,
};

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the storage backend or the HTTP
/// listener cannot be set up.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = CampusConfig::load().context("loading configuration")?;
    init_logging(&config.logging);
    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "Configuration loaded"),
        ConfigSource::Defaults(path) => {
            info!(path = %path.display(), "Config file not found, using defaults");
        }
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        backend = ?config.storage.backend,
        "campus-server starting"
    );

    let (store, pool) = open_store(&config.storage).await?;
    ensure_admin(store.as_ref(), &config.admin).await?;
    let state = Arc::new(AppState::new(store));

    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(&server, state, shutdown_signal())
        .await
        .context("running HTTP server")?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("campus-server stopped");
    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Open the configured backend. The pool is returned so it can be closed
/// on shutdown.
async fn open_store(
    storage: &StorageConfig,
) -> anyhow::Result<(Arc<dyn CampusStore>, Option<PostgresPool>)> {
    match storage.backend {
        Backend::Memory => {
            info!("Using in-memory storage; state is lost on restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        Backend::Postgres => {
            let pg = PostgresConfig::new(&storage.postgres_url)
                .with_max_connections(storage.max_connections)
                .with_connect_timeout(Duration::from_millis(storage.connect_timeout_ms))
                .with_idle_timeout(Duration::from_millis(storage.idle_timeout_ms));
            let pool = PostgresPool::connect(&pg)
                .await
                .context("connecting to PostgreSQL")?;
            pool.run_migrations()
                .await
                .context("running database migrations")?;
            Ok((Arc::new(PgCampusStore::new(pool.clone())), Some(pool)))
        }
    }
}

/// Create the configured administrator account unless its student number is
/// already taken, and log its id for use in `X-User-Id`.
async fn ensure_admin(store: &dyn CampusStore, admin: &AdminSection) -> anyhow::Result<()> {
    if admin.student_no.trim().is_empty() {
        info!("No administrator configured");
        return Ok(());
    }

    let user = match store.find_user_by_student_no(&admin.student_no).await {
        Ok(user) => user,
        Err(RegistryError::StudentNotFound(_)) => create_admin(store, admin).await?,
        Err(e) => return Err(e).context("looking up the administrator account"),
    };

    if user.is_admin() {
        info!(user_id = %user.id, student_no = %user.student_no, "Administrator account ready");
    } else {
        warn!(
            user_id = %user.id,
            student_no = %user.student_no,
            "Configured administrator student number belongs to a student account"
        );
    }
    Ok(())
}

async fn create_admin(store: &dyn CampusStore, admin: &AdminSection) -> anyhow::Result<User> {
    let input = NewUser {
        name: admin.name.clone(),
        student_no: admin.student_no.clone(),
        phone_no: None,
        role: Role::Admin,
    };
    match store.create_user(input).await {
        Ok(user) => Ok(user),
        // Another instance created it first.
        Err(RegistryError::DuplicateStudentNo(_)) => store
            .find_user_by_student_no(&admin.student_no)
            .await
            .context("looking up the administrator account"),
        Err(e) => Err(e).context("creating the administrator account"),
    }
}

/// Resolve on `Ctrl-C`. If the handler cannot be installed, never resolve
/// so the server keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining requests");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> AdminSection {
        AdminSection {
            name: String::from("Student Affairs"),
            student_no: String::from("0000001"),
        }
    }

    #[tokio::test]
    async fn admin_is_created_once() {
        let store = MemoryStore::new();
        assert!(ensure_admin(&store, &office()).await.is_ok());
        assert!(ensure_admin(&store, &office()).await.is_ok());

        let users = store.list_users().await.unwrap_or_default();
        assert_eq!(users.len(), 1);
        assert!(users.iter().all(User::is_admin));
        assert_eq!(users.first().map(|u| u.name.as_str()), Some("Student Affairs"));
    }

    #[tokio::test]
    async fn student_holding_the_number_is_left_alone() {
        let store = MemoryStore::new();
        let student = store
            .create_user(NewUser {
                name: String::from("Deniz Sahin"),
                student_no: String::from("0000001"),
                phone_no: None,
                role: Role::Student,
            })
            .await;
        assert!(student.is_ok());

        assert!(ensure_admin(&store, &office()).await.is_ok());
        let users = store.list_users().await.unwrap_or_default();
        assert_eq!(users.len(), 1);
        assert!(!users.iter().any(User::is_admin));
    }

    #[tokio::test]
    async fn blank_student_number_skips_the_check() {
        let store = MemoryStore::new();
        let admin = AdminSection {
            student_no: String::from("  "),
            ..office()
        };
        assert!(ensure_admin(&store, &admin).await.is_ok());
        assert_eq!(store.list_users().await.map(|u| u.len()).ok(), Some(0));
    }
}
