//! Database connection management
//!
//! Pool creation, schema bootstrap, and the stores built on top of the pool.

pub mod community;
pub mod membership;
pub mod queries;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use std::sync::Arc;
use tokio_postgres::NoTls;
use tracing::{info, warn};

/// Create a connection pool from configuration
///
/// Connections are opened lazily; call [`verify_connection`] to fail fast.
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, AppError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_pool_size));

    if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        for err in &certs.errors {
            warn!("Skipping unreadable native certificate: {}", err);
        }
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            if let Err(e) = root_store.add(cert) {
                warn!("Skipping rejected native certificate: {}", e);
            }
        }

        // reqwest enables ring next to aws-lc-rs; there is no process default.
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let tls_config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| AppError::Config(format!("Failed to configure TLS: {}", e)))?
            .with_root_certificates(root_store)
            .with_no_client_auth();
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))
    }
}

/// Check out one connection and run a trivial query
pub async fn verify_connection(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    client.query_one("SELECT 1 AS ok", &[]).await?;
    Ok(())
}

/// Create tables and indexes if they don't exist
///
/// Runs under an advisory lock so concurrent starters don't race on the
/// catalog.
pub async fn init_schema(pool: &Pool) -> Result<(), AppError> {
    execute_in_transaction(pool, SCHEMA).await?;

    info!("Database tables initialized");
    Ok(())
}

/// Run a statement batch in one transaction on a pooled connection
///
/// An uncommitted transaction rolls back on drop, so a failed batch never
/// returns an aborted connection to the pool.
async fn execute_in_transaction(pool: &Pool, sql: &str) -> Result<(), AppError> {
    let mut client = pool.get().await?;
    let transaction = client.transaction().await?;
    transaction.batch_execute(sql).await?;
    transaction.commit().await?;
    Ok(())
}

const SCHEMA: &str = "
    SELECT pg_advisory_xact_lock(5054);

    CREATE TABLE IF NOT EXISTS communities (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        deleted_at TIMESTAMPTZ
    );

    CREATE TABLE IF NOT EXISTS community_members (
        community_id UUID NOT NULL REFERENCES communities(id),
        user_id TEXT NOT NULL,
        joined_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        deleted_at TIMESTAMPTZ
    );

    CREATE INDEX IF NOT EXISTS idx_communities_active_name
        ON communities(name) WHERE deleted_at IS NULL;

    CREATE UNIQUE INDEX IF NOT EXISTS idx_community_members_active
        ON community_members(community_id, user_id) WHERE deleted_at IS NULL;
";
