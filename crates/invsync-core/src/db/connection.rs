//! Database connection management

use crate::error::{Error, Result};
use crate::models::TenantId;
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::{Path, PathBuf};

use super::migrations;

/// Connection settings for the remote cloud database
#[derive(Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// Remote database URL (e.g., `libsql://inventory.example.com`)
    pub url: String,
    /// Authentication token for the remote database
    pub auth_token: String,
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CloudConfig")
            .field("url", &self.url)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

impl CloudConfig {
    /// Create a cloud configuration, trimming both values
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().to_string();
        let auth_token = auth_token.into().trim().to_string();
        if url.is_empty() {
            return Err(Error::Config("Cloud database URL is required".into()));
        }
        if auth_token.is_empty() {
            return Err(Error::Config("Cloud auth token is required".into()));
        }
        Ok(Self { url, auth_token })
    }
}

/// Database wrapper for libSQL connections
pub struct Database {
    // Owns the handle the connection was opened from
    _db: LibSqlDatabase,
    conn: Connection,
    remote: bool,
}

impl Database {
    /// Open a local database at the given path, creating it (and its parent
    /// directory) if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let database = Self {
            _db: db,
            conn,
            remote: false,
        };
        database.configure().await?;
        database.migrate().await?;
        tracing::debug!("Opened local database at {}", path.display());
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self {
            _db: db,
            conn,
            remote: false,
        };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Connect to the remote cloud database
    ///
    /// The cloud schema is owned by the cloud service; no migrations are run.
    pub async fn open_remote(config: &CloudConfig) -> Result<Self> {
        let db = Builder::new_remote(config.url.clone(), config.auth_token.clone())
            .build()
            .await?;
        let conn = db.connect()?;
        tracing::debug!("Connected to cloud database at {}", config.url);

        Ok(Self {
            _db: db,
            conn,
            remote: true,
        })
    }

    /// Path of a tenant's local backup file inside `base_dir`
    pub fn local_path_for(base_dir: impl AsRef<Path>, tenant: &TenantId) -> PathBuf {
        base_dir.as_ref().join(format!("backup_{tenant}.db"))
    }

    /// Configure `SQLite` pragmas
    async fn configure(&self) -> Result<()> {
        // WAL is unavailable for in-memory databases
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn).await
    }

    /// Check if this is the remote cloud database
    pub const fn is_remote(&self) -> bool {
        self.remote
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!db.is_remote());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_creates_parent_directory() {
        let tmp = tempdir().unwrap();
        let tenant: TenantId = "acme".parse().unwrap();
        let path = Database::local_path_for(tmp.path().join("backups"), &tenant);

        let db = Database::open(&path).await.unwrap();

        assert!(path.exists());
        let mut rows = db
            .connection()
            .query("SELECT COUNT(*) FROM products", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("backup_acme.db");

        {
            let db = Database::open(&path).await.unwrap();
            db.connection()
                .execute(
                    "INSERT INTO units (id, tenant_id, name, abbreviation) VALUES (1, 'acme', 'Kilogram', 'kg')",
                    (),
                )
                .await
                .unwrap();
        }

        let db = Database::open(&path).await.unwrap();
        let mut rows = db
            .connection()
            .query("SELECT abbreviation FROM units WHERE id = 1", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "kg");
    }

    #[test]
    fn test_local_path_for_tenant() {
        let tenant: TenantId = "tienda-01".parse().unwrap();
        assert_eq!(
            Database::local_path_for("/var/lib/invsync", &tenant),
            PathBuf::from("/var/lib/invsync/backup_tienda-01.db")
        );
    }

    #[test]
    fn test_cloud_config_requires_both_values() {
        assert!(CloudConfig::new("libsql://inventory.example.com", " ").is_err());
        assert!(CloudConfig::new("", "token").is_err());

        let config = CloudConfig::new(" libsql://inventory.example.com ", "token").unwrap();
        assert_eq!(config.url, "libsql://inventory.example.com");
    }

    #[test]
    fn test_cloud_config_debug_redacts_token() {
        let config = CloudConfig::new("libsql://inventory.example.com", "secret-token").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    /// Integration test against a real cloud database - only runs if env vars are set
    /// Run with: INVSYNC_CLOUD_URL=... INVSYNC_CLOUD_TOKEN=... cargo test test_open_remote -- --ignored
    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires INVSYNC_CLOUD_URL and INVSYNC_CLOUD_TOKEN"]
    async fn test_open_remote() {
        let url = env::var("INVSYNC_CLOUD_URL").expect("INVSYNC_CLOUD_URL must be set");
        let token = env::var("INVSYNC_CLOUD_TOKEN").expect("INVSYNC_CLOUD_TOKEN must be set");

        let db = Database::open_remote(&CloudConfig::new(url, token).unwrap())
            .await
            .unwrap();
        assert!(db.is_remote());

        let mut rows = db
            .connection()
            .query("SELECT 1", ())
            .await
            .expect("Should be able to execute query");
        let row = rows.next().await.unwrap().unwrap();
        let val: i32 = row.get(0).unwrap();
        assert_eq!(val, 1);
    }
}
