//! ABOUTME: Database layer with SQLite, migrations, and repositories
//! ABOUTME: Declares the antibody/antigen schema and enforces its constraints

use adb_core::{Error, Result};
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Row, Sqlite, SqlitePool, Transaction,
};
use std::str::FromStr;
use tracing::{debug, info, instrument};

pub mod error;
pub mod hierarchy;
pub mod models;
pub mod repositories;

/// Every table the schema declares, in parent-before-child order.
/// Also the allow-list for statistics queries, which interpolate table names.
pub const ALLOWED_TABLES: &[&str] = &[
    "sequence",
    "structure",
    "pdb",
    "methodology",
    "antigen",
    "antibody",
    "heavy_chain",
    "light_chain",
    "heavy_variable",
    "heavy_conserved",
    "light_variable",
    "light_conserved",
    "cdr_heavy",
    "cdr_light",
    "cdr_pair",
    "cdr_cluster",
    "binding_affinity",
];

/// Validates that a table name contains only safe SQL identifier characters
fn is_safe_sql_identifier(table: &str) -> bool {
    let mut chars = table.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates that a table name is in the allowed list and is a safe SQL identifier
pub fn is_valid_table_name(table: &str) -> bool {
    ALLOWED_TABLES.contains(&table) && is_safe_sql_identifier(table)
}

/// Options shared by file-backed pools
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub pool_size: u32,
    pub wal: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            wal: true,
        }
    }
}

/// Database connection pool and operations
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Create a new database connection with migrations
    #[instrument(skip(db_path))]
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::connect(db_path, ConnectOptions::default()).await
    }

    /// Open (creating if needed) the database at `db_path` and run migrations
    #[instrument(skip(db_path))]
    pub async fn connect(db_path: &str, options: ConnectOptions) -> Result<Self> {
        info!("Initializing database at: {}", db_path);

        let database_url = format!("sqlite://{}", db_path);
        if !Sqlite::database_exists(&database_url)
            .await
            .unwrap_or(false)
        {
            info!("Creating database: {}", database_url);
            Sqlite::create_database(&database_url)
                .await
                .map_err(|e| Error::Database(format!("Failed to create database: {}", e)))?;
        }

        let journal_mode = if options.wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };

        // Cascading deletes depend on foreign_keys being on for every connection
        let connect_options = SqliteConnectOptions::new()
            .filename(db_path)
            .journal_mode(journal_mode)
            .create_if_missing(true)
            .foreign_keys(true)
            .pragma("synchronous", "NORMAL")
            .pragma("cache_size", "10000")
            .pragma("temp_store", "memory")
            .pragma("busy_timeout", "30000");

        let pool = SqlitePoolOptions::new()
            .max_connections(options.pool_size.max(1))
            .min_connections(1)
            .connect_with(connect_options)
            .await
            .map_err(|e| Error::Database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Held on a single connection that never expires, since every new
    /// connection to `:memory:` would see an empty database.
    #[instrument]
    pub async fn new_in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Database(format!("Invalid in-memory URL: {}", e)))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .map_err(|e| Error::Database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Migration failed: {}", e)))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a Db instance from an existing pool (for testing/reuse)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction on the pool
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Check database health
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {}", e)))?;

        let fk_enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {}", e)))?;
        if fk_enabled != 1 {
            return Err(Error::Database(
                "Foreign key enforcement is disabled; cascades would not run".to_string(),
            ));
        }

        debug!("Database health check passed");
        Ok(())
    }

    /// Row counts for every table in the schema
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DatabaseStats> {
        debug!("Gathering database statistics");

        let mut table_counts = std::collections::BTreeMap::new();

        for &table in ALLOWED_TABLES {
            if !is_safe_sql_identifier(table) {
                return Err(Error::Database(format!(
                    "ALLOWED_TABLES contains invalid SQL identifier: '{}'",
                    table
                )));
            }

            // SQLx can't bind table names; `table` comes from the allow-list above
            let query = format!("SELECT COUNT(*) as count FROM {}", table);
            let row = sqlx::query(&query)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(format!("Failed to get count for {}: {}", table, e))
                })?;

            let count: i64 = row.get("count");
            table_counts.insert(table.to_string(), count);
        }

        Ok(DatabaseStats { table_counts })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseStats {
    pub table_counts: std::collections::BTreeMap<String, i64>,
}

impl DatabaseStats {
    pub fn count(&self, table: &str) -> i64 {
        self.table_counts.get(table).copied().unwrap_or(0)
    }

    pub fn total_rows(&self) -> i64 {
        self.table_counts.values().sum()
    }
}

pub use hierarchy::{AntibodyTree, DependentCounts, HierarchyReader};
pub use models::{CdrType, ClusterMethod, ExpMethod, LightChainType};
pub use repositories::{
    antibodies::{Antibody, AntibodyRepository, CreateAntibodyRequest},
    antigens::{Antigen, AntigenRepository},
    binding_affinities::{BindingAffinity, BindingAffinityRepository, CreateBindingAffinityRequest},
    cdrs::{
        CdrCluster, CdrHeavy, CdrLight, CdrPair, CdrRepository, CreateCdrClusterRequest,
        UpdateCdrClusterRequest,
    },
    chains::{ChainRepository, HeavyChain, LightChain},
    methodology::{Methodology, MethodologyRepository},
    pdbs::{CreatePdbRequest, Pdb, PdbRepository, UpdatePdbRequest},
    regions::{Region, RegionKind, RegionRepository},
    sequences::{Sequence, SequenceRepository},
    structures::{Structure, StructureRepository},
};
