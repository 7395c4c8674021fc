use adb_config::Config;
use adb_core::{telemetry, Error, Result};
use adb_db::{ConnectOptions, DatabaseStats, Db, DependentCounts, HierarchyReader};
use adb_storage::{FileKind, FileStore, LocalFileStore, PutReceipt};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "antidb")]
#[command(about = "Antibody/antigen structure database", long_about = None)]
struct Cli {
    /// SQLite database file (overrides ANTIDB_DATABASE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database if needed and apply migrations
    Migrate,
    /// Verify connectivity and foreign key enforcement
    Health,
    /// Row counts per table
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Store a structure or PDB file and print its reference
    Upload {
        #[arg(long, value_parser = parse_kind)]
        kind: FileKind,
        path: PathBuf,
    },
    /// Delete a structure and everything that depends on it
    DeleteStructure {
        id: i64,
        /// Perform the delete; without it only the preview is shown
        #[arg(long)]
        yes: bool,
    },
}

fn parse_kind(s: &str) -> std::result::Result<FileKind, String> {
    s.parse().map_err(|e: adb_storage::StorageError| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration - exit with non-zero if invalid
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }

    telemetry::init_tracing(&config.logging.environment, "antidb");
    tracing::debug!(?config, "Configuration loaded successfully");

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Upload { kind, path } => {
            let store = LocalFileStore::new(
                &config.storage.media_root,
                Duration::from_secs(config.storage.retry_max_elapsed_secs),
            )?;
            let receipt = upload_file(&store, kind, &path).await?;
            println!("{}\t{}", receipt.reference, receipt.checksum);
            Ok(())
        }
        command => {
            let db = open_db(config).await?;
            run_db_command(command, &db).await
        }
    }
}

async fn open_db(config: &Config) -> Result<Db> {
    let options = ConnectOptions {
        pool_size: config.database.pool_size,
        wal: config.database.sqlite_wal,
    };
    Db::connect(&config.database.path, options).await
}

async fn run_db_command(command: Command, db: &Db) -> Result<()> {
    match command {
        Command::Migrate => {
            tracing::info!("Schema is up to date");
        }
        Command::Health => {
            db.health_check().await?;
            println!("ok");
        }
        Command::Stats { json } => {
            let stats = db.stats().await?;
            println!("{}", render_stats(&stats, json)?);
        }
        Command::DeleteStructure { id, yes } => {
            let counts = delete_structure(db, id, yes).await?;
            print!("{}", render_dependents(&counts));
            if !yes {
                println!("Nothing deleted; re-run with --yes to delete");
            }
        }
        Command::Upload { .. } => {
            return Err(Error::Validation("upload does not use the database".to_string()));
        }
    }
    Ok(())
}

async fn upload_file<S: FileStore>(store: &S, kind: FileKind, path: &Path) -> Result<PutReceipt> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Validation(format!("{} has no usable file name", path.display())))?;
    let data = tokio::fs::read(path).await?;

    let receipt = store.upload(kind, file_name, Bytes::from(data)).await?;
    tracing::info!(reference = %receipt.reference, size = receipt.size, "Uploaded file");
    Ok(receipt)
}

/// Preview the cascade for `id`, deleting only when `confirmed`
async fn delete_structure(db: &Db, id: i64, confirmed: bool) -> Result<DependentCounts> {
    let hierarchy = HierarchyReader::new(db.pool());
    if !confirmed {
        return hierarchy.structure_dependents(id).await;
    }

    let counts = hierarchy.delete_structure(id).await?;
    tracing::info!(structure_id = id, rows = counts.total(), "Deleted structure");
    Ok(counts)
}

fn render_stats(stats: &DatabaseStats, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(stats)
            .map_err(|e| Error::Validation(format!("Failed to encode stats: {}", e)));
    }

    let width = stats.table_counts.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (table, count) in &stats.table_counts {
        out.push_str(&format!("{:<width$}  {}\n", table, count, width = width));
    }
    out.push_str(&format!("{:<width$}  {}", "total", stats.total_rows(), width = width));
    Ok(out)
}

fn render_dependents(counts: &DependentCounts) -> String {
    let mut out = format!(
        "Structure {} cascades to {} rows:\n",
        counts.structure_id,
        counts.total()
    );
    for (table, count) in &counts.table_counts {
        out.push_str(&format!("  {}: {}\n", table, count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use adb_db::{AntigenRepository, SequenceRepository, StructureRepository};
    use tempfile::TempDir;
    use test_support::sample_sequence;

    async fn structure_with_antigen(db: &Db) -> i64 {
        let sequence = SequenceRepository::new(db.pool())
            .create(&sample_sequence(7))
            .await
            .unwrap();
        let structure = StructureRepository::new(db.pool())
            .create(sequence.id, "structure_files/20240101/a.pdb")
            .await
            .unwrap();
        AntigenRepository::new(db.pool())
            .create(structure.id)
            .await
            .unwrap();
        structure.id
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["antidb", "stats", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { json: true }));

        let cli = Cli::try_parse_from(["antidb", "--database", "x.db", "delete-structure", "4"])
            .unwrap();
        assert_eq!(cli.database.as_deref(), Some("x.db"));
        assert!(matches!(
            cli.command,
            Command::DeleteStructure { id: 4, yes: false }
        ));

        let cli = Cli::try_parse_from(["antidb", "upload", "--kind", "pdb", "1abc.pdb"]).unwrap();
        assert!(matches!(cli.command, Command::Upload { kind: FileKind::Pdb, .. }));

        assert!(Cli::try_parse_from(["antidb", "upload", "--kind", "movie", "a.mp4"]).is_err());
    }

    #[tokio::test]
    async fn test_delete_structure_needs_confirmation() {
        let db = Db::new_in_memory().await.unwrap();
        let id = structure_with_antigen(&db).await;

        let preview = delete_structure(&db, id, false).await.unwrap();
        assert_eq!(preview.count("structure"), 1);
        assert_eq!(preview.count("antigen"), 1);
        assert_eq!(db.stats().await.unwrap().count("antigen"), 1);

        let deleted = delete_structure(&db, id, true).await.unwrap();
        assert_eq!(deleted.table_counts, preview.table_counts);
        let stats = db.stats().await.unwrap();
        assert_eq!(stats.count("structure"), 0);
        assert_eq!(stats.count("antigen"), 0);
        assert_eq!(stats.count("sequence"), 1);

        assert!(delete_structure(&db, id, true).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_upload_file_stores_under_kind_prefix() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("7xyz.cif");
        std::fs::write(&source, b"data_7XYZ").unwrap();
        let store = LocalFileStore::new(dir.path().join("media"), Duration::from_secs(1)).unwrap();

        let receipt = upload_file(&store, FileKind::Pdb, &source).await.unwrap();

        assert!(receipt.reference.starts_with("pdb_files/"));
        assert!(receipt.reference.ends_with("_7xyz.cif"));
        assert_eq!(store.get(&receipt.reference).await.unwrap(), Bytes::from_static(b"data_7XYZ"));
    }

    #[tokio::test]
    async fn test_render_stats() {
        let db = Db::new_in_memory().await.unwrap();
        structure_with_antigen(&db).await;
        let stats = db.stats().await.unwrap();

        let text = render_stats(&stats, false).unwrap();
        assert!(text.lines().any(|l| l.starts_with("antigen") && l.ends_with(" 1")));
        assert!(text.ends_with(" 3"));

        let json: serde_json::Value = serde_json::from_str(&render_stats(&stats, true).unwrap()).unwrap();
        assert_eq!(json["table_counts"]["structure"], 1);
    }
}
