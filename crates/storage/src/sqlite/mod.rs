use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use snafu::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection};

use super::KeyValueStore;
use super::error::{
    CreateSqliteDirectorySnafu, InvariantViolationSnafu, SqliteConnectSnafu, SqlitePragmaSnafu,
    SqliteQuerySnafu, SqliteRuntimeInitSnafu, SqliteThreadSpawnSnafu, StorageResult,
};

const CREATE_KV_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Key-value store backed by a single SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    connect_options: SqliteConnectOptions,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file and ensures the schema exists.
    ///
    /// The location is a filesystem path, never a connection URL.
    pub fn open(database_path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = database_path.as_ref().to_path_buf();
        ensure_database_directory(&path)?;

        let connect_options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let bootstrap_options = connect_options.clone();
        let bootstrap_path = path.clone();
        run_on_worker("sqlite-open", async move {
            let mut connection =
                connect_store_connection(&bootstrap_options, &bootstrap_path, "sqlite-open-connect")
                    .await?;

            sqlx::query(CREATE_KV_TABLE)
                .execute(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "sqlite-open-create-kv-table",
                })?;

            connection.close().await.context(SqliteQuerySnafu {
                stage: "sqlite-open-close",
            })?;
            Ok(())
        })?;

        tracing::debug!(path = %path.display(), "opened sqlite key-value store");
        Ok(Self {
            path,
            connect_options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let connect_options = self.connect_options.clone();
        let path = self.path.clone();
        let key = key.to_string();
        run_on_worker("kv-get", async move {
            let mut connection =
                connect_store_connection(&connect_options, &path, "kv-get-connect").await?;
            sqlx::query_scalar::<_, String>("SELECT value FROM kv WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut connection)
                .await
                .context(SqliteQuerySnafu {
                    stage: "kv-get-select",
                })
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let connect_options = self.connect_options.clone();
        let path = self.path.clone();
        let key = key.to_string();
        let value = value.to_string();
        run_on_worker("kv-set", async move {
            let mut connection =
                connect_store_connection(&connect_options, &path, "kv-set-connect").await?;
            sqlx::query(
                "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(unix_timestamp_seconds())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "kv-set-upsert",
            })?;
            Ok(())
        })
    }
}

fn run_on_worker<T, F>(stage: &'static str, op: F) -> StorageResult<T>
where
    T: Send + 'static,
    F: Future<Output = StorageResult<T>> + Send + 'static,
{
    // Store traits are sync, so each call executes on a dedicated worker thread
    // with its own current-thread runtime to avoid nested-runtime blocking panics.
    let worker = std::thread::Builder::new()
        .name(format!("sqlite-store-{stage}"))
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context(SqliteRuntimeInitSnafu {
                    stage: "sqlite-store-runtime-build",
                })?;
            runtime.block_on(op)
        })
        .context(SqliteThreadSpawnSnafu {
            stage: "sqlite-store-spawn-worker",
        })?;

    match worker.join() {
        Ok(result) => result,
        Err(_) => InvariantViolationSnafu {
            stage,
            details: "sqlite storage worker thread panicked".to_string(),
        }
        .fail(),
    }
}

async fn connect_store_connection(
    connect_options: &SqliteConnectOptions,
    path: &Path,
    stage: &'static str,
) -> StorageResult<SqliteConnection> {
    let mut connection = SqliteConnection::connect_with(connect_options)
        .await
        .context(SqliteConnectSnafu {
            stage,
            path: path.display().to_string(),
        })?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&mut connection)
        .await
        .context(SqlitePragmaSnafu {
            stage: "sqlite-store-pragma-busy-timeout",
            pragma: "busy_timeout",
        })?;

    Ok(connection)
}

fn ensure_database_directory(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateSqliteDirectorySnafu {
            stage: "sqlite-open-create-directory",
            path: parent.display().to_string(),
        })?;
    }

    Ok(())
}

fn unix_timestamp_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
