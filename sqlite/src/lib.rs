//! SQLite queue store for the ticket queue.
//!
//! This crate provides the durable implementation of the `QueueStore` trait
//! from `ticket-queue-core`, built on sqlx:
//!
//! - Embedded migrations that create the ticket table and seed the meta singleton
//! - Connection pooling
//! - One sqlx transaction per engine operation
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE queue_entries (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     ticket INTEGER UNIQUE NOT NULL,
//!     name TEXT NOT NULL,
//!     status TEXT NOT NULL,          -- 'WAITING' | 'CALLED' | 'DONE'
//!     created_at TEXT NOT NULL
//! );
//!
//! CREATE TABLE queue_meta (
//!     id INTEGER PRIMARY KEY CHECK (id = 1),
//!     current_ticket INTEGER NOT NULL,
//!     last_ticket INTEGER NOT NULL
//! );
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ticket_queue_sqlite::SqliteQueueStore;
//!
//! let store = SqliteQueueStore::connect("sqlite://queue.db", 5).await?;
//! store.migrate().await?;
//! ```

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use ticket_queue_core::store::{QueueStore, QueueTransaction, StoreError, StoreFuture};
use ticket_queue_core::types::{
    QueueMeta, SortOrder, TicketEntry, TicketNumber, TicketRange, TicketStatus,
};

/// How long a connection waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed [`QueueStore`].
#[derive(Clone, Debug)]
pub struct SqliteQueueStore {
    pool: SqlitePool,
}

impl SqliteQueueStore {
    /// Create a store using an existing connection pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url`.
    ///
    /// `url` is either a `sqlite:` URL or a bare file path. For bare paths
    /// the parent directory is created first. `sqlite::memory:` and
    /// `:memory:` open a private in-memory database (see [`in_memory`](Self::in_memory)).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the URL is invalid, the directory
    /// cannot be created, or the connection fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        if matches!(url, "sqlite::memory:" | ":memory:") {
            return Self::in_memory().await;
        }

        let options = if url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(url).map_err(db_error)?
        } else {
            if let Some(parent) = Path::new(url).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Database(format!(
                        "Failed to create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            SqliteConnectOptions::new().filename(url)
        };

        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

        tracing::info!(url, max_connections, "Connected to queue database");
        Ok(Self::new(pool))
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every new SQLite memory connection would start from an empty database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Run the embedded migrations and make sure the meta singleton exists.
    ///
    /// Safe to call on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;

        let seeded = sqlx::query(
            "INSERT OR IGNORE INTO queue_meta (id, current_ticket, last_ticket) VALUES (1, 0, 0)",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error)?
        .rows_affected();
        if seeded > 0 {
            tracing::info!("Queue meta record initialised");
        }
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl QueueStore for SqliteQueueStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn QueueTransaction>> {
        Box::pin(async move {
            let tx = self.pool.begin().await.map_err(db_error)?;
            Ok(Box::new(SqliteQueueTransaction { tx }) as Box<dyn QueueTransaction>)
        })
    }
}

/// One sqlx transaction. Rolled back on drop unless committed.
struct SqliteQueueTransaction {
    tx: Transaction<'static, Sqlite>,
}

type EntryRow = (i64, String, String, DateTime<Utc>);

impl QueueTransaction for SqliteQueueTransaction {
    fn read_meta(&mut self) -> StoreFuture<'_, QueueMeta> {
        Box::pin(async move {
            let row: Option<(i64, i64)> = sqlx::query_as(
                "SELECT current_ticket, last_ticket FROM queue_meta WHERE id = 1",
            )
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;

            let (current_ticket, last_ticket) = row.ok_or(StoreError::StoreUnavailable)?;
            Ok(QueueMeta {
                current_ticket: from_sql(current_ticket)?,
                last_ticket: from_sql(last_ticket)?,
            })
        })
    }

    fn write_meta(&mut self, meta: QueueMeta) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO queue_meta (id, current_ticket, last_ticket) VALUES (1, ?, ?) \
                 ON CONFLICT(id) DO UPDATE SET \
                 current_ticket = excluded.current_ticket, last_ticket = excluded.last_ticket",
            )
            .bind(to_sql(meta.current_ticket)?)
            .bind(to_sql(meta.last_ticket)?)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error)?;
            Ok(())
        })
    }

    fn insert_entry(&mut self, entry: TicketEntry) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO queue_entries (ticket, name, status, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(to_sql(entry.ticket)?)
            .bind(&entry.name)
            .bind(entry.status.as_str())
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateTicket(entry.ticket)
                }
                other => db_error(other),
            })?;
            Ok(())
        })
    }

    fn find_entry(&mut self, ticket: TicketNumber) -> StoreFuture<'_, Option<TicketEntry>> {
        Box::pin(async move {
            let row: Option<EntryRow> = sqlx::query_as(
                "SELECT ticket, name, status, created_at FROM queue_entries WHERE ticket = ?",
            )
            .bind(to_sql(ticket)?)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error)?;

            row.map(row_to_entry).transpose()
        })
    }

    fn update_status(
        &mut self,
        ticket: TicketNumber,
        status: TicketStatus,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let updated = sqlx::query("UPDATE queue_entries SET status = ? WHERE ticket = ?")
                .bind(status.as_str())
                .bind(to_sql(ticket)?)
                .execute(&mut *self.tx)
                .await
                .map_err(db_error)?
                .rows_affected();

            if updated == 0 {
                return Err(StoreError::EntryNotFound(ticket));
            }
            Ok(())
        })
    }

    fn update_status_where(
        &mut self,
        current: TicketStatus,
        new: TicketStatus,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let updated = sqlx::query("UPDATE queue_entries SET status = ? WHERE status = ?")
                .bind(new.as_str())
                .bind(current.as_str())
                .execute(&mut *self.tx)
                .await
                .map_err(db_error)?
                .rows_affected();
            Ok(updated)
        })
    }

    fn count_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        range: TicketRange,
    ) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM queue_entries");
            push_status_filter(&mut query, statuses);
            if let Some(after) = range.after {
                query.push(" AND ticket > ").push_bind(to_sql(after)?);
            }
            if let Some(before) = range.before {
                query.push(" AND ticket < ").push_bind(to_sql(before)?);
            }

            let count: i64 = query
                .build_query_scalar()
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_error)?;
            u64::try_from(count)
                .map_err(|_| StoreError::CorruptRecord(format!("Negative count: {count}")))
        })
    }

    fn find_first_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        after: TicketNumber,
        order: SortOrder,
    ) -> StoreFuture<'a, Option<TicketNumber>> {
        Box::pin(async move {
            let mut query = QueryBuilder::<Sqlite>::new("SELECT ticket FROM queue_entries");
            push_status_filter(&mut query, statuses);
            query.push(" AND ticket > ").push_bind(to_sql(after)?);
            query.push(match order {
                SortOrder::Ascending => " ORDER BY ticket ASC LIMIT 1",
                SortOrder::Descending => " ORDER BY ticket DESC LIMIT 1",
            });

            let ticket: Option<i64> = query
                .build_query_scalar()
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_error)?;
            ticket.map(from_sql).transpose()
        })
    }

    fn delete_all_entries(&mut self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let deleted = sqlx::query("DELETE FROM queue_entries")
                .execute(&mut *self.tx)
                .await
                .map_err(db_error)?
                .rows_affected();
            Ok(deleted)
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        Box::pin(async move { self.tx.commit().await.map_err(db_error) })
    }
}

/// Appends ` WHERE status IN (...)` with one bound parameter per status.
fn push_status_filter(query: &mut QueryBuilder<'_, Sqlite>, statuses: &[TicketStatus]) {
    query.push(" WHERE status IN (");
    let mut separated = query.separated(", ");
    for status in statuses {
        separated.push_bind(status.as_str());
    }
    query.push(")");
}

fn row_to_entry((ticket, name, status, created_at): EntryRow) -> Result<TicketEntry, StoreError> {
    Ok(TicketEntry {
        ticket: from_sql(ticket)?,
        name,
        status: TicketStatus::parse(&status)?,
        created_at,
    })
}

fn to_sql(ticket: TicketNumber) -> Result<i64, StoreError> {
    i64::try_from(ticket.get()).map_err(|_| {
        StoreError::CorruptRecord(format!("Ticket {ticket} exceeds the storable range"))
    })
}

fn from_sql(value: i64) -> Result<TicketNumber, StoreError> {
    u64::try_from(value)
        .map(TicketNumber::new)
        .map_err(|_| StoreError::CorruptRecord(format!("Negative ticket number: {value}")))
}

#[allow(clippy::needless_pass_by_value)] // Used directly with map_err
fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
