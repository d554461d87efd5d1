//! [`SqliteStore`], the SQLite implementation of [`Store`] and
//! [`BulkMutator`].

use std::{
  path::{Path, PathBuf},
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use roster_core::{
  entity::Entity,
  store::{BulkMutator, Store},
};
use tokio_rusqlite::Connection;

use crate::{
  Result,
  query,
  schema::{BUSY_TIMEOUT_MS, SCHEMA},
  session::Session,
};

/// Idle connections kept for reuse; extras are closed on release.
const MAX_IDLE: usize = 8;

// ─── Pool ────────────────────────────────────────────────────────────────────

/// Hands out connections to one database and takes them back.
pub(crate) struct Pool {
  target: PathBuf,
  idle:   Mutex<Vec<Connection>>,
  /// Keeps a shared in-memory database alive between sessions.
  _anchor: Option<Connection>,
}

impl Pool {
  async fn connect(target: &Path) -> Result<Connection> {
    let conn = Connection::open(target).await?;
    conn
      .call(|conn| {
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(())
      })
      .await?;
    Ok(conn)
  }

  /// The idle list holds only connections with no open transaction, so it
  /// stays usable after a panic elsewhere poisoned the lock.
  fn idle(&self) -> MutexGuard<'_, Vec<Connection>> {
    self.idle.lock().unwrap_or_else(|poisoned| {
      tracing::warn!("connection pool lock was poisoned; recovering");
      self.idle.clear_poison();
      poisoned.into_inner()
    })
  }

  pub(crate) async fn acquire(&self) -> Result<Connection> {
    let reused = self.idle().pop();
    match reused {
      Some(conn) => Ok(conn),
      None => Self::connect(&self.target).await,
    }
  }

  /// Return a connection with no open transaction for reuse.
  pub(crate) fn release(&self, conn: Connection) {
    let mut idle = self.idle();
    if idle.len() < MAX_IDLE {
      idle.push(conn);
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roster store backed by one SQLite database.
///
/// Cloning is cheap; the connection pool is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pool: Arc<Pool>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let target = path.as_ref().to_path_buf();
    let conn = Pool::connect(&target).await?;
    conn
      .call(|conn| {
        let _mode: String =
          conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Ok(())
      })
      .await?;
    Self::init_schema(&conn).await?;

    let pool = Pool { target, idle: Mutex::new(vec![conn]), _anchor: None };
    Ok(Self { pool: Arc::new(pool) })
  }

  /// Open a private in-memory store, mainly for tests.
  ///
  /// Every call gets its own database, shared by all sessions of the
  /// returned store (and its clones) until the last clone is dropped.
  pub async fn open_in_memory() -> Result<Self> {
    let target = PathBuf::from(format!(
      "file:roster-{}?mode=memory&cache=shared",
      uuid::Uuid::new_v4().simple()
    ));
    let anchor = Pool::connect(&target).await?;
    Self::init_schema(&anchor).await?;

    let pool = Pool { target, idle: Mutex::new(Vec::new()), _anchor: Some(anchor) };
    Ok(Self { pool: Arc::new(pool) })
  }

  async fn init_schema(conn: &Connection) -> Result<()> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Store / BulkMutator impl ────────────────────────────────────────────────

impl Store for SqliteStore {
  type Session = Session;

  async fn session(&self) -> Result<Session> {
    let conn = self.pool.acquire().await?;
    Ok(Session::new(Arc::clone(&self.pool), conn))
  }
}

impl BulkMutator for SqliteStore {
  type Error = crate::Error;

  /// One round trip, one autocommit `UPDATE` per entity, no transaction.
  async fn bulk_update<E: Entity>(&self, entities: Vec<E>) -> Result<usize> {
    if entities.is_empty() {
      return Ok(0);
    }
    let statements: Vec<query::Sql> = entities.iter().map(query::update).collect();

    let conn = self.pool.acquire().await?;
    let outcome = conn
      .call(move |conn| {
        let mut changed = 0;
        for sql in &statements {
          let mut stmt = conn.prepare_cached(&sql.text)?;
          changed += stmt.execute(rusqlite::params_from_iter(sql.params.iter()))?;
        }
        Ok(changed)
      })
      .await;
    if !matches!(outcome, Err(tokio_rusqlite::Error::ConnectionClosed)) {
      self.pool.release(conn);
    }

    let changed = outcome?;
    tracing::debug!(entity = E::NAME, requested = entities.len(), changed, "bulk update");
    Ok(changed)
  }
}
