//! [`Session`]: a [`Repository`] over one pooled connection.
//!
//! Writes are staged in memory and flushed by `save` inside a savepoint, so
//! a save is atomic whether or not an explicit transaction is open. Tracked
//! reads remember the mutable column values they returned; an update that
//! leaves those values unchanged is dropped from the next save.

use std::{collections::HashMap, sync::Arc};

use roster_core::{
  entity::{Entity, ID, Value},
  specification::{Filter, Specification},
  store::{PendingId, Repository},
};
use rusqlite::params_from_iter;
use tokio_rusqlite::Connection;

use crate::{
  Error, Result,
  encode::RawRow,
  query::{self, Sql},
  store::Pool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
  None,
  Open,
  /// The guard was dropped unfinished; `ROLLBACK` is still owed.
  Abandoned,
}

enum Write {
  Insert(PendingId),
  /// Mutable values written by the update, kept as the new snapshot.
  Update(Vec<Value>),
  Delete,
}

struct Staged {
  table:  &'static str,
  entity: &'static str,
  id:     i64,
  write:  Write,
  sql:    Sql,
}

/// One statement of a save, as shipped to the connection thread.
struct Planned {
  sql:    Sql,
  insert: bool,
  entity: &'static str,
  id:     i64,
}

enum Outcome {
  Applied { affected: usize, keys: Vec<i64> },
  Stale { entity: &'static str, id: i64 },
}

fn apply(conn: &rusqlite::Connection, plan: &[Planned]) -> rusqlite::Result<Outcome> {
  let mut affected = 0;
  let mut keys = Vec::with_capacity(plan.len());
  for step in plan {
    let mut stmt = conn.prepare_cached(&step.sql.text)?;
    let changed = stmt.execute(params_from_iter(step.sql.params.iter()))?;
    if step.insert {
      keys.push(conn.last_insert_rowid());
    } else if changed == 0 {
      return Ok(Outcome::Stale { entity: step.entity, id: step.id });
    } else {
      keys.push(step.id);
    }
    affected += changed;
  }
  Ok(Outcome::Applied { affected, keys })
}

pub struct Session {
  conn:    Connection,
  pool:    Arc<Pool>,
  staged:  Vec<Staged>,
  tracked: HashMap<(&'static str, i64), Vec<Value>>,
  tx:      TxState,
}

impl Session {
  pub(crate) fn new(pool: Arc<Pool>, conn: Connection) -> Self {
    Self {
      conn,
      pool,
      staged: Vec::new(),
      tracked: HashMap::new(),
      tx: TxState::None,
    }
  }

  async fn run(&self, statement: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(statement)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Pay the `ROLLBACK` owed by an abandoned transaction.
  async fn settle(&mut self) -> Result<()> {
    if self.tx == TxState::Abandoned {
      self.run("ROLLBACK").await?;
      self.tx = TxState::None;
    }
    Ok(())
  }

  fn forget(&mut self) {
    self.staged.clear();
    self.tracked.clear();
  }

  async fn fetch<E: Entity>(
    &mut self,
    spec: Specification,
    limit: Option<usize>,
  ) -> Result<Vec<E>> {
    self.settle().await?;
    let sql = query::select::<E>(&spec, limit)?;
    let width = E::COLUMNS.len();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql.text)?;
        let rows = stmt
          .query_map(params_from_iter(sql.params.iter()), |row| RawRow::read(row, width))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let entities =
      rows.into_iter().map(RawRow::into_entity::<E>).collect::<Result<Vec<E>>>()?;
    if spec.tracked {
      for entity in &entities {
        self.tracked.insert((E::TABLE, entity.id()), entity.mutable_values());
      }
    }
    Ok(entities)
  }

  fn stage<E: Entity>(&mut self, id: i64, write: Write, sql: Sql) {
    self.staged.push(Staged { table: E::TABLE, entity: E::NAME, id, write, sql });
  }
}

impl Repository for Session {
  type Error = Error;

  async fn get<E: Entity>(&mut self, spec: Specification) -> Result<Option<E>> {
    Ok(self.fetch(spec, Some(1)).await?.pop())
  }

  async fn get_by_id<E: Entity>(&mut self, id: i64) -> Result<Option<E>> {
    self.get(Specification::matching(Filter::eq(ID, id))).await
  }

  async fn get_list<E: Entity>(&mut self, spec: Specification) -> Result<Vec<E>> {
    self.fetch(spec, None).await
  }

  async fn exists<E: Entity>(&mut self) -> Result<bool> {
    self.settle().await?;
    let sql = query::exists::<E>();
    let found = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get::<_, bool>(0))?))
      .await?;
    Ok(found)
  }

  fn add<E: Entity>(&mut self, entity: E) -> PendingId {
    let pending = PendingId::new();
    let sql = query::insert(&entity);
    self.stage::<E>(entity.id(), Write::Insert(pending.clone()), sql);
    pending
  }

  fn update<E: Entity>(&mut self, entity: E) {
    let sql = query::update(&entity);
    self.stage::<E>(entity.id(), Write::Update(entity.mutable_values()), sql);
  }

  fn remove<E: Entity>(&mut self, entity: &E) {
    self.stage::<E>(entity.id(), Write::Delete, query::delete_by_id::<E>(entity.id()));
  }

  async fn save(&mut self) -> Result<usize> {
    self.settle().await?;
    let staged: Vec<Staged> = std::mem::take(&mut self.staged)
      .into_iter()
      .filter(|s| match &s.write {
        Write::Update(values) => self.tracked.get(&(s.table, s.id)) != Some(values),
        _ => true,
      })
      .collect();
    if staged.is_empty() {
      return Ok(0);
    }

    let plan: Vec<Planned> = staged
      .iter()
      .map(|s| Planned {
        sql:    s.sql.clone(),
        insert: matches!(s.write, Write::Insert(_)),
        entity: s.entity,
        id:     s.id,
      })
      .collect();
    let outcome = self
      .conn
      .call(move |conn| {
        let savepoint = conn.savepoint()?;
        let outcome = apply(&savepoint, &plan)?;
        if let Outcome::Applied { .. } = outcome {
          savepoint.commit()?;
        }
        Ok(outcome)
      })
      .await?;

    let (affected, keys) = match outcome {
      Outcome::Applied { affected, keys } => (affected, keys),
      Outcome::Stale { entity, id } => return Err(Error::StaleRow { entity, id }),
    };
    for (staged, key) in staged.into_iter().zip(keys) {
      match staged.write {
        Write::Insert(pending) => pending.resolve(key),
        Write::Update(values) => {
          self.tracked.insert((staged.table, key), values);
        }
        Write::Delete => {
          self.tracked.remove(&(staged.table, key));
        }
      }
    }
    Ok(affected)
  }

  async fn execute_delete<E: Entity>(&mut self, filter: Filter) -> Result<usize> {
    self.settle().await?;
    let sql = query::delete_where::<E>(&filter)?;
    let deleted = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&sql.text)?;
        Ok(stmt.execute(params_from_iter(sql.params.iter()))?)
      })
      .await?;
    self.tracked.retain(|(table, _), _| *table != E::TABLE);
    tracing::debug!(entity = E::NAME, deleted, "executed delete");
    Ok(deleted)
  }

  async fn begin(&mut self) -> Result<()> {
    self.settle().await?;
    if self.tx == TxState::Open {
      return Err(Error::TransactionOpen);
    }
    // Marked open before the statement is sent: if this future is dropped
    // mid-flight, `BEGIN` may still run and the connection must not be
    // pooled.
    self.tx = TxState::Open;
    if let Err(e) = self.run("BEGIN IMMEDIATE").await {
      self.tx = TxState::None;
      return Err(e);
    }
    Ok(())
  }

  async fn commit(&mut self) -> Result<()> {
    self.settle().await?;
    if self.tx != TxState::Open {
      return Err(Error::NoTransaction);
    }
    self.run("COMMIT").await?;
    self.tx = TxState::None;
    Ok(())
  }

  async fn rollback(&mut self) -> Result<()> {
    self.settle().await?;
    if self.tx != TxState::Open {
      return Err(Error::NoTransaction);
    }
    self.run("ROLLBACK").await?;
    self.tx = TxState::None;
    self.forget();
    Ok(())
  }

  fn abandon(&mut self) {
    if self.tx == TxState::Open {
      self.tx = TxState::Abandoned;
      self.forget();
    }
  }
}

impl Drop for Session {
  fn drop(&mut self) {
    if self.tx == TxState::None {
      self.pool.release(self.conn.clone());
    } else {
      tracing::warn!("closing connection with an unfinished transaction");
    }
  }
}
