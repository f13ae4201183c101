//! Database handle, schema and entity access

pub mod activities;
pub mod groups;
pub mod init;
pub mod models;
pub mod retry;
pub mod sessions;
pub mod words;

pub use init::*;
pub use models::*;

use crate::Result;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Shared database handle
///
/// Every write transaction, including seeding and resets, holds the writer
/// lock from `BEGIN` to commit or rollback, so at most one transaction per
/// process is writing at any time. Reads go straight to the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Connection pool for reads
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a write transaction, waiting for any other writer to finish
    pub async fn begin_write(&self) -> Result<WriteTx> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _writer: guard })
    }

    /// Close the pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Write transaction paired with the writer lock
///
/// Dropping it without [`WriteTx::commit`] rolls the transaction back.
pub struct WriteTx {
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

impl WriteTx {
    /// Connection the transaction runs on
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
