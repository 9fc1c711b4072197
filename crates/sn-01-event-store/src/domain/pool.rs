//! # Connection Pool
//!
//! Fixed-size pool of backend connections. Checkout waits on a semaphore;
//! the returned guard puts the connection back when dropped, on every exit
//! path of the borrower (return, `?`, panic, or a cancelled future).

use parking_lot::Mutex;
use shared_types::{StreamError, StreamResult};
use std::ops::{Deref, DerefMut};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::debug;

/// Reset hook run on a connection before it goes back to the pool.
pub trait Recycle {
    /// Clear any per-borrower state (subscriptions, buffered input).
    fn recycle(&mut self);
}

/// A fixed set of connections shared by concurrent borrowers.
pub struct ConnectionPool<C> {
    name: &'static str,
    idle: Mutex<Vec<C>>,
    permits: Semaphore,
    size: usize,
}

impl<C: Recycle + Send> ConnectionPool<C> {
    /// Build a pool owning `connections`.
    #[must_use]
    pub fn new(name: &'static str, connections: Vec<C>) -> Self {
        let size = connections.len();
        Self {
            name,
            idle: Mutex::new(connections),
            permits: Semaphore::new(size),
            size,
        }
    }

    /// Borrow a connection, waiting for one to become free.
    ///
    /// # Errors
    ///
    /// `StoreClosed` once [`close`](Self::close) has been called.
    pub async fn acquire(&self) -> StreamResult<PooledConnection<'_, C>> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StreamError::StoreClosed)?;
        let conn = self.idle.lock().pop().ok_or_else(|| {
            StreamError::Storage(format!("{} pool has a permit but no idle connection", self.name))
        })?;
        debug!(pool = self.name, available = self.permits.available_permits(), "Connection checked out");
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
            _permit: permit,
        })
    }

    /// Borrow a connection, giving up at `deadline`.
    ///
    /// Returns `Ok(None)` when no connection freed up in time.
    ///
    /// # Errors
    ///
    /// `StoreClosed` once [`close`](Self::close) has been called.
    pub async fn acquire_until(
        &self,
        deadline: Instant,
    ) -> StreamResult<Option<PooledConnection<'_, C>>> {
        match tokio::time::timeout_at(deadline, self.acquire()).await {
            Ok(conn) => conn.map(Some),
            Err(_) => {
                debug!(pool = self.name, "Checkout deadline passed");
                Ok(None)
            }
        }
    }

    /// Refuse further checkouts. Borrowed connections still return normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Whether the pool refuses checkouts.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Total number of connections.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of connections not currently borrowed.
    #[must_use]
    pub fn available(&self) -> usize {
        self.idle.lock().len()
    }

    fn checkin(&self, mut conn: C) {
        conn.recycle();
        self.idle.lock().push(conn);
        debug!(pool = self.name, "Connection checked in");
    }
}

/// A borrowed connection. Returned to its pool on drop.
pub struct PooledConnection<'a, C: Recycle + Send> {
    pool: &'a ConnectionPool<C>,
    conn: Option<C>,
    // Released after `conn` is back in the idle list (fields drop after `Drop::drop`).
    _permit: SemaphorePermit<'a>,
}

impl<C: Recycle + Send> Deref for PooledConnection<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("connection is only taken in drop"),
        }
    }
}

impl<C: Recycle + Send> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!("connection is only taken in drop"),
        }
    }
}

impl<C: Recycle + Send> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.checkin(conn);
        }
    }
}
