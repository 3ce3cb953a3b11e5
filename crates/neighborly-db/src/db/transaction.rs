//! Transaction helper for multi-row writes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(&mut conn, move |tx| async move {
//!     query::user::unlink_residence(tx, residence_id).await?;
//!     query::residence::delete_residence(tx, residence_id).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::error::DbError;

/// ## Summary
/// Runs `callback` inside a database transaction and returns its result. The
/// transaction is rolled back when the callback returns an error.
///
/// ## Errors
/// Returns any error produced by the callback, or errors raised while starting
/// or committing the transaction.
pub async fn with_transaction<'a, 'conn, C, T, F>(
    conn: &'conn mut C,
    callback: F,
) -> Result<T, DbError>
where
    C: AsyncConnection,
    F: for<'r> FnOnce(&'r mut C) -> ScopedBoxFuture<'a, 'r, Result<T, DbError>> + Send + 'a,
    T: Send + 'a,
    'a: 'conn,
{
    conn.transaction::<T, DbError, F>(callback).await
}
