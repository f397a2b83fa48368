//! Diesel and pool error mapping for the record store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Pool failures mean the database is unreachable.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    StoreError::connection(error.into_message())
}

/// Map Diesel errors, keeping driver details out of client-facing messages.
pub(crate) fn map_diesel_error(error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreError::connection("database connection error")
        }
        DieselError::QueryBuilderError(_) => StoreError::query("database query error"),
        DieselError::DeserializationError(_) => StoreError::query("unexpected column data"),
        _ => StoreError::query("database error"),
    }
}
