use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use super::RepoError;

/// Finishes a transactional insert.
///
/// On success the transaction is committed. On failure it is rolled back and
/// the table's id sequence is rewound to `max(id)` so a failed insert does not
/// leave a gap. A failed rollback surfaces as `Io`, a failed rewind as
/// `SequenceResetFailure`; otherwise the original insert error is returned.
pub(crate) async fn finish_insert<T>(
    tx: Transaction<'static, Postgres>,
    pool: &PgPool,
    table: &'static str,
    inserted: Result<T, sqlx::Error>,
) -> Result<T, RepoError> {
    let err = match inserted {
        Ok(row) => {
            tx.commit().await?;
            return Ok(row);
        }
        Err(err) => err,
    };

    if let Err(rollback) = tx.rollback().await {
        return Err(RepoError::Io(format!("failed to rollback {} insert: {}", table, rollback)));
    }

    rewind_sequence(pool, table).await?;

    warn!("Insert into {} rolled back: {}", table, err);
    Err(err.into())
}

/// Points the id sequence at `max(id) + 1` (or 1 for an empty table).
async fn rewind_sequence(pool: &PgPool, table: &'static str) -> Result<(), RepoError> {
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('\"{table}\"', 'id'), \
         COALESCE((SELECT MAX(id) FROM \"{table}\"), 0) + 1, false)"
    );

    sqlx::query(&sql)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| RepoError::SequenceResetFailure {
            table,
            message: e.to_string(),
        })
}
