use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Write one outbound notification to the log table. Stands in for a real
/// mail sender; there is no delivery contract.
pub async fn record(
    pool: &DbPool,
    recipient: &str,
    subject: &str,
    body: &str,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient, subject, body)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient)
    .bind(subject)
    .bind(body)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fire-and-forget dispatch. Runs outside the caller's transaction; a
/// failure is logged and never propagated to the parent operation.
pub fn dispatch(pool: DbPool, recipient: String, subject: String, body: String) {
    tokio::spawn(async move {
        match record(&pool, &recipient, &subject, &body).await {
            Ok(()) => {
                tracing::info!(recipient = %recipient, subject = %subject, "notification dispatched");
            }
            Err(err) => {
                tracing::warn!(error = %err, recipient = %recipient, "notification dispatch failed");
            }
        }
    });
}
