//! Vote-right promotion, run off the request path.
//!
//! When a user's edit is applied they move one step closer to earning
//! the vote role. The check is cheap but has no business delaying the
//! apply transaction, so the service pushes user ids onto a bounded
//! channel and a single worker task processes them. A full channel
//! drops the notification; the next applied edit retries it.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use curio_core::types::Id;
use curio_db::models::user::roles;
use curio_db::repositories::{EditRepo, UserRepo};
use curio_db::DbPool;

use crate::error::EditError;

const QUEUE_DEPTH: usize = 64;

/// Sending side of the promotion queue.
#[derive(Debug, Clone)]
pub struct PromotionHandle {
    tx: mpsc::Sender<Id>,
}

impl PromotionHandle {
    /// Queue a promotion check. Never blocks.
    pub fn notify(&self, user_id: Id) {
        if self.tx.try_send(user_id).is_err() {
            tracing::warn!(%user_id, "promotion queue full, dropping notification");
        }
    }
}

/// Spawn the promotion worker. The task drains the queue until the
/// token is cancelled and the channel is closed.
pub fn spawn(pool: DbPool, threshold: i64, cancel: CancellationToken) -> PromotionHandle {
    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(user_id) => {
                        if let Err(err) = promote_user_vote_rights(&pool, user_id, threshold).await
                        {
                            tracing::warn!(%user_id, %err, "vote-right promotion failed");
                        }
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("promotion worker stopped");
    });
    PromotionHandle { tx }
}

/// Grant the vote role once a user has enough applied, accepted edits.
/// Returns whether a grant happened.
pub async fn promote_user_vote_rights(
    pool: &DbPool,
    user_id: Id,
    threshold: i64,
) -> Result<bool, EditError> {
    let mut conn = pool.acquire().await?;
    let applied = EditRepo::count_applied_by_user(&mut *conn, user_id).await?;
    if applied < threshold {
        return Ok(false);
    }
    if UserRepo::has_role(&mut *conn, user_id, roles::VOTE).await? {
        return Ok(false);
    }
    UserRepo::grant_role(&mut *conn, user_id, roles::VOTE).await?;
    tracing::info!(%user_id, applied, "granted vote role");
    Ok(true)
}
