use axum::extract::FromRequestParts;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, EntityTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    entity::carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
    error::AppResult,
    models::Cart,
};

pub const SESSION_HEADER: &str = "x-session-id";

/// Cart session identity, taken from the `x-session-id` header. A missing
/// or blank header starts a fresh session; cart responses echo the id so
/// the client can keep sending it.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(SessionId(id))
    }
}

/// Load the cart for a session. Unknown, expired or unreadable blobs all
/// read as the empty cart.
pub async fn load_cart(conn: &impl ConnectionTrait, session_id: &str) -> AppResult<Cart> {
    let row = Carts::find_by_id(session_id.to_string()).one(conn).await?;

    let Some(row) = row else {
        return Ok(Cart::empty());
    };
    if row.expires_at < Utc::now() {
        return Ok(Cart::empty());
    }

    match serde_json::from_value::<Cart>(row.data) {
        Ok(cart) => Ok(cart),
        Err(err) => {
            tracing::warn!(session_id, error = %err, "unreadable cart blob, resetting");
            Ok(Cart::empty())
        }
    }
}

/// Persist the cart, refreshing the expiry window. Last write wins; the
/// session is single-owner so no locking happens here.
pub async fn save_cart(
    conn: &impl ConnectionTrait,
    session_id: &str,
    cart: &Cart,
    ttl_hours: i64,
) -> AppResult<()> {
    let data = serde_json::to_value(cart).map_err(anyhow::Error::from)?;
    let now = Utc::now();

    let active = CartActive {
        id: Set(session_id.to_string()),
        data: Set(data),
        expires_at: Set((now + Duration::hours(ttl_hours)).into()),
        updated_at: Set(now.into()),
    };

    Carts::insert(active)
        .on_conflict(
            OnConflict::column(CartCol::Id)
                .update_columns([CartCol::Data, CartCol::ExpiresAt, CartCol::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;

    Ok(())
}
