//! Referral token business logic - Issuing and redeeming single-use tokens.
//!
//! [`use_token`] is the single-use gate. The unused-to-used transition is a
//! conditional `UPDATE ... WHERE is_used = FALSE`, so two redemptions of the same
//! token can never both succeed.

use crate::{
    entities::{Token, token},
    errors::{Error, Result},
};
use rand::{Rng, distr::Alphanumeric};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{info, warn};

/// Prefix of every referral token
pub const TOKEN_PREFIX: &str = "REF-";

/// Number of random characters following the prefix
pub const TOKEN_RANDOM_LEN: usize = 10;

const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Generates a candidate token string: `REF-` plus ten uppercased alphanumerics.
#[must_use]
pub fn generate_token_string() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{TOKEN_PREFIX}{}", suffix.to_uppercase())
}

/// Issues a new unused token.
///
/// Candidates that collide with an existing token are discarded and
/// regenerated, up to a small fixed number of attempts.
pub async fn create_token<C>(db: &C) -> Result<token::Model>
where
    C: ConnectionTrait,
{
    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let candidate = generate_token_string();
        if get_token(db, &candidate).await?.is_some() {
            warn!("Token collision on attempt {}, regenerating", attempt);
            continue;
        }
        return insert_token(db, candidate).await;
    }

    Err(Error::TokenGeneration {
        attempts: MAX_GENERATION_ATTEMPTS,
    })
}

/// Stores a token with a caller-chosen string.
pub(crate) async fn insert_token<C>(db: &C, token_string: String) -> Result<token::Model>
where
    C: ConnectionTrait,
{
    let model = token::ActiveModel {
        token: Set(token_string),
        created_at: Set(chrono::Utc::now()),
        used_by: Set(None),
        is_used: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Issued referral token {}", model.token);
    Ok(model)
}

/// Every token in insertion order.
pub async fn get_all_tokens<C>(db: &C) -> Result<Vec<token::Model>>
where
    C: ConnectionTrait,
{
    Token::find()
        .order_by_asc(token::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a token by its exact string.
pub async fn get_token<C>(db: &C, token_string: &str) -> Result<Option<token::Model>>
where
    C: ConnectionTrait,
{
    Token::find()
        .filter(token::Column::Token.eq(token_string))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Marks a token as used by `username`.
///
/// Returns `None` if the token does not exist or was already used; otherwise
/// the updated record with `is_used = true` and `used_by = username`.
pub async fn use_token<C>(db: &C, token_string: &str, username: &str) -> Result<Option<token::Model>>
where
    C: ConnectionTrait,
{
    let result = Token::update_many()
        .col_expr(token::Column::IsUsed, Expr::value(true))
        .col_expr(token::Column::UsedBy, Expr::value(username))
        .filter(token::Column::Token.eq(token_string))
        .filter(token::Column::IsUsed.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    info!("Referral token {} redeemed by {}", token_string, username);
    get_token(db, token_string).await
}
