use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::auth::repo::User;
use crate::error::AppError;
use crate::state::AppState;

/// Key for storing the user id in the session.
pub const USER_ID_KEY: &str = "user_id";
/// Key for storing the username in the session.
pub const USERNAME_KEY: &str = "username";

/// The authenticated user carried by a session, passed to handlers as an
/// explicit argument instead of being read from ambient request state.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Extracts the session user when present; public routes use this to vary
/// their rendering without gating access.
pub struct OptionalUser(pub Option<SessionUser>);

/// Auth gate for owner-restricted routes. Rejects with an explicit 403
/// access-denied page when the session carries no user.
pub struct CurrentUser(pub SessionUser);

async fn load_user(session: &Session) -> Result<Option<SessionUser>, AppError> {
    let Some(id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };
    let username = session
        .get::<String>(USERNAME_KEY)
        .await?
        .unwrap_or_default();
    Ok(Some(SessionUser { id, username }))
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let user = load_user(&session)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(OptionalUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state).await?;
        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(uri = %parts.uri, "unauthenticated request to protected route");
                Err((StatusCode::FORBIDDEN, Html(state.views.access_denied())).into_response())
            }
        }
    }
}

/// Populate the session for a freshly authenticated user.
pub async fn establish(session: &Session, user: &User) -> Result<(), AppError> {
    session.insert(USER_ID_KEY, user.id).await?;
    session.insert(USERNAME_KEY, user.username.clone()).await?;
    Ok(())
}

/// Remove the auth fields from the session, leaving anything else in the
/// record untouched.
pub async fn clear(session: &Session) -> Result<(), AppError> {
    session.remove::<i64>(USER_ID_KEY).await?;
    session.remove::<String>(USERNAME_KEY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use tower_sessions::MemoryStore;

    fn user() -> User {
        User {
            id: 1,
            username: "alice".into(),
            password_hash: "hash".into(),
            email: "alice@example.com".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn establish_populates_auth_fields() {
        let session = session();
        establish(&session, &user()).await.unwrap();
        assert_eq!(session.get::<i64>(USER_ID_KEY).await.unwrap(), Some(1));
        assert_eq!(
            session.get::<String>(USERNAME_KEY).await.unwrap(),
            Some("alice".into())
        );
    }

    #[tokio::test]
    async fn clear_removes_auth_fields() {
        let session = session();
        establish(&session, &user()).await.unwrap();
        clear(&session).await.unwrap();
        assert_eq!(session.get::<i64>(USER_ID_KEY).await.unwrap(), None);
        assert_eq!(session.get::<String>(USERNAME_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_leaves_other_fields_untouched() {
        let session = session();
        session.insert("theme", "dark".to_string()).await.unwrap();
        establish(&session, &user()).await.unwrap();
        clear(&session).await.unwrap();
        assert_eq!(
            session.get::<String>("theme").await.unwrap(),
            Some("dark".into())
        );
    }
}
