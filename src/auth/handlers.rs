use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginForm, RegisterForm};
use crate::auth::password;
use crate::auth::repo::{is_unique_violation, User};
use crate::auth::session::{self, OptionalUser};
use crate::error::AppError;
use crate::state::AppState;
use crate::views::{LoginPage, RegisterPage};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Redirect, AppError> {
    match user {
        Some(session_user) => match User::find_by_id(&state.db, session_user.id).await? {
            Some(_) => Ok(Redirect::to("/products")),
            None => Ok(Redirect::to("/login")),
        },
        None => Ok(Redirect::to("/login")),
    }
}

#[instrument(skip(state))]
pub async fn login_page(State(state): State<AppState>) -> Html<String> {
    Html(state.views.login(&LoginPage { message: None }))
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(user) = User::find_by_username(&state.db, &form.username).await? {
        if password::verify_password(&form.password, &user.password_hash)? {
            session::establish(&session, &user).await?;
            info!(user_id = user.id, username = %user.username, "user logged in");
            return Ok(Redirect::to("/products").into_response());
        }
    }

    // One generic message for both unknown-user and wrong-password.
    warn!(username = %form.username, "login rejected");
    let page = LoginPage {
        message: Some("Invalid credentials".into()),
    };
    Ok(Html(state.views.login(&page)).into_response())
}

#[instrument(skip(state))]
pub async fn register_page(State(state): State<AppState>) -> Html<String> {
    Html(state.views.register(&RegisterPage { message: None }))
}

#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if User::find_by_username_or_email(&state.db, &form.username, &form.email)
        .await?
        .is_some()
    {
        warn!(username = %form.username, "duplicate registration");
        return Ok(duplicate_response(&state));
    }

    let hash = password::hash_password(&form.password)?;

    let user = match User::create(&state.db, &form.username, &form.email, &hash).await {
        Ok(user) => user,
        // Two concurrent registrations can both pass the existence check;
        // the uniqueness constraint is the authoritative duplicate signal.
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %form.username, "duplicate registration (insert race)");
            return Ok(duplicate_response(&state));
        }
        Err(e) => return Err(e.into()),
    };

    session::establish(&session, &user).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Redirect::to("/login").into_response())
}

fn duplicate_response(state: &AppState) -> Response {
    let page = RegisterPage {
        message: Some("Username or email already registered".into()),
    };
    Html(state.views.register(&page)).into_response()
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    session::clear(&session).await?;
    Ok(Redirect::to("/login"))
}
