use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, routing::post, Router};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    db::{grass::Activity, models::User, users},
    error::{AppError, Result},
    extract::Json,
    services::activity,
    validate, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: usize,
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(user_id: i64, secret: &str, expires_in_secs: i64) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::seconds(expires_in_secs))
        .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

    let claims = Claims {
        user_id,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal("Failed to create token".to_string()))
}

/// Checks signature and expiry. Any failure is reported as `Unauthorized`.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let email = body.email.trim();
    validate::email(email)?;
    validate::password(&body.password)?;
    let user_name = validate::required(Some(&body.user_name), "userName")?;

    if users::find_by_email(&state.db.pool, email).await?.is_some() {
        return Err(AppError::Conflict(format!("{email} is already registered")));
    }

    let password_hash = hash_password(body.password.trim())?;

    // A concurrent signup for the same email loses on the unique index
    let user_id = users::create(&state.db.pool, email, &password_hash, user_name)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("{email} is already registered")),
            other => other,
        })?;

    let user = users::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Created user vanished".to_string()))?;

    let token = create_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expires_in_secs,
    )?;

    tracing::info!("User {} signed up", user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = body.email.trim();
    validate::email(email)?;
    validate::password(&body.password)?;

    let user = users::find_by_email(&state.db.pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{email} not found")))?;

    if !verify_password(body.password.trim(), &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = create_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expires_in_secs,
    )?;

    activity::record(&state.db.pool, user.id, Activity::Login).await;

    Ok(Json(AuthResponse { token, user }))
}
