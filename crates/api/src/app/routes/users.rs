use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::{JsonRejection, PathRejection}},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};

use bookshelf_core::{NewUser, UserChanges, UserId, user::normalize_email};
use bookshelf_infra::StoreError;

use crate::app::dto;
use crate::app::errors::{ApiError, parse_error};
use crate::app::routes::common::{guarded, path_id};
use crate::app::services::AppServices;
use crate::authz::authorize_user_access;
use crate::context::PrincipalContext;
use crate::middleware::AuthState;

const LOGIN_MISMATCH: &str = "email or password does not match";

pub fn router(auth: Option<&AuthState>) -> Router {
    Router::new()
        .route("/", guarded(auth, get(list_users)).merge(post(create_user)))
        .route("/login", post(login))
        .route(
            "/:id",
            guarded(auth, get(get_user).put(update_user).delete(delete_user)),
        )
}

fn principal_of(principal: &Option<Extension<PrincipalContext>>) -> Option<&PrincipalContext> {
    principal.as_ref().map(|Extension(p)| p)
}

fn lookup_error(err: StoreError, not_found: &'static str) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found(not_found),
        other => ApiError::internal("failed to load user").with_detail(other),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Value>, ApiError> {
    let users = services
        .users
        .list()
        .await
        .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    Ok(Json(json!({
        "message": "success get all users",
        "users": users,
    })))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: UserId = path_id(path, "Invalid Id")?;
    authorize_user_access(principal_of(&principal), id)?;

    let user = services
        .users
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "user not found"))?;

    Ok(Json(json!({
        "message": "success get user",
        "user": user,
    })))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(parse_error)?;

    if body.password.is_empty() {
        return Err(ApiError::bad_request("bad request").with_detail("password must not be empty"));
    }

    let new = NewUser {
        name: body.name,
        email: body.email,
        password_hash: String::new(),
    }
    .validate()
    .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    let password_hash = services.hash_password(body.password).await?;
    let user = services
        .users
        .create(NewUser { password_hash, ..new })
        .await
        .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(json!({
        "message": "success create new user, please login to get token",
        "user": user,
    })))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(parse_error)?;

    let email = normalize_email(&body.email).map_err(|_| ApiError::unauthorized(LOGIN_MISMATCH))?;
    let user = match services.users.find_by_email(&email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::unauthorized(LOGIN_MISMATCH)),
        Err(e) => return Err(ApiError::internal("failed to load user").with_detail(e)),
    };

    if !services
        .verify_password(body.password, user.password_hash.clone())
        .await?
    {
        return Err(ApiError::unauthorized(LOGIN_MISMATCH));
    }

    let token = services.issue_token(user.id)?;

    Ok(Json(json!({
        "message": "Success Login",
        "user_id": user.id,
        "token": token,
    })))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: UserId = path_id(path, "Invalid Id")?;
    authorize_user_access(principal_of(&principal), id)?;

    services
        .users
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "User Not Found"))?;

    services
        .users
        .delete(id)
        .await
        .map_err(|e| ApiError::bad_request("error delete user").with_detail(e))?;

    tracing::info!(user_id = %id, "user deleted");

    Ok(Json(json!({ "message": "success delete data" })))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: UserId = path_id(path, "Invalid Id")?;
    authorize_user_access(principal_of(&principal), id)?;

    let mut user = services
        .users
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "User Not Found"))?;

    let Json(body) = body.map_err(parse_error)?;

    let password_hash = match body.password {
        Some(password) if password.is_empty() => {
            return Err(ApiError::bad_request("Failed to update user")
                .with_detail("password must not be empty"));
        }
        Some(password) => Some(services.hash_password(password).await?),
        None => None,
    };

    user.apply(
        UserChanges {
            name: body.name,
            email: body.email,
            password_hash,
        },
        Utc::now(),
    )
    .map_err(|e| ApiError::bad_request("Failed to update user").with_detail(e))?;

    let user = services.users.save(&user).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("User Not Found"),
        other => ApiError::bad_request("Failed to update user").with_detail(other),
    })?;

    Ok(Json(json!({
        "message": "Success Update data",
        "user": user,
    })))
}
