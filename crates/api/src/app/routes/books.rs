use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::{JsonRejection, PathRejection}},
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};

use bookshelf_core::{BookChanges, BookId, NewBook};
use bookshelf_infra::StoreError;

use crate::app::dto;
use crate::app::errors::{ApiError, parse_error};
use crate::app::routes::common::{guarded, path_id};
use crate::app::services::AppServices;
use crate::middleware::AuthState;

pub fn router(auth: Option<&AuthState>) -> Router {
    Router::new()
        .route("/", guarded(auth, get(list_books).post(create_book)))
        .route(
            "/:id",
            guarded(auth, get(get_book).put(update_book).delete(delete_book)),
        )
}

fn lookup_error(err: StoreError, not_found: &'static str) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::not_found(not_found),
        other => ApiError::internal("failed to load book").with_detail(other),
    }
}

pub async fn list_books(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Value>, ApiError> {
    let books = services
        .books
        .list()
        .await
        .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    Ok(Json(json!({
        "message": "success get all books",
        "books": books,
    })))
}

pub async fn get_book(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: BookId = path_id(path, "invalid id")?;

    let book = services
        .books
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "book not found"))?;

    Ok(Json(json!({
        "message": "success get book",
        "book": book,
    })))
}

pub async fn create_book(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateBookRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(parse_error)?;

    let new = NewBook::from(body)
        .validate()
        .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    let book = services
        .books
        .create(new)
        .await
        .map_err(|e| ApiError::bad_request("bad request").with_detail(e))?;

    tracing::info!(book_id = %book.id, "book created");

    Ok(Json(json!({
        "message": "success create new book",
        "book": book,
    })))
}

pub async fn delete_book(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: BookId = path_id(path, "Invalid Id")?;

    services
        .books
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "book Not Found"))?;

    services
        .books
        .delete(id)
        .await
        .map_err(|e| ApiError::bad_request("error delete book").with_detail(e))?;

    tracing::info!(book_id = %id, "book deleted");

    Ok(Json(json!({ "message": "success delete data" })))
}

pub async fn update_book(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::UpdateBookRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id: BookId = path_id(path, "Invalid Id")?;

    let mut book = services
        .books
        .get(id)
        .await
        .map_err(|e| lookup_error(e, "book Not Found"))?;

    let Json(body) = body.map_err(parse_error)?;

    book.apply(BookChanges::from(body), Utc::now())
        .map_err(|e| ApiError::bad_request("Failed to update book").with_detail(e))?;

    let book = services.books.save(&book).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::not_found("book Not Found"),
        other => ApiError::bad_request("Failed to update book").with_detail(other),
    })?;

    Ok(Json(json!({
        "message": "Success Update data",
        "book": book,
    })))
}
