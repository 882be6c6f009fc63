//! Route handlers.
//!
//! Handlers only translate between HTTP and the [`Orchestrator`]: parse the
//! query or body, call one use case, and serialize its result.
//!
//! [`Orchestrator`]: crate::orchestrator::Orchestrator

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{BoxError, Json};
use serde::Deserialize;

use crate::http::request::CallerIdentity;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::orchestrator::models::{
    Book, CreateReservation, Library, Rating, ReservationView, ReturnBook, TakenBook,
};
use crate::orchestrator::{GatewayError, Page, PageRequest};

#[derive(Debug, Deserialize)]
pub struct LibrariesQuery {
    pub city: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BooksQuery {
    #[serde(rename = "showAll")]
    pub show_all: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// `GET /api/v1/libraries?city=&page=&size=`
pub async fn list_libraries(
    State(state): State<AppState>,
    query: Result<Query<LibrariesQuery>, QueryRejection>,
) -> Result<Json<Page<Library>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::invalid(e.body_text()))?;
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or_else(|| ApiError::invalid("city must be given"))?;
    let page = PageRequest::parse(query.page.as_deref(), query.size.as_deref(), &state.pagination)?;

    Ok(Json(state.orchestrator.list_libraries(city, page).await?))
}

/// `GET /api/v1/libraries/{libraryUid}/books?showAll=&page=&size=`
pub async fn list_books(
    State(state): State<AppState>,
    Path(library_uid): Path<String>,
    query: Result<Query<BooksQuery>, QueryRejection>,
) -> Result<Json<Page<Book>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::invalid(e.body_text()))?;
    let page = PageRequest::parse(query.page.as_deref(), query.size.as_deref(), &state.pagination)?;

    let books = state
        .orchestrator
        .list_books(&library_uid, query.show_all.as_deref(), page)
        .await?;
    Ok(Json(books))
}

/// `GET /api/v1/rating`
pub async fn rating(State(state): State<AppState>, caller: CallerIdentity) -> Result<Json<Rating>, ApiError> {
    Ok(Json(state.orchestrator.rating(caller.as_str()).await?))
}

/// `GET /api/v1/reservations`
pub async fn reservations(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<ReservationView>>, ApiError> {
    Ok(Json(state.orchestrator.reservations(caller.as_str()).await?))
}

/// `POST /api/v1/reservations`
pub async fn take_book(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateReservation>, JsonRejection>,
) -> Result<Json<TakenBook>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid(e.body_text()))?;
    Ok(Json(state.orchestrator.take_book(caller.as_str(), request).await?))
}

/// `POST /api/v1/reservations/{reservationUid}/return`
pub async fn return_book(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(reservation_uid): Path<String>,
    body: Result<Json<ReturnBook>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid(e.body_text()))?;
    state
        .orchestrator
        .return_book(caller.as_str(), &reservation_uid, request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Liveness probe.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Turn errors raised by middleware into the standard error body.
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError(GatewayError::RequestTimeout)
    } else {
        ApiError(GatewayError::Internal(err.to_string()))
    }
}
