//! Reservation use cases: list, take a book, return a book.

use axum::http::StatusCode;
use futures_util::future::join_all;
use serde_json::json;

use crate::orchestrator::jobs::{AvailabilityChange, DeferredWrite};
use crate::orchestrator::models::{
    BookInfo, CreateReservation, Library, Rating, Reservation, ReservationAmount, ReservationView,
    ReturnBook, ReturnSummary, TakenBook,
};
use crate::orchestrator::policy::{run_detached, WriteOutcome};
use crate::orchestrator::{GatewayError, Orchestrator};
use crate::upstream::OutboundRequest;

/// Rating change per penalty (late return, worsened condition).
const PENALTY_STARS: i64 = -10;
/// Rating change for a clean return.
const CLEAN_RETURN_STARS: i64 = 1;

impl Orchestrator {
    /// The caller's reservations, each enriched with book and library.
    pub async fn reservations(&self, username: &str) -> Result<Vec<ReservationView>, GatewayError> {
        let reservations: Vec<Reservation> = self
            .booking
            .fetch(OutboundRequest::get(&["api", "v1", "reservations", ""]).caller(username))
            .await?;

        let views = join_all(reservations.into_iter().map(|r| self.compose(r))).await;
        Ok(views)
    }

    /// Take a book if the caller's rating allows another loan.
    pub async fn take_book(&self, username: &str, request: CreateReservation) -> Result<TakenBook, GatewayError> {
        let (amount, rating) = tokio::try_join!(
            self.booking.fetch::<ReservationAmount>(
                OutboundRequest::get(&["api", "v1", "reservations", "amount"]).caller(username)
            ),
            self.reputation
                .fetch::<Rating>(OutboundRequest::get(&["api", "v1", "rating", ""]).caller(username)),
        )?;

        if amount.amount >= rating.stars {
            tracing::info!(
                username = %username,
                outstanding = amount.amount,
                limit = rating.stars,
                "Reservation rejected, loan limit reached"
            );
            return Err(GatewayError::PreconditionFailed {
                outstanding: amount.amount,
                limit: rating.stars,
            });
        }

        let reservation: Reservation = self
            .booking
            .fetch(
                OutboundRequest::post(&["api", "v1", "reservations"])
                    .caller(username)
                    .json(json!({
                        "bookUid": request.book_uid,
                        "libraryUid": request.library_uid,
                        "tillDate": request.till_date,
                    })),
            )
            .await?;

        tracing::info!(
            username = %username,
            reservation_uid = %reservation.reservation_uid,
            book_uid = %reservation.book_uid,
            "Reservation created"
        );

        let this = self.clone();
        let decrement = DeferredWrite::AdjustAvailability {
            book_uid: reservation.book_uid.clone(),
            change: AvailabilityChange::Decrement,
        };
        run_detached(async move { this.write_or_defer(&this.catalog, decrement).await }).await?;

        Ok(TakenBook {
            reservation: self.compose(reservation).await,
            rating,
        })
    }

    /// Return a book and settle its side effects.
    ///
    /// Fails only if the reservation cannot be read or its status cannot be
    /// updated. Condition, availability and rating writes are deferred when
    /// their backend is unreachable, and run to completion even if the
    /// client goes away after the status update.
    pub async fn return_book(
        &self,
        username: &str,
        reservation_uid: &str,
        request: ReturnBook,
    ) -> Result<ReturnSummary, GatewayError> {
        let reservation: Reservation = self
            .booking
            .fetch(
                OutboundRequest::get(&["api", "v1", "reservations", "info", reservation_uid])
                    .caller(username),
            )
            .await?;

        let status = self
            .booking
            .send(
                OutboundRequest::put(&["api", "v1", "reservations", reservation_uid])
                    .caller(username)
                    .json(json!({ "condition": request.condition, "date": request.date })),
            )
            .await?;
        // the booking service answers 204 when the return is past the due date
        let late = status.status == StatusCode::NO_CONTENT;

        let summary = run_detached(self.clone().settle_return(
            username.to_string(),
            reservation.book_uid,
            request,
            late,
        ))
        .await?;
        tracing::info!(
            username = %username,
            reservation_uid = %reservation_uid,
            late = summary.late,
            condition_worsened = summary.condition_worsened,
            rating_delta = summary.rating_delta,
            deferred = summary.deferred,
            "Book returned"
        );
        Ok(summary)
    }

    /// Condition, availability and rating writes that follow a recorded return.
    async fn settle_return(self, username: String, book_uid: String, request: ReturnBook, late: bool) -> ReturnSummary {
        let condition = self
            .write_or_defer(
                &self.catalog,
                DeferredWrite::UpdateCondition {
                    book_uid: book_uid.clone(),
                    condition: request.condition,
                    date: request.date,
                },
            )
            .await;
        // 201 means the stored condition got worse
        let condition_worsened =
            matches!(&condition, WriteOutcome::Applied(r) if r.status == StatusCode::CREATED);

        let availability = self
            .write_or_defer(
                &self.catalog,
                DeferredWrite::AdjustAvailability {
                    book_uid,
                    change: AvailabilityChange::Increment,
                },
            )
            .await;

        let penalties = i64::from(late) + i64::from(condition_worsened);
        let rating_delta = if penalties > 0 {
            PENALTY_STARS * penalties
        } else {
            CLEAN_RETURN_STARS
        };
        let rating = self
            .write_or_defer(
                &self.reputation,
                DeferredWrite::AdjustRating {
                    username,
                    stars: rating_delta,
                },
            )
            .await;

        ReturnSummary {
            late,
            condition_worsened,
            rating_delta,
            deferred: [&condition, &availability, &rating]
                .iter()
                .filter(|outcome| matches!(outcome, WriteOutcome::Deferred))
                .count(),
        }
    }

    async fn compose(&self, reservation: Reservation) -> ReservationView {
        let (book, library) = tokio::join!(
            self.catalog
                .fetch::<BookInfo>(OutboundRequest::get(&["api", "v1", "books", reservation.book_uid.as_str(), ""])),
            self.catalog.fetch::<Library>(OutboundRequest::get(&[
                "api",
                "v1",
                "libraries",
                reservation.library_uid.as_str(),
                "",
            ])),
        );

        let book = self.enrich(book, || BookInfo::stub(&reservation.book_uid));
        let library = self.enrich(library, || Library::stub(&reservation.library_uid));
        ReservationView::new(reservation, book, library)
    }
}
