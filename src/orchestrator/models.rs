//! Wire records exchanged with clients and backends.
//!
//! Backend records are decoded leniently (`#[serde(default)]`): a missing
//! field becomes empty rather than failing the whole composition. Client
//! request bodies are strict.

use serde::{Deserialize, Serialize};

/// A library branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Library {
    pub library_uid: String,
    pub name: String,
    pub city: String,
    pub address: String,
}

impl Library {
    /// Placeholder carrying only the identifier, used when the catalog is down.
    pub fn stub(library_uid: &str) -> Self {
        Self {
            library_uid: library_uid.to_string(),
            ..Self::default()
        }
    }
}

/// A book as listed in a library, including stock information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub book_uid: String,
    pub name: String,
    pub author: String,
    pub genre: String,
    pub condition: String,
    pub available_count: i64,
}

/// A book as shown inside a reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookInfo {
    pub book_uid: String,
    pub name: String,
    pub author: String,
    pub genre: String,
}

impl BookInfo {
    /// Placeholder carrying only the identifier, used when the catalog is down.
    pub fn stub(book_uid: &str) -> Self {
        Self {
            book_uid: book_uid.to_string(),
            ..Self::default()
        }
    }
}

/// A user's rating; also the number of books they may hold at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rating {
    pub stars: i64,
}

/// A reservation as stored by the booking service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reservation {
    pub reservation_uid: String,
    pub username: String,
    pub book_uid: String,
    pub library_uid: String,
    pub status: String,
    pub start_date: String,
    pub till_date: String,
}

/// Number of books a user currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationAmount {
    pub amount: i64,
}

/// A reservation enriched with its book and library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub reservation_uid: String,
    pub status: String,
    pub start_date: String,
    pub till_date: String,
    pub book: BookInfo,
    pub library: Library,
}

impl ReservationView {
    pub fn new(reservation: Reservation, book: BookInfo, library: Library) -> Self {
        Self {
            reservation_uid: reservation.reservation_uid,
            status: reservation.status,
            start_date: reservation.start_date,
            till_date: reservation.till_date,
            book,
            library,
        }
    }
}

/// Answer to a successful reservation: the enriched record plus the rating
/// that allowed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TakenBook {
    #[serde(flatten)]
    pub reservation: ReservationView,
    pub rating: Rating,
}

/// Client request to take a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservation {
    pub book_uid: String,
    pub library_uid: String,
    pub till_date: String,
}

/// Client request to return a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub condition: String,
    pub date: String,
}

/// What happened while returning a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnSummary {
    /// The booking service reported the return as overdue.
    pub late: bool,
    /// The catalog reported the book in worse condition than lent.
    pub condition_worsened: bool,
    /// Rating change requested from the reputation service.
    pub rating_delta: i64,
    /// Writes handed to the retry scheduler.
    pub deferred: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taken_book_serializes_flat_camel_case() {
        let reservation = Reservation {
            reservation_uid: "r1".into(),
            username: "alice".into(),
            book_uid: "b1".into(),
            library_uid: "l1".into(),
            status: "RENTED".into(),
            start_date: "2021-10-09".into(),
            till_date: "2021-10-11".into(),
        };
        let taken = TakenBook {
            reservation: ReservationView::new(reservation, BookInfo::stub("b1"), Library::stub("l1")),
            rating: Rating { stars: 75 },
        };

        let json = serde_json::to_value(&taken).unwrap();
        assert_eq!(json["reservationUid"], "r1");
        assert_eq!(json["tillDate"], "2021-10-11");
        assert_eq!(json["book"]["bookUid"], "b1");
        assert_eq!(json["book"]["name"], "");
        assert_eq!(json["library"]["libraryUid"], "l1");
        assert_eq!(json["rating"]["stars"], 75);
        assert!(json.get("username").is_none());
    }

    #[test]
    fn test_backend_records_tolerate_missing_fields() {
        let book: Book = serde_json::from_str(r#"{"bookUid": "b1", "availableCount": 2}"#).unwrap();
        assert_eq!(book.book_uid, "b1");
        assert_eq!(book.available_count, 2);
        assert!(book.author.is_empty());
    }

    #[test]
    fn test_client_request_is_strict() {
        let parsed = serde_json::from_str::<CreateReservation>(r#"{"bookUid": "b1"}"#);
        assert!(parsed.is_err());
    }
}
