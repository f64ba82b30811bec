//! Book model and related types.
//!
//! Three shapes exist for a book: the inbound payloads (`CreateBook`,
//! `UpdateBook`), the validated domain values handed to the store
//! (`NewBook`, `BookChanges`), and the stored row (`BookRecord`) which is
//! mapped to the outbound `Book`. Every conversion between them is written
//! out by hand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 100;

/// Wire format of `published_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Book as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    /// Unique identifier, assigned on creation
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "The Great Gatsby")]
    pub title: String,
    #[schema(example = "F. Scott Fitzgerald")]
    pub author: String,
    /// Publication date (YYYY-MM-DD)
    #[schema(value_type = String, format = Date, example = "1925-04-10")]
    pub published_date: NaiveDate,
    #[schema(example = 180)]
    pub number_of_pages: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `books` table.
///
/// Timestamps are stored as microseconds since the Unix epoch so the store
/// can order and bump them in SQL.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub number_of_pages: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<BookRecord> for Book {
    type Error = AppError;

    fn try_from(record: BookRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id,
            title: record.title,
            author: record.author,
            published_date: record.published_date,
            number_of_pages: record.number_of_pages,
            created_at: timestamp_from_micros(record.created_at)?,
            updated_at: timestamp_from_micros(record.updated_at)?,
        })
    }
}

fn timestamp_from_micros(micros: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| AppError::Internal(format!("Stored timestamp {} is out of range", micros)))
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    /// Title of the book (1-200 characters)
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    #[schema(example = "1984")]
    pub title: String,
    /// Author of the book (1-100 characters)
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    #[schema(example = "George Orwell")]
    pub author: String,
    /// Publication date in YYYY-MM-DD format
    #[validate(custom(function = "validate_published_date"))]
    #[schema(example = "1949-06-08")]
    pub published_date: String,
    /// Number of pages (must be positive)
    #[validate(range(min = 1, message = "must be greater than 0"))]
    #[schema(example = 328)]
    pub number_of_pages: i64,
}

/// Validated values for a new row; timestamps and id are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    pub number_of_pages: i64,
}

impl CreateBook {
    /// Validate every field and produce the values to insert
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate()?;
        let published_date = parse_date(&self.published_date)?;
        Ok(NewBook {
            title: self.title,
            author: self.author,
            published_date,
            number_of_pages: self.number_of_pages,
        })
    }
}

/// A field of a partial update.
///
/// `Absent` means the key was not sent, `Null` means it was sent as JSON
/// `null`. Fields must be tagged `#[serde(default)]` for `Absent` to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// Update book request; only the fields present are changed
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "The Great Gatsby - Updated Edition")]
    pub title: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub author: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1925-04-10")]
    pub published_date: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<i64>, example = 200)]
    pub number_of_pages: Patch<i64>,
}

impl Validate for UpdateBook {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mut check = |field: &'static str, result: Result<(), ValidationError>| {
            if let Err(e) = result {
                errors.add(field, e);
            }
        };

        check("title", patch_field(&self.title, |v| validate_text(v, TITLE_MAX_CHARS)));
        check("author", patch_field(&self.author, |v| validate_text(v, AUTHOR_MAX_CHARS)));
        check(
            "published_date",
            patch_field(&self.published_date, |v| validate_published_date(v)),
        );
        check(
            "number_of_pages",
            patch_field(&self.number_of_pages, |v| validate_page_count(*v)),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Validated subset of columns to change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub number_of_pages: Option<i64>,
}

impl UpdateBook {
    /// Validate the present fields and produce the changes to apply
    pub fn into_changes(self) -> AppResult<BookChanges> {
        self.validate()?;
        let published_date = match self.published_date {
            Patch::Value(ref raw) => Some(parse_date(raw)?),
            _ => None,
        };
        Ok(BookChanges {
            title: into_option(self.title),
            author: into_option(self.author),
            published_date,
            number_of_pages: into_option(self.number_of_pages),
        })
    }
}

fn into_option<T>(patch: Patch<T>) -> Option<T> {
    match patch {
        Patch::Value(v) => Some(v),
        Patch::Absent | Patch::Null => None,
    }
}

fn patch_field<T>(
    patch: &Patch<T>,
    rule: impl FnOnce(&T) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    match patch {
        Patch::Absent => Ok(()),
        Patch::Null => Err(violation("null", "may not be null")),
        Patch::Value(v) => rule(v),
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_text(value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::Owned(format!("must be between 1 and {} characters", max)));
        return Err(error);
    }
    Ok(())
}

fn validate_page_count(value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(violation("range", "must be greater than 0"));
    }
    Ok(())
}

fn validate_published_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| violation("date", "must be a valid date in YYYY-MM-DD format"))
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.add(
            "published_date",
            violation("date", "must be a valid date in YYYY-MM-DD format"),
        );
        errors.into()
    })
}
