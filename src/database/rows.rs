// ABOUTME: Column decoding helpers for SQLite rows
// ABOUTME: UUIDs, RFC 3339 timestamps, JSON arrays, and unsigned integers stored as TEXT/INTEGER
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Fixed-width UTC timestamps so TEXT ordering matches time ordering
pub fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn text(row: &SqliteRow, column: &str) -> AppResult<String> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn opt_text(row: &SqliteRow, column: &str) -> AppResult<Option<String>> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn uuid(row: &SqliteRow, column: &str) -> AppResult<Uuid> {
    let raw = text(row, column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| AppError::database(format!("Invalid UUID in column {column}: {e}")))
}

pub fn timestamp(row: &SqliteRow, column: &str) -> AppResult<DateTime<Utc>> {
    parse_timestamp(&text(row, column)?, column)
}

pub fn opt_timestamp(row: &SqliteRow, column: &str) -> AppResult<Option<DateTime<Utc>>> {
    opt_text(row, column)?
        .map(|raw| parse_timestamp(&raw, column))
        .transpose()
}

fn parse_timestamp(raw: &str, column: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp in column {column}: {e}")))
}

pub fn int(row: &SqliteRow, column: &str) -> AppResult<i64> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn opt_int(row: &SqliteRow, column: &str) -> AppResult<Option<i64>> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn unsigned(row: &SqliteRow, column: &str) -> AppResult<u32> {
    let value = int(row, column)?;
    u32::try_from(value)
        .map_err(|_| AppError::database(format!("Column {column} out of range: {value}")))
}

pub fn opt_unsigned(row: &SqliteRow, column: &str) -> AppResult<Option<u32>> {
    opt_int(row, column)?
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| AppError::database(format!("Column {column} out of range: {value}")))
        })
        .transpose()
}

pub fn real(row: &SqliteRow, column: &str) -> AppResult<f64> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn opt_real(row: &SqliteRow, column: &str) -> AppResult<Option<f64>> {
    row.try_get(column)
        .map_err(|e| AppError::database(format!("Failed to read column {column}: {e}")))
}

pub fn json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> AppResult<T> {
    let raw = text(row, column)?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::database(format!("Invalid JSON in column {column}: {e}")))
}

pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::serialization(format!("Failed to encode column value: {e}")))
}
