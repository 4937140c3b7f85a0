//! SQL implementation of the booking store
//!
//! Dates, times and timestamps are stored as ISO-8601 TEXT and flags as
//! INTEGER so the same statements run through the `Any` driver on SQLite
//! and PostgreSQL. Both accept `$n` placeholders and `ON CONFLICT` upserts.

use crate::error::{is_unique_violation, DbError};
use crate::repositories::{ReservationLedger, SlotRepository, UserRepository};
use crate::DbClient;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use hms_common::models::{ReminderLead, Reservation, ReservedSlot, Role, Slot, UserProfile};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        role TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS slots (
        id TEXT PRIMARY KEY,
        provider_id TEXT NOT NULL,
        date TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        booked INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        UNIQUE(provider_id, date, start_time, end_time)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id TEXT PRIMARY KEY,
        consumer_id TEXT NOT NULL UNIQUE,
        provider_id TEXT NOT NULL,
        slot_id TEXT NOT NULL UNIQUE REFERENCES slots(id),
        created_at TEXT NOT NULL,
        reminder_sent_24h INTEGER NOT NULL DEFAULT 0,
        reminder_sent_1h INTEGER NOT NULL DEFAULT 0
    )
    "#,
];

const SLOT_COLUMNS: &str = "id, provider_id, date, start_time, end_time, booked, created_at";

const RESERVATION_COLUMNS: &str =
    "id, consumer_id, provider_id, slot_id, created_at, reminder_sent_24h, reminder_sent_1h";

// Reservation columns keep their names, slot columns are prefixed with `s_`.
const RESERVED_SLOT_SELECT: &str = r#"
    SELECT r.id AS id, r.consumer_id AS consumer_id, r.provider_id AS provider_id,
           r.slot_id AS slot_id, r.created_at AS created_at,
           r.reminder_sent_24h AS reminder_sent_24h, r.reminder_sent_1h AS reminder_sent_1h,
           s.id AS s_id, s.provider_id AS s_provider_id, s.date AS s_date,
           s.start_time AS s_start_time, s.end_time AS s_end_time,
           s.booked AS s_booked, s.created_at AS s_created_at
    FROM reservations r
    JOIN slots s ON s.id = r.slot_id
"#;

/// SQL implementation of the booking store
#[derive(Debug, Clone)]
pub struct SqlBookingStore {
    db_client: DbClient,
}

impl SqlBookingStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }
}

fn query_error(action: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |e| {
        error!("Failed to {}: {}", action, e);
        DbError::QueryError(e.to_string())
    }
}

fn text(row: &AnyRow, column: &str) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| DbError::QueryError(format!("column {}: {}", column, e)))
}

fn flag(row: &AnyRow, column: &str) -> Result<bool, DbError> {
    row.try_get::<i64, _>(column)
        .map(|v| v != 0)
        .map_err(|e| DbError::QueryError(format!("column {}: {}", column, e)))
}

fn uuid(row: &AnyRow, column: &str) -> Result<Uuid, DbError> {
    let raw = text(row, column)?;
    Uuid::parse_str(&raw)
        .map_err(|e| DbError::QueryError(format!("column {} is not a uuid: {}", column, e)))
}

fn date(row: &AnyRow, column: &str) -> Result<NaiveDate, DbError> {
    let raw = text(row, column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| DbError::QueryError(format!("column {} is not a date: {}", column, e)))
}

fn time(row: &AnyRow, column: &str) -> Result<NaiveTime, DbError> {
    let raw = text(row, column)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT)
        .map_err(|e| DbError::QueryError(format!("column {} is not a time: {}", column, e)))
}

fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, DbError> {
    let raw = text(row, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::QueryError(format!("column {} is not a timestamp: {}", column, e)))
}

fn slot_from_row(row: &AnyRow, prefix: &str) -> Result<Slot, DbError> {
    let col = |name: &str| format!("{}{}", prefix, name);
    Ok(Slot {
        id: uuid(row, &col("id"))?,
        provider_id: uuid(row, &col("provider_id"))?,
        date: date(row, &col("date"))?,
        start_time: time(row, &col("start_time"))?,
        end_time: time(row, &col("end_time"))?,
        booked: flag(row, &col("booked"))?,
        created_at: timestamp(row, &col("created_at"))?,
    })
}

fn reservation_from_row(row: &AnyRow) -> Result<Reservation, DbError> {
    Ok(Reservation {
        id: uuid(row, "id")?,
        consumer_id: uuid(row, "consumer_id")?,
        provider_id: uuid(row, "provider_id")?,
        slot_id: uuid(row, "slot_id")?,
        created_at: timestamp(row, "created_at")?,
        reminder_sent_24h: flag(row, "reminder_sent_24h")?,
        reminder_sent_1h: flag(row, "reminder_sent_1h")?,
    })
}

fn reserved_slot_from_row(row: &AnyRow) -> Result<ReservedSlot, DbError> {
    Ok(ReservedSlot {
        reservation: reservation_from_row(row)?,
        slot: slot_from_row(row, "s_")?,
    })
}

fn user_from_row(row: &AnyRow) -> Result<UserProfile, DbError> {
    let role = text(row, "role")?;
    Ok(UserProfile {
        id: uuid(row, "id")?,
        full_name: text(row, "full_name")?,
        email: text(row, "email")?,
        role: role.parse::<Role>().map_err(DbError::QueryError)?,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

// Fixed width so that ORDER BY on the TEXT column is chronological.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SlotRepository for SqlBookingStore {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");
        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }
        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn create_slot(&self, slot: Slot) -> Result<Slot, DbError> {
        debug!("Creating slot for provider: {}", slot.provider_id);

        let query = r#"
            INSERT INTO slots (id, provider_id, date, start_time, end_time, booked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        let result = sqlx::query(query)
            .bind(slot.id.to_string())
            .bind(slot.provider_id.to_string())
            .bind(format_date(slot.date))
            .bind(format_time(slot.start_time))
            .bind(format_time(slot.end_time))
            .bind(i64::from(slot.booked))
            .bind(format_timestamp(slot.created_at))
            .execute(self.db_client.pool())
            .await;

        match result {
            Ok(_) => Ok(slot),
            Err(e) if is_unique_violation(&e) => Err(DbError::Conflict(format!(
                "slot {} {}-{} already exists for provider {}",
                slot.date, slot.start_time, slot.end_time, slot.provider_id
            ))),
            Err(e) => Err(query_error("insert slot")(e)),
        }
    }

    async fn get_slot(&self, slot_id: Uuid) -> Result<Option<Slot>, DbError> {
        let query = format!("SELECT {} FROM slots WHERE id = $1", SLOT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(slot_id.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_error("find slot"))?;

        row.map(|row| slot_from_row(&row, "")).transpose()
    }

    async fn delete_unbooked_slot(&self, slot_id: Uuid) -> Result<bool, DbError> {
        debug!("Deleting slot: {}", slot_id);

        let result = sqlx::query("DELETE FROM slots WHERE id = $1 AND booked = 0")
            .bind(slot_id.to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(query_error("delete slot"))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        match self.get_slot(slot_id).await? {
            Some(_) => Err(DbError::Conflict(format!("slot {} is booked", slot_id))),
            None => Ok(false),
        }
    }

    async fn list_open_slots(
        &self,
        provider_id: Option<Uuid>,
        from_date: NaiveDate,
    ) -> Result<Vec<Slot>, DbError> {
        let provider_filter = if provider_id.is_some() {
            " AND provider_id = $2"
        } else {
            ""
        };
        let query = format!(
            "SELECT {} FROM slots WHERE booked = 0 AND date >= $1{} ORDER BY date, start_time",
            SLOT_COLUMNS, provider_filter
        );

        let mut statement = sqlx::query(&query).bind(format_date(from_date));
        if let Some(provider_id) = provider_id {
            statement = statement.bind(provider_id.to_string());
        }

        let rows = statement
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_error("list open slots"))?;

        rows.iter().map(|row| slot_from_row(row, "")).collect()
    }

    async fn list_provider_slots(&self, provider_id: Uuid) -> Result<Vec<Slot>, DbError> {
        let query = format!(
            "SELECT {} FROM slots WHERE provider_id = $1 ORDER BY date, start_time",
            SLOT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(provider_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_error("list provider slots"))?;

        rows.iter().map(|row| slot_from_row(row, "")).collect()
    }
}

impl ReservationLedger for SqlBookingStore {
    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Option<Reservation>, DbError> {
        let query = format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(reservation_id.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_error("find reservation"))?;

        row.map(|row| reservation_from_row(&row)).transpose()
    }

    async fn active_reservation_for_consumer(
        &self,
        consumer_id: Uuid,
    ) -> Result<Option<Reservation>, DbError> {
        let query = format!(
            "SELECT {} FROM reservations WHERE consumer_id = $1",
            RESERVATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(consumer_id.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_error("find consumer reservation"))?;

        row.map(|row| reservation_from_row(&row)).transpose()
    }

    async fn reservations_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        let query = format!(
            "{} WHERE r.provider_id = $1 ORDER BY r.created_at DESC",
            RESERVED_SLOT_SELECT
        );

        let rows = sqlx::query(&query)
            .bind(provider_id.to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_error("list provider reservations"))?;

        rows.iter().map(reserved_slot_from_row).collect()
    }

    async fn reservations_between(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<ReservedSlot>, DbError> {
        let query = format!(
            "{} WHERE s.date >= $1 AND s.date <= $2 ORDER BY s.date, s.start_time",
            RESERVED_SLOT_SELECT
        );

        let rows = sqlx::query(&query)
            .bind(format_date(from_date))
            .bind(format_date(to_date))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(query_error("list reservations by date"))?;

        rows.iter().map(reserved_slot_from_row).collect()
    }

    async fn set_reminder_sent(
        &self,
        reservation_id: Uuid,
        lead: ReminderLead,
    ) -> Result<bool, DbError> {
        let query = match lead {
            ReminderLead::DayBefore => "UPDATE reservations SET reminder_sent_24h = 1 WHERE id = $1",
            ReminderLead::HourBefore => "UPDATE reservations SET reminder_sent_1h = 1 WHERE id = $1",
        };

        let result = sqlx::query(query)
            .bind(reservation_id.to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(query_error("set reminder flag"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        debug!(
            "Committing reservation {} for slot {}",
            reservation.id, reservation.slot_id
        );
        let mut tx = self.db_client.begin().await?;

        let updated = sqlx::query("UPDATE slots SET booked = 1 WHERE id = $1 AND booked = 0")
            .bind(reservation.slot_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error("mark slot booked"))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return match self.get_slot(reservation.slot_id).await? {
                Some(_) => Err(DbError::Conflict(format!(
                    "slot {} is already booked",
                    reservation.slot_id
                ))),
                None => Err(DbError::NotFound(format!("slot {}", reservation.slot_id))),
            };
        }

        let query = format!(
            "INSERT INTO reservations ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            RESERVATION_COLUMNS
        );
        let inserted = sqlx::query(&query)
            .bind(reservation.id.to_string())
            .bind(reservation.consumer_id.to_string())
            .bind(reservation.provider_id.to_string())
            .bind(reservation.slot_id.to_string())
            .bind(format_timestamp(reservation.created_at))
            .bind(i64::from(reservation.reminder_sent_24h))
            .bind(i64::from(reservation.reminder_sent_1h))
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Err(if is_unique_violation(&e) {
                DbError::Conflict(format!(
                    "consumer {} already holds a reservation",
                    reservation.consumer_id
                ))
            } else {
                query_error("insert reservation")(e)
            });
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        info!("Reservation {} committed", reservation.id);
        Ok(())
    }

    async fn release_reservation(&self, reservation: &Reservation) -> Result<(), DbError> {
        debug!(
            "Releasing reservation {} for slot {}",
            reservation.id, reservation.slot_id
        );
        let mut tx = self.db_client.begin().await?;

        let deleted = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(reservation.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error("delete reservation"))?;

        if deleted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Err(DbError::NotFound(format!("reservation {}", reservation.id)));
        }

        let updated = sqlx::query("UPDATE slots SET booked = 0 WHERE id = $1 AND booked = 1")
            .bind(reservation.slot_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(query_error("mark slot unbooked"))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Err(DbError::Conflict(format!(
                "slot {} is not booked",
                reservation.slot_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        info!("Reservation {} released", reservation.id);
        Ok(())
    }
}

impl UserRepository for SqlBookingStore {
    async fn upsert_user(&self, profile: UserProfile) -> Result<UserProfile, DbError> {
        debug!("Storing user: {}", profile.id);

        let query = r#"
            INSERT INTO users (id, full_name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET full_name = excluded.full_name, email = excluded.email, role = excluded.role
        "#;

        sqlx::query(query)
            .bind(profile.id.to_string())
            .bind(profile.full_name.clone())
            .bind(profile.email.clone())
            .bind(profile.role.as_str())
            .execute(self.db_client.pool())
            .await
            .map_err(query_error("store user"))?;

        Ok(profile)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, DbError> {
        let row = sqlx::query("SELECT id, full_name, email, role FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(query_error("find user"))?;

        row.map(|row| user_from_row(&row)).transpose()
    }
}
