pub mod migrations;
pub mod queries;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::Connection;

use crate::models::{Booking, Doctor, PatientInfo, Slot};
use crate::services::directory::{BookingStore, DoctorDirectory, DoctorQuery};

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

fn lock(conn: &Arc<Mutex<Connection>>) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| anyhow::anyhow!("database lock poisoned"))
}

/// Directory reads backed by the sqlite doctors and bookings tables.
#[derive(Clone)]
pub struct SqliteDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDirectory {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DoctorDirectory for SqliteDirectory {
    async fn list_doctors(&self, query: &DoctorQuery) -> anyhow::Result<Vec<Doctor>> {
        let conn = lock(&self.conn)?;
        queries::list_doctors(&conn, query)
    }

    async fn get_doctor_by_id(&self, id: &str) -> anyhow::Result<Option<Doctor>> {
        let conn = lock(&self.conn)?;
        queries::get_doctor_by_id(&conn, id)
    }

    async fn get_availability(
        &self,
        id: &str,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
        let conn = lock(&self.conn)?;
        queries::open_availability(&conn, id, from_date, to_date)
    }

    async fn get_available_slots(&self, id: &str, date: &str) -> anyhow::Result<Vec<Slot>> {
        let conn = lock(&self.conn)?;
        queries::open_slots(&conn, id, date)
    }
}

/// Booking writes backed by sqlite. The single-writer guarantee comes from
/// the transaction in [`queries::create_booking_if_free`].
#[derive(Clone)]
pub struct SqliteBookingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn book_slot(
        &self,
        doctor_id: &str,
        date: &str,
        time: &str,
        patient: &PatientInfo,
    ) -> anyhow::Result<Option<Booking>> {
        let mut conn = lock(&self.conn)?;
        queries::create_booking_if_free(&mut conn, doctor_id, date, time, patient)
    }
}
