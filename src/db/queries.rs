use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Doctor, PatientInfo, Slot};
use crate::services::directory::DoctorQuery;

// ── Doctors ──

/// Doctors matching the query, availability already reduced to open slots.
/// Ordering is by id so offer lists are stable across turns.
pub fn list_doctors(conn: &Connection, query: &DoctorQuery) -> anyhow::Result<Vec<Doctor>> {
    let mut sql = String::from(
        "SELECT id, name, specialty, city, clinic, modality, availability FROM doctors WHERE 1=1",
    );
    let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(specialty) = &query.specialty {
        args.push(Box::new(specialty.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(specialty) = ?{}", args.len()));
    }
    if let Some(location) = &query.location {
        args.push(Box::new(location.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(city) = ?{}", args.len()));
    }
    if let Some(modality) = &query.modality {
        args.push(Box::new(modality.to_lowercase()));
        sql.push_str(&format!(" AND LOWER(modality) = ?{}", args.len()));
    }
    args.push(Box::new(query.limit.max(1) as i64));
    sql.push_str(&format!(" ORDER BY id ASC LIMIT ?{}", args.len()));

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn rusqlite::types::ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt.query_map(arg_refs.as_slice(), |row| Ok(parse_doctor_row(row)))?;

    let mut doctors = vec![];
    for row in rows {
        let mut doctor = row??;
        subtract_booked(conn, &mut doctor)?;
        doctors.push(doctor);
    }
    Ok(doctors)
}

pub fn get_doctor_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Doctor>> {
    let result = conn.query_row(
        "SELECT id, name, specialty, city, clinic, modality, availability FROM doctors WHERE id = ?1",
        params![id],
        |row| Ok(parse_doctor_row(row)),
    );

    match result {
        Ok(doctor) => {
            let mut doctor = doctor?;
            subtract_booked(conn, &mut doctor)?;
            Ok(Some(doctor))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Open availability for one doctor as date -> ascending times, optionally
/// clamped to an inclusive ISO date range. Fully booked dates drop out.
pub fn open_availability(
    conn: &Connection,
    doctor_id: &str,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
    let Some(doctor) = get_doctor_by_id(conn, doctor_id)? else {
        return Ok(BTreeMap::new());
    };

    Ok(doctor
        .availability
        .into_iter()
        .filter(|(date, times)| {
            !times.is_empty()
                && from_date.map(|from| date.as_str() >= from).unwrap_or(true)
                && to_date.map(|to| date.as_str() <= to).unwrap_or(true)
        })
        .collect())
}

pub fn open_slots(conn: &Connection, doctor_id: &str, date: &str) -> anyhow::Result<Vec<Slot>> {
    let Some(doctor) = get_doctor_by_id(conn, doctor_id)? else {
        return Ok(vec![]);
    };

    Ok(doctor
        .availability
        .get(date)
        .map(|times| {
            times
                .iter()
                .map(|time| Slot::new(doctor_id, date, time))
                .collect()
        })
        .unwrap_or_default())
}

fn parse_doctor_row(row: &rusqlite::Row) -> anyhow::Result<Doctor> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let specialty: String = row.get(2)?;
    let city: String = row.get(3)?;
    let clinic: String = row.get(4)?;
    let modality: String = row.get(5)?;
    let availability_json: String = row.get(6)?;

    let availability: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&availability_json).unwrap_or_default();

    Ok(Doctor {
        id,
        name,
        specialty,
        city,
        clinic,
        modality,
        availability,
    })
}

/// Remove times already claimed by a live booking. Times within a date
/// stay sorted because the stored lists are sorted.
fn subtract_booked(conn: &Connection, doctor: &mut Doctor) -> anyhow::Result<()> {
    for (date, time) in booked_times(conn, &doctor.id)? {
        if let Some(times) = doctor.availability.get_mut(&date) {
            times.retain(|t| *t != time);
        }
    }
    Ok(())
}

fn booked_times(conn: &Connection, doctor_id: &str) -> anyhow::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT date, time FROM bookings WHERE doctor_id = ?1 AND status != 'cancelled'",
    )?;
    let rows = stmt.query_map(params![doctor_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut taken = vec![];
    for row in rows {
        taken.push(row?);
    }
    Ok(taken)
}

// ── Bookings ──

/// Book a slot if and only if it is still free. The check and the insert
/// run inside one immediate transaction, and the UNIQUE(doctor_id, date,
/// time) constraint backstops it, so exactly one caller can win a slot.
/// `Ok(None)` means the slot was already taken and nothing was written.
pub fn create_booking_if_free(
    conn: &mut Connection,
    doctor_id: &str,
    date: &str,
    time: &str,
    patient: &PatientInfo,
) -> anyhow::Result<Option<Booking>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let taken: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM bookings
         WHERE doctor_id = ?1 AND date = ?2 AND time = ?3 AND status != 'cancelled'",
        params![doctor_id, date, time],
        |row| row.get(0),
    )?;
    if taken {
        return Ok(None);
    }

    let booking = Booking {
        booking_id: Uuid::new_v4().to_string(),
        doctor_id: doctor_id.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        patient: patient.clone(),
        status: BookingStatus::Confirmed,
        created_at: Utc::now().naive_utc(),
    };

    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO bookings
             (id, doctor_id, date, time, patient_name, patient_email, patient_phone, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.booking_id,
            booking.doctor_id,
            booking.date,
            booking.time,
            booking.patient.name,
            booking.patient.email,
            booking.patient.phone,
            booking.status.as_str(),
            created_at,
        ],
    )?;
    if inserted == 0 {
        return Ok(None);
    }

    tx.commit()?;
    Ok(Some(booking))
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, doctor_id, date, time, patient_name, patient_email, patient_phone, status, created_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| {
            let created_at_str: String = row.get(8)?;
            Ok(Booking {
                booking_id: row.get(0)?,
                doctor_id: row.get(1)?,
                date: row.get(2)?,
                time: row.get(3)?,
                patient: PatientInfo {
                    name: row.get(4)?,
                    email: row.get(5)?,
                    phone: row.get(6)?,
                },
                status: BookingStatus::from_str(&row.get::<_, String>(7)?),
                created_at: chrono::NaiveDateTime::parse_from_str(
                    &created_at_str,
                    "%Y-%m-%d %H:%M:%S",
                )
                .unwrap_or_else(|_| Utc::now().naive_utc()),
            })
        },
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
