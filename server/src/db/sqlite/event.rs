use anyhow::{Context, Result};
use eventdesk_misc::api::event::{Event, EventBase, EventDetails};
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::db::sql::{Select, Update, Value};
use crate::db::types::{CreateEventParams, GetEventsParams};

use super::{convert_values, json_column};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS event (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    owner TEXT NOT NULL,
    day INTEGER NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    details TEXT NOT NULL,
    update_time INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_owner ON event(owner);
CREATE INDEX IF NOT EXISTS idx_event_day ON event(day);
"#;

const EVENT_FIELDS: [&str; 8] = [
    "id",
    "name",
    "owner",
    "day",
    "start_time",
    "end_time",
    "details",
    "update_time",
];

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateEventParams) -> Result<()> {
    let sql = r#"
    INSERT INTO event (id, name, owner, day, start_time, end_time, details, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    "#;
    let base = params.event.base;
    let details = encode_details(&params.event.details)?;
    debug!("Database create_event: {sql}, {}, {}", params.id, base.name);
    tx.execute(
        sql,
        params![
            params.id,
            base.name,
            base.owner,
            base.day,
            base.start_time,
            base.end_time,
            details,
            params.update_time,
        ],
    )?;

    Ok(())
}

pub fn update_base(tx: &Transaction, id: &str, base: EventBase, update_time: u64) -> Result<()> {
    let mut update = Update::new("event");
    update.add_field("name", Value::Text(base.name));
    update.add_field("owner", Value::Text(base.owner));
    update.add_field("day", Value::Integer(base.day as u64));
    update.add_field("start_time", Value::Text(base.start_time));
    update.add_field("end_time", Value::Text(base.end_time));
    update.add_field("update_time", Value::Integer(update_time));
    update.add_where("id = ?", Value::Text(String::from(id)));

    execute_update(tx, "update_event", update)
}

pub fn update_details(
    tx: &Transaction,
    id: &str,
    details: EventDetails,
    update_time: u64,
) -> Result<()> {
    let mut update = Update::new("event");
    update.add_field("details", Value::Text(encode_details(&details)?));
    update.add_field("update_time", Value::Integer(update_time));
    update.add_where("id = ?", Value::Text(String::from(id)));

    execute_update(tx, "update_event_details", update)
}

pub fn delete(tx: &Transaction, id: &str) -> Result<()> {
    let sql = "DELETE FROM event WHERE id = ?";
    debug!("Database delete_event: {sql}, {id}");
    tx.execute(sql, params![id])?;
    Ok(())
}

pub fn get(tx: &Transaction, id: &str) -> Result<Option<Event>> {
    let mut select = Select::new(EVENT_FIELDS.to_vec(), "event");
    select.add_where("id = ?", Value::Text(String::from(id)));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_event: {sql}, {values:?}");
    let mut stmt = tx.prepare(&sql)?;
    let event = stmt
        .query_row(params_from_iter(values), parse_event)
        .optional()?;
    Ok(event)
}

/// Two events clash when they share name, day and time slot.
pub fn is_duplicate(
    tx: &Transaction,
    base: &EventBase,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let mut select = Select::count("event");
    select.add_where("name = ?", Value::Text(base.name.clone()));
    select.add_where("day = ?", Value::Integer(base.day as u64));
    select.add_where("start_time = ?", Value::Text(base.start_time.clone()));
    select.add_where("end_time = ?", Value::Text(base.end_time.clone()));
    if let Some(id) = exclude_id {
        select.add_where("id != ?", Value::Text(String::from(id)));
    }

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database is_event_duplicate: {sql}, {values:?}");
    let count: i64 = tx.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(count > 0)
}

pub fn count_events(tx: &Transaction, params: GetEventsParams) -> Result<u64> {
    let (sql, values) = build_select_sql(true, params);
    debug!("Database count_events: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_events(tx: &Transaction, params: GetEventsParams) -> Result<Vec<Event>> {
    let (sql, values) = build_select_sql(false, params);
    debug!("Database get_events: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let events = stmt
        .query_map(params_from_iter(values), parse_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

fn parse_event(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        day: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        details: json_column(6, row.get(6)?)?,
        update_time: row.get(7)?,
    })
}

fn encode_details(details: &EventDetails) -> Result<String> {
    serde_json::to_string(details).context("encode event details")
}

fn execute_update(tx: &Transaction, name: &str, update: Update) -> Result<()> {
    let (sql, values) = update.build();
    let values = convert_values(values);

    debug!("Database {name}: {sql}, {values:?}");
    tx.execute(&sql, params_from_iter(values.iter()))?;
    Ok(())
}

fn build_select_sql(count: bool, params: GetEventsParams) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("event")
    } else {
        Select::new(EVENT_FIELDS.to_vec(), "event")
    };

    let req = params.req;
    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Text(id));
    }

    if let Some(owner) = params.owner {
        select.add_where("owner = ?", Value::Text(owner));
    }

    if let Some(day) = req.day {
        select.add_where("day = ?", Value::Integer(day as u64));
    }

    select.set_query(req.query, &["name"]);

    select.add_order_by("day ASC");
    select.add_order_by("start_time ASC");
    select.add_order_by("name ASC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
