use anyhow::{Context, Result};
use eventdesk_misc::api::registration::{GetRegistrationsRequest, Registration};
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};

use crate::db::sql::{Select, Value};

use super::{convert_values, json_column};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS registration (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    team_name TEXT NOT NULL,
    team_members TEXT NOT NULL,
    custom_input_values TEXT NOT NULL,
    registration_time INTEGER NOT NULL,
    UNIQUE (event_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_registration_event ON registration(event_id);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, registration: Registration) -> Result<u64> {
    let sql = r#"
    INSERT INTO registration (event_id, user_id, team_name, team_members, custom_input_values, registration_time)
    VALUES (?, ?, ?, ?, ?, ?)
    "#;
    let team_members =
        serde_json::to_string(&registration.team_members).context("encode team members")?;
    let custom_input_values = serde_json::to_string(&registration.custom_input_values)
        .context("encode custom input values")?;
    debug!(
        "Database create_registration: {sql}, {}, {}",
        registration.event_id, registration.user_id
    );
    tx.execute(
        sql,
        params![
            registration.event_id,
            registration.user_id,
            registration.team_name,
            team_members,
            custom_input_values,
            registration.registration_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn delete_by_event(tx: &Transaction, event_id: &str) -> Result<()> {
    let sql = "DELETE FROM registration WHERE event_id = ?";
    debug!("Database delete_registrations: {sql}, {event_id}");
    tx.execute(sql, params![event_id])?;
    Ok(())
}

pub fn count_registrations(tx: &Transaction, req: GetRegistrationsRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_registrations: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_registrations(
    tx: &Transaction,
    req: GetRegistrationsRequest,
) -> Result<Vec<Registration>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_registrations: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let registrations = stmt
        .query_map(params_from_iter(values), parse_registration)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(registrations)
}

fn parse_registration(row: &Row) -> rusqlite::Result<Registration> {
    Ok(Registration {
        id: row.get(0)?,
        event_id: row.get(1)?,
        user_id: row.get(2)?,
        team_name: row.get(3)?,
        team_members: json_column(4, row.get(4)?)?,
        custom_input_values: json_column(5, row.get(5)?)?,
        registration_time: row.get(6)?,
    })
}

fn build_select_sql(count: bool, req: GetRegistrationsRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("registration")
    } else {
        Select::new(
            vec![
                "id",
                "event_id",
                "user_id",
                "team_name",
                "team_members",
                "custom_input_values",
                "registration_time",
            ],
            "registration",
        )
    };

    select.add_where("event_id = ?", Value::Text(req.event_id));
    select.set_query(req.query, &["team_name"]);
    select.add_order_by("registration_time ASC");
    select.add_order_by("id ASC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
