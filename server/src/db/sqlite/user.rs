use anyhow::Result;
use eventdesk_misc::api::user::{GetUserRequest, PatchUserRequest, User};
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::db::sql::{Select, Update, Value};
use crate::db::types::{CreateUserParams, UpdatePasswordParams, UserPassword};

use super::{convert_values, parse_column};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    password TEXT NOT NULL,
    salt TEXT NOT NULL,
    update_time INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_role ON user(role);
"#;

const USER_FIELDS: [&str; 5] = ["id", "username", "email", "role", "update_time"];

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateUserParams) -> Result<()> {
    let sql = r#"
    INSERT INTO user (id, username, email, role, password, salt, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    "#;
    debug!(
        "Database create_user: {sql}, {}, {}",
        params.id, params.user.username
    );
    let role = params.user.role.map(|r| r.as_str()).unwrap_or_default();
    tx.execute(
        sql,
        params![
            params.id,
            params.user.username,
            params.user.email,
            role,
            params.user.password,
            params.salt,
            params.update_time,
        ],
    )?;

    Ok(())
}

pub fn update(tx: &Transaction, patch: PatchUserRequest, update_time: u64) -> Result<()> {
    let mut update = Update::new("user");

    if let Some(username) = patch.username {
        update.add_field("username", Value::Text(username));
    }

    if let Some(email) = patch.email {
        update.add_field("email", Value::Text(email));
    }

    if let Some(role) = patch.role {
        update.add_field("role", Value::Text(role.to_string()));
    }

    update.add_field("update_time", Value::Integer(update_time));
    update.add_where("id = ?", Value::Text(patch.id));

    let (sql, values) = update.build();
    let values = convert_values(values);

    debug!("Database update_user: {sql}, {values:?}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn update_password(tx: &Transaction, params: UpdatePasswordParams) -> Result<()> {
    let sql = "UPDATE user SET password = ?, salt = ?, update_time = ? WHERE id = ?";
    debug!("Database update_user_password: {sql}, {}", params.id);
    tx.execute(
        sql,
        params![params.password, params.salt, params.update_time, params.id],
    )?;
    Ok(())
}

pub fn delete(tx: &Transaction, id: &str) -> Result<()> {
    let sql = "DELETE FROM user WHERE id = ?";
    debug!("Database delete_user: {sql}, {id}");
    tx.execute(sql, params![id])?;
    Ok(())
}

pub fn get(tx: &Transaction, id: &str) -> Result<Option<User>> {
    let mut select = Select::new(USER_FIELDS.to_vec(), "user");
    select.add_where("id = ?", Value::Text(String::from(id)));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_user: {sql}, {values:?}");
    let mut stmt = tx.prepare(&sql)?;
    let user = stmt
        .query_row(params_from_iter(values), parse_user)
        .optional()?;
    Ok(user)
}

pub fn get_password(tx: &Transaction, email: &str) -> Result<Option<UserPassword>> {
    let sql = "SELECT id, password, salt, role FROM user WHERE email = ?";
    debug!("Database get_user_password: {sql}, {email}");

    let mut stmt = tx.prepare(sql)?;
    let up = stmt
        .query_row(params![email], |row| {
            Ok(UserPassword {
                id: row.get(0)?,
                password: row.get(1)?,
                salt: row.get(2)?,
                role: parse_column(3, row.get(3)?)?,
            })
        })
        .optional()?;

    Ok(up)
}

/// Reports whether another account already uses `username` or `email`.
pub fn is_conflict(
    tx: &Transaction,
    username: Option<&str>,
    email: Option<&str>,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let mut conds = Vec::new();
    let mut values = Vec::new();
    if let Some(username) = username {
        conds.push("username = ?");
        values.push(Value::Text(String::from(username)));
    }
    if let Some(email) = email {
        conds.push("email = ?");
        values.push(Value::Text(String::from(email)));
    }
    if conds.is_empty() {
        return Ok(false);
    }

    let mut select = Select::count("user");
    select.add_where_values(format!("({})", conds.join(" OR ")), values);
    if let Some(id) = exclude_id {
        select.add_where("id != ?", Value::Text(String::from(id)));
    }

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database is_user_conflict: {sql}, {values:?}");
    let count: i64 = tx.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(count > 0)
}

pub fn count_users(tx: &Transaction, req: GetUserRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_users(tx: &Transaction, req: GetUserRequest) -> Result<Vec<User>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let users = stmt
        .query_map(params_from_iter(values), parse_user)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

fn parse_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: parse_column(3, row.get(3)?)?,
        update_time: row.get(4)?,
    })
}

fn build_select_sql(count: bool, req: GetUserRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("user")
    } else {
        Select::new(USER_FIELDS.to_vec(), "user")
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Text(id));
    }

    if let Some(role) = req.role {
        select.add_where("role = ?", Value::Text(role.to_string()));
    }

    select.set_query(req.query, &["username", "email"]);

    select.add_order_by("update_time DESC");
    select.add_order_by("username ASC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
