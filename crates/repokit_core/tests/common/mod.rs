#![allow(dead_code)]

use repokit_core::{open_db_in_memory, Entity, EntityId};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

pub const SCHEMA: &str = "
CREATE TABLE contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    age INTEGER,
    status TEXT NOT NULL DEFAULT 'active',
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
CREATE TABLE tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    label TEXT NOT NULL
);
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: Option<EntityId>,
    pub name: String,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub status: String,
    pub created_at: Option<i64>,
}

impl Entity for Contact {
    const TABLE: &'static str = "contacts";
    const COLUMNS: &'static [&'static str] = &["name", "email", "age", "status"];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            self.email.clone().map_or(Value::Null, Value::Text),
            self.age.map_or(Value::Null, Value::Integer),
            Value::Text(self.status.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<EntityId>,
    pub contact_id: EntityId,
    pub label: String,
}

impl Entity for Tag {
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["contact_id", "label"];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.contact_id),
            Value::Text(self.label.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contact_id: row.get("contact_id")?,
            label: row.get("label")?,
        })
    }
}

pub fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
}

pub fn contact(name: &str, email: Option<&str>, age: Option<i64>) -> Contact {
    Contact {
        id: None,
        name: name.to_string(),
        email: email.map(str::to_string),
        age,
        status: "active".to_string(),
        created_at: None,
    }
}

pub fn tag(contact_id: EntityId, label: &str) -> Tag {
    Tag {
        id: None,
        contact_id,
        label: label.to_string(),
    }
}

pub fn raw_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
