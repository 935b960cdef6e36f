//! SQL compiled into the binary

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Application order
pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_kv_entries",
    sql: include_str!("../../migrations/001_kv_entries.sql"),
}];
