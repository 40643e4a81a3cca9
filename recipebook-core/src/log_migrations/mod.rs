//! Event log schema, embedded at build time
//!
//! Applied in order by `LoggingService`; the first entry creates the
//! bookkeeping table and must stay idempotent.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
