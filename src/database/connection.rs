use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::{QueryResult, SqliteConnection};
use tracing::{debug, trace, trace_span};

use crate::config::Config;
use crate::database::functions::fold_case_utils;
use crate::error::AppError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const IN_MEMORY: &str = ":memory:";

const MIGRATIONS: &[(&str, &str)] = &[(
    "2024-05-01-000000_create_foodgram",
    include_str!("../../migrations/2024-05-01-000000_create_foodgram/up.sql"),
)];

/// Per-connection setup, sqlite keeps pragmas and custom functions per handle.
#[derive(Debug)]
struct ConnectionSetup;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionSetup {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)?;

        fold_case_utils::register_impl(connection, |value: String| value.to_lowercase())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_pooled_connection(config: &Config) -> Result<DbPool, AppError> {
    let span = trace_span!("establishing pooled connection");
    let _guard = span.enter();

    trace!("Creating manager");
    let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);

    // Every in-memory connection is its own database, so the pool must never
    // open a second one or recycle the first.
    let in_memory = config.database_url == IN_MEMORY;
    let max_size = if in_memory { 1 } else { config.pool_size };

    trace!("Creating pool");
    let mut builder = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionSetup));
    if in_memory {
        builder = builder.idle_timeout(None).max_lifetime(None);
    }
    let pool = builder.build(manager)?;

    trace!("Applying migrations");
    let mut connection = pool.get()?;
    run_migrations(&mut connection)?;

    Ok(pool)
}

pub fn run_migrations(connection: &mut SqliteConnection) -> QueryResult<()> {
    for (name, sql) in MIGRATIONS {
        debug!("Applying migration {name}");
        connection.batch_execute(sql)?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_pool() -> DbPool {
    establish_pooled_connection(&Config::in_memory()).expect("in-memory pool")
}
