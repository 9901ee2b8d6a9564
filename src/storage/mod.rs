//! SQLite persistence.

mod gateway;
mod migrations;
mod pool;
mod runs;
mod sqlite;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use gateway::PersistenceGateway;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use runs::{insert_run_result, query_run_history, RunRecord};
pub use sqlite::SqliteGateway;
