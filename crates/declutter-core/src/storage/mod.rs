mod models;
mod queries;
mod sqlite;

pub use models::HashEntry;
pub use sqlite::HashStore;
