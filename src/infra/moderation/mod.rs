pub mod sqlite_exception_store;

pub use sqlite_exception_store::SqliteExceptionStore;
