pub mod accessor;
pub mod manager;
pub mod memory;
pub mod postgres;

pub use accessor::{DataServiceAccessor, DataServiceError, Selection};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryDataServiceAccessor;
pub use postgres::PgDataServiceAccessor;
