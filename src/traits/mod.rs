mod cursor;
mod data_exchange;
mod driver;
mod type_handler;

pub use cursor::Cursor;
pub use data_exchange::DataExchange;
pub use driver::DatabaseDriver;
pub use type_handler::TypeHandler;
