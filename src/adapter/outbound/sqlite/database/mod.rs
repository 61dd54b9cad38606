//! Pool, migrations, table definitions and row types for the
//! candle, ticker, snapshot and analysis tables.

pub mod connection;
pub mod model;
pub mod schema;
