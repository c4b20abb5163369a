//! Result-set model shared by the runner and the table renderer.

mod types;

pub use types::{BatchReport, BatchStatus, ResultSet, Row, Value};
