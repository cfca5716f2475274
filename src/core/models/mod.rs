pub mod detail;
pub mod record;
pub mod subject;
