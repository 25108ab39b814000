//! Database rows and the query structs that read and write them.
//!
//! Each query is a plain struct executed by
//! [`DatabaseProcessor`](crate::framework::DatabaseProcessor) through its
//! `kanau::processor::Processor` impl.

pub mod order_records;
pub mod webhook_deliveries;
