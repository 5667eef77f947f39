pub mod cache;
pub mod dwd_table;
pub mod error;
pub mod fetcher;
