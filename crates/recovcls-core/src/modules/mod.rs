pub mod cl_table;
pub mod config;
