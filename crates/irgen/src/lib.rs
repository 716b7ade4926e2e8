pub mod cmd_convert;
pub mod cmd_inspect;
pub mod common;
pub mod config;
pub mod validate;
pub mod workbook;
