pub mod columns;
pub mod config;
pub mod dialog;
pub mod export;
pub mod format;
pub mod models;
pub mod report;
pub mod sort;
pub mod table;
pub mod tagging;
