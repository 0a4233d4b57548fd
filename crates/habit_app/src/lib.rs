pub mod app;
pub mod storage;
