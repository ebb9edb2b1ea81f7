pub mod backend;
pub mod staging;
pub mod storage;
