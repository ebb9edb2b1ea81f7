pub mod health;
pub mod objects;

pub use objects::{delete_file, upload_file};
