pub mod collection;
pub mod course;
pub mod diagnostics;
pub mod field;
pub mod notice;
pub mod params;
pub mod station;
pub mod view;

pub type Result<T> = anyhow::Result<T>;
