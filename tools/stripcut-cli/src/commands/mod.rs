pub mod compile;
pub mod summary;
