pub mod accounting;
pub mod summary;
