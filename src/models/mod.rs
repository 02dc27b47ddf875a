pub mod coordinate;
pub mod punch;
pub mod shift;
pub mod worker;
