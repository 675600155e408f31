pub mod csv_feed;
pub mod persistence;
pub mod simulation;
