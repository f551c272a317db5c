pub mod creation;
pub mod user;
