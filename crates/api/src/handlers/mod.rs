pub mod edits;
pub mod health;
