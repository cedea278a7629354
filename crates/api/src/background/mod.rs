pub mod close_edits;
