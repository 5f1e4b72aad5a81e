pub mod favorites;
pub mod merge;
