pub mod parse;
pub mod quiz;
