pub mod errors;
pub mod scale;
