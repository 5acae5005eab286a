pub mod markdown;
pub mod strip;
