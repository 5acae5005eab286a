pub mod card;
pub mod outcome;
pub mod resource;
pub mod token;
