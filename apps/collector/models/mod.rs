pub mod price;
pub mod proposal;
pub mod score;
