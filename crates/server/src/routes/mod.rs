pub mod games;
pub mod health;
pub mod moves;
pub mod tiers;
