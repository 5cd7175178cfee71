pub mod bankroll;
pub mod data;
pub mod odds_math;
pub mod stats;
pub mod strategy;
