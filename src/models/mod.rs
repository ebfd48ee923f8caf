// src/models/mod.rs

pub mod attempt;
pub mod contact;
pub mod leaderboard;
pub mod quiz;
pub mod user;
