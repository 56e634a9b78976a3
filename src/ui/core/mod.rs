pub mod alerts;
pub mod indicators;
pub mod scheduler;
pub mod simulator;
pub mod state;
pub mod storage;
