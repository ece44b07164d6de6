//! Side-panel auth flow client for SideTab

pub mod controller;

pub use controller::{AuthController, AuthPhase};
