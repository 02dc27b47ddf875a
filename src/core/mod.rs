pub mod autoclose;
pub mod calculator;
pub mod clock;
pub mod geofence;
pub mod locks;
pub mod log;
pub mod logic;
pub mod notify;
pub mod scheduler;
pub mod state_machine;
pub mod tracker;
