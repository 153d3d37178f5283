pub mod config;
pub mod constants;
pub mod coordinates;
pub mod ephemeris;
pub mod frame_transform;
pub mod orientation;
pub mod solutions;
pub mod targeter;
pub mod targeter_errors;
pub mod time;
