pub mod app_state;
pub mod config;
pub mod dashboard;
pub mod event_loop;
pub mod input;
pub mod led_matrix;
pub mod records;
pub mod remote;
pub mod sensors;
pub mod status;
