pub mod canvas;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod media;
pub mod session;
pub mod tapestry;
pub mod tasks;
pub mod view;
