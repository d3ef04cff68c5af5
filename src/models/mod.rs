pub mod event;
pub mod project;
pub mod webhook;
