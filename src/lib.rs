pub mod api;
pub mod config;
pub mod consts;
pub mod events;
pub mod messages;
pub mod reconcile;
pub mod reputation;
pub mod webhook;
