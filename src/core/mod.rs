//! This module constitutes the core, headless, and host-agnostic engine of vimode.
//! It holds the key grammar, Command Objects and their evaluation, the
//! Definition Tables, the Register Store, and the View abstraction actions
//! run against, together with a rope-backed reference View.

pub mod command;
pub mod commands;
pub mod definition;
pub mod dispatcher;
pub mod error;
pub mod grammar;
pub mod id;
pub mod input;
pub mod register;
pub mod rope_view;
pub mod utf8;
pub mod view;
