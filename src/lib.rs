//! Quickdraw - a deterministic two-party quickdraw duel simulation
//!
//! A timed standoff is followed by a reaction-driven draw/aim/shoot exchange,
//! resolved through an aim-spread model and swept projectile hit tests, and
//! scored into rounds and matches.

pub mod config;
pub mod game;
pub mod runner;
pub mod util;

pub use game::{Duel, DuelError, DuelEvent, DuelSettings};
