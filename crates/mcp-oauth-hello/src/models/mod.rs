//! Data models for the protected demo API.

mod demo;

pub use demo::{DemoDirectory, Post, Profile, ProfileStats, User};
