//! Command implementations for the clickload CLI

pub mod copy;
pub mod parse;
