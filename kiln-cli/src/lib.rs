//  LIB.rs
//    by the kiln authors
//
//  Created:
//    16 Mar 2026, 09:41:26
//  Last edited:
//    20 Mar 2026, 14:16:21
//  Auto updated?
//    Yes
//
//  Description:
//!   The `kiln-cli` library implements the host side of a kiln build:
//!   it renders the recipe, drives the container engine and collects the
//!   outputs.
//

#[macro_use]
extern crate log;

// Declare modules
pub mod errors;
pub mod spec;
pub mod utils;
pub mod recipe;
pub mod workdir;
pub mod engine;
pub mod signals;
pub mod build;
