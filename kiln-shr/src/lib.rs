//  LIB.rs
//    by the kiln authors
//
//  Created:
//    03 Mar 2026, 09:20:11
//  Last edited:
//    12 Aug 2026, 15:47:30
//  Auto updated?
//    Yes
//
//  Description:
//!   The `kiln-shr` crate defines common functions and other tools used
//!   by both the host orchestrator and the in-container driver. This
//!   crate differs from the `specifications` crate in that it does not
//!   aim to standardize things, but rather just provide a common
//!   implementation.
//

// Declare some modules
pub mod debug;
pub mod fs;
