//  LIB.rs
//    by the kiln authors
//
//  Created:
//    02 Mar 2026, 10:12:40
//  Last edited:
//    14 Oct 2026, 16:03:11
//  Auto updated?
//    Yes
//
//  Description:
//!   The `specifications` crate defines the data model and contracts
//!   shared between the host-side `kiln` orchestrator and the
//!   in-container `kilnlet` driver.
//

pub mod arch;
pub mod build;
pub mod container;
