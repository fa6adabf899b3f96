//  LIB.rs
//    by the kiln authors
//
//  Created:
//    09 Mar 2026, 13:31:02
//  Last edited:
//    10 Mar 2026, 15:27:51
//  Auto updated?
//    Yes
//
//  Description:
//!   The `kiln-let` library implements the driver that runs inside the
//!   build container: it fetches, unpacks, patches, configures and
//!   compiles the source tree and places the outputs in the directory
//!   shared with the host.
//

// Declare modules
pub mod errors;
pub mod stages;
pub mod exec;
pub mod fetch;
pub mod pipeline;
