//  SIGNALS.rs
//    by the kiln authors
//
//  Created:
//    20 Mar 2026, 14:16:03
//  Last edited:
//    02 Sep 2026, 16:55:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Turns SIGINT and SIGTERM into a cancelled CancellationToken.
//

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;


/***** TESTS *****/





/***** LIBRARY *****/
/// Waits for SIGINT or SIGTERM and cancels the given token when one arrives. Returns early if the token is cancelled by someone else.
///
/// # Arguments
/// - `token`: The CancellationToken to cancel.
pub async fn cancel_on_signal(token: CancellationToken) {
    let mut sigint: Signal = match signal(SignalKind::interrupt()) {
        Ok(sigint) => sigint,
        Err(err)   => { warn!("Failed to listen for SIGINT: {}", err); return; },
    };
    let mut sigterm: Signal = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err)    => { warn!("Failed to listen for SIGTERM: {}", err); return; },
    };

    tokio::select! {
        _ = sigint.recv()      => { info!("Received SIGINT; stopping build..."); },
        _ = sigterm.recv()     => { info!("Received SIGTERM; stopping build..."); },
        _ = token.cancelled()  => { return; },
    }
    token.cancel();
}
