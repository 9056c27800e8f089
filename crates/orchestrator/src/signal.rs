use std::io;

use engine::CancellationToken;

#[cfg(unix)]
use crate::exit_code::ExitCode;

/// Registers SIGINT, SIGTERM and SIGHUP with a fresh cancellation token.
///
/// The first signal cancels the token; in-flight transfers stop and discard
/// their temporary files. A second SIGINT or SIGTERM while the token is already
/// cancelled terminates the process with the signal exit status.
#[cfg(unix)]
pub fn install_signal_handlers() -> io::Result<CancellationToken> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;

    let token = CancellationToken::new();
    for signal in [SIGINT, SIGTERM] {
        flag::register_conditional_shutdown(signal, ExitCode::Signal.as_i32(), token.flag().clone())?;
        flag::register(signal, token.flag().clone())?;
    }
    flag::register(SIGHUP, token.flag().clone())?;
    Ok(token)
}

/// Returns a token that nothing but the caller cancels.
#[cfg(not(unix))]
pub fn install_signal_handlers() -> io::Result<CancellationToken> {
    Ok(CancellationToken::new())
}
