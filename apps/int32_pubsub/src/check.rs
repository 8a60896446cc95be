// Return-code checks for client library calls.
//
// `rc_check!` is for setup: a failure logs the source line and code, then
// returns a `SetupError` for that step. `rc_soft_check!` is for steady state:
// a failure is logged and the caller carries on.

macro_rules! rc_check {
    ($step:expr, $call:expr) => {
        match $call {
            Ok(value) => value,
            Err(source) => {
                let source: ::uros_core::UrosError = source;
                let line = line!();
                let code = source.code();
                ::tracing::error!("Failed status on line {}: {}. Aborting.", line, code);
                return Err($crate::task::SetupError {
                    step: $step,
                    line,
                    code,
                    source,
                });
            }
        }
    };
}

macro_rules! rc_soft_check {
    ($call:expr) => {
        match $call {
            Ok(value) => Some(value),
            Err(source) => {
                let source: ::uros_core::UrosError = source;
                ::tracing::error!(
                    "Failed status on line {}: {}. Continuing.",
                    line!(),
                    source.code()
                );
                None
            }
        }
    };
}
