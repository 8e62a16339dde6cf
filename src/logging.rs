//! Internal logging helpers for structured rowcmp events.

/// Single logging target for rowcmp.
pub(crate) const LOG_TARGET: &str = "rowcmp";

/// Optional common key/value fields appended to all logs emitted while a
/// [`ComputeContext`](crate::context::ComputeContext) carrying it is in use.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogContext {
    common_kv: &'static str,
}

impl LogContext {
    /// Build a context that appends the provided key/value pairs, e.g. `"op=sort"`.
    pub const fn new(common_kv: &'static str) -> Self {
        Self { common_kv }
    }

    pub(crate) fn common_kv(&self) -> Option<&'static str> {
        if self.common_kv.is_empty() {
            None
        } else {
            Some(self.common_kv)
        }
    }
}

macro_rules! rowcmp_log {
    ($level:expr, ctx: $ctx:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            if let Some(common_kv) = $ctx.common_kv() {
                log::log!(
                    target: crate::logging::LOG_TARGET,
                    $level,
                    "event={} {} {}",
                    $event,
                    common_kv,
                    format_args!($fmt $(, $args)*)
                );
            } else {
                log::log!(
                    target: crate::logging::LOG_TARGET,
                    $level,
                    "event={} {}",
                    $event,
                    format_args!($fmt $(, $args)*)
                );
            }
        }
    }};
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use rowcmp_log;
