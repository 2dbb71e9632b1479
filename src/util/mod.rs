/// Debug-only log line tagged with the emitting component.
///
/// Compiled out of release builds; everything else goes through `leptos::logging` directly.
macro_rules! debug_log {
    ($tag:expr, $($arg:tt)*) => {
        if cfg!(debug_assertions) {
            leptos::logging::log!("[DEBUG-{}] {}", $tag, format!($($arg)*));
        }
    };
}

pub(crate) use debug_log;

/// Milliseconds since the epoch, used only for timing log lines.
pub(crate) fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }

    // Native builds (tests) have no JS clock.
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_monotonic_enough_for_timing() {
        let a = now_ms();
        let b = now_ms();
        assert!(a > 0.0);
        assert!(b >= a);
    }
}
