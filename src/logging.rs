//! Log output for the events busypenguin emits.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the application installs a subscriber. [`init_from_env`] installs one
//! tuned to what this crate reports:
//!
//! | level   | target                 | event / span                                    |
//! |---------|------------------------|-------------------------------------------------|
//! | `info`  | `busypenguin::task`    | `task started` (`title`)                        |
//! | `info`  | `busypenguin::task`    | `task finished` (`title`, `elapsed`)            |
//! | `warn`  | `busypenguin::task`    | `task failed: <error chain>` (`title`, `elapsed`) |
//! | `warn`  | `busypenguin::task`    | publish failures swallowed at scope exit        |
//! | `debug` | `busypenguin::message` | span `publish` (`channel`), `message created`/`message updated` (`ts`) |
//! | `debug` | `busypenguin::subtask` | `subtask started` (`index`, `text`), `subtask finished` (`state`) |
//! | `debug` | `busypenguin::client`  | `posted message` / `updated message` (`channel`, `ts`) |
//!
//! `BUSYPENGUIN_LOG` (falling back to `RUST_LOG`) sets the filter, defaulting
//! to task lifecycle events only. `BUSYPENGUIN_LOG_FORMAT=json` switches to
//! one JSON object per line for CI log collectors.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Task lifecycle at `info`, everything else from dependencies at `warn`.
pub const DEFAULT_FILTER: &str = "busypenguin=info,warn";

/// Filter directive from `BUSYPENGUIN_LOG` / `RUST_LOG`, or [`DEFAULT_FILTER`].
fn filter_directive(get: impl Fn(&str) -> Option<String>) -> String {
    get("BUSYPENGUIN_LOG")
        .or_else(|| get("RUST_LOG"))
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn wants_json(get: impl Fn(&str) -> Option<String>) -> bool {
    get("BUSYPENGUIN_LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"))
}

/// Install a global subscriber printing busypenguin's events to stderr.
///
/// Fails if the application already installed a subscriber; callers that
/// don't care can ignore the error.
pub fn init_from_env() -> Result<(), TryInitError> {
    let get = |key: &str| std::env::var(key).ok();
    let directive = filter_directive(get);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    let registry = tracing_subscriber::registry().with(filter);
    if wants_json(get) {
        registry.with(layer.json().with_current_span(true)).try_init()
    } else {
        registry.with(layer.compact()).try_init()
    }
}
