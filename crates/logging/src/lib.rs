//! helpers for logging.

/// Environment variable holding the filter, in `env_logger` syntax.
pub const LOG_ENV: &str = "TRUFFLE_LOG";

/// Log to stderr, filtered by `TRUFFLE_LOG` (default `info`).
///
/// If called multiple times in the same process, only applies once.  Safe to call from every test.
pub fn log_to_stderr() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "info"))
            .format(|buf, record| {
                use std::io::Write;

                let now = time::OffsetDateTime::now_utc();

                writeln!(
                    buf,
                    "{} {} time={} target={}",
                    record.level(),
                    record.args(),
                    now,
                    record.target()
                )
            })
            .try_init();
    });
}
