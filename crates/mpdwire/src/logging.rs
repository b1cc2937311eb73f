use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with full filter directives,
/// e.g. `MPDWIRE_LOG=mpdwire_client=trace`.
pub const LOG_ENV: &str = "MPDWIRE_LOG";

/// Crates whose events follow `--log-level`. Everything else stays at `warn`.
const OWN_TARGETS: [&str; 4] = [
    "mpdwire",
    "mpdwire_client",
    "mpdwire_frame",
    "mpdwire_transport",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Whether events should name the crate that emitted them.
    fn shows_target(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Filter directives applying `level` to this workspace's crates only.
fn directives(level: LogLevel) -> String {
    let level = level.as_str();
    let mut out = String::from("warn");
    for target in OWN_TARGETS {
        out.push_str(&format!(",{target}={level}"));
    }
    out
}

fn filter(level: LogLevel, env: Option<&str>) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(directives(level)))
}

/// Install the stderr subscriber. Stdout is reserved for command output.
///
/// Debug and trace output names the emitting crate, so transport, framing
/// and connection events can be told apart.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level, env.as_deref()))
        .with_ansi(false)
        .with_target(level.shows_target());

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
