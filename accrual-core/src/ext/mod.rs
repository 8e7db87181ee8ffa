use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

pub mod duration_ext;

pub fn init_logger(level: tracing::Level) {
    let format = tracing_subscriber::fmt::format()
        .with_timer(LocalTime::rfc_3339())
        .pretty();
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .event_format(format)
        .with_max_level(level)
        .try_init();
}

pub fn init_logger_with_filter(filter: impl Into<EnvFilter>) {
    let format = tracing_subscriber::fmt::format()
        .with_timer(LocalTime::rfc_3339())
        .pretty()
        .with_file(false);
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .event_format(format)
        .with_env_filter(filter)
        .try_init();
}
