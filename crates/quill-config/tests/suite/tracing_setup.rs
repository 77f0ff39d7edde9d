use quill_config::{global_log_buffer, init_tracing, LoggingConfig};
use std::sync::Arc;

#[test]
fn init_tracing_is_idempotent_and_fills_the_global_buffer() {
    let config = LoggingConfig {
        level: "debug".to_owned(),
        stderr: false,
        ..LoggingConfig::default()
    };

    let first = init_tracing(&config);
    let second = init_tracing(&LoggingConfig::default());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &global_log_buffer()));

    tracing::warn!(target: "quill.index", marker = "init-tracing-test", "dropping node");

    let lines = first.last_lines(first.capacity());
    assert!(
        lines.iter().any(|line| line.contains("init-tracing-test")),
        "{lines:?}"
    );
}
