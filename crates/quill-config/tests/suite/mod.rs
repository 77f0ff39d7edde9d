mod tracing_setup;
