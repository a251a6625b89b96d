mod tracing_listener;

pub use tracing_listener::TracingListener;
