pub mod command;

#[cfg(test)]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[cfg(test)]
pub fn test_tracing_start() {
    let my_filter = tracing_subscriber::filter::filter_fn(|v| {
        // if let Some(mp) = v.module_path() {
        //     if mp.contains("tokio") {
        //         return false;
        //     }
        // }
        v.level() != &tracing::Level::TRACE
    });
    let my_layer = tracing_subscriber::fmt::layer().with_test_writer();
    let _ = tracing_subscriber::registry()
        .with(my_layer.with_filter(my_filter))
        .try_init();
}

/// Runs blocking work without stalling the other tasks of a multi thread
/// runtime. Falls back to running inline anywhere else, since
/// `block_in_place` panics on a current thread runtime.
pub fn block_in_place_if_multi_thread<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(tokio::runtime::RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}
