//! Custom tracing layers and writers for AODVv2 nodes

use std::fs::{self, File};

use tracing::{Subscriber, span};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{
        self, MakeWriter,
        format::{Format, Json, JsonFields},
    },
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::{FileConfig, JsonlFields, RotationStrategy};
use crate::context::{NodeContextData, NodeContextGuard};
use crate::error::LogResult;

/// Layer that attaches the node context to spans
///
/// Every span created while a [`NodeContextGuard`] is active gets a
/// [`NodeContextExtension`], so later consumers can attribute the span to
/// its node even when it is entered on another thread.
pub struct NodeContextLayer;

impl NodeContextLayer {
    /// Create a new node context layer
    pub fn new() -> Self {
        Self
    }
}

impl Default for NodeContextLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct NodeContextExtension {
    pub data: NodeContextData,
}

impl<S> Layer<S> for NodeContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            // If there's an active node context, attach it to the span
            if let Some(node_ctx) = NodeContextGuard::current() {
                span.extensions_mut()
                    .insert(NodeContextExtension { data: node_ctx });
            }
        }
    }
}

/// Create a JSONL formatting layer
///
/// Used for both JSONL console output and file output.
pub fn jsonl_layer<S, W>(
    writer: W,
    fields: &JsonlFields,
) -> fmt::Layer<S, JsonFields, Format<Json>, W>
where
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(fields.span_list)
        .with_file(fields.source_location)
        .with_line_number(fields.source_location)
        .with_thread_ids(fields.thread)
        .with_thread_names(fields.thread)
        .with_writer(writer)
}

/// Create the writer for file output
///
/// [`RotationStrategy::Single`] truncates a single `<prefix>.log`; the other
/// strategies append to rolling `<prefix>.<date>.log` files. The returned
/// guard flushes pending lines when dropped.
pub fn file_writer(config: &FileConfig) -> LogResult<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&config.directory)?;

    let rotation = match config.rotation {
        RotationStrategy::Single => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(config.prefix.as_str())
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aodv_core::NodeAddress;
    use parking_lot::Mutex;
    use tracing::Event;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    /// Records the node address found on the span of each event
    struct CaptureLayer {
        seen: Arc<Mutex<Vec<Option<NodeAddress>>>>,
    }

    impl<S> Layer<S> for CaptureLayer
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            let address = ctx.event_span(event).and_then(|span| {
                span.extensions()
                    .get::<NodeContextExtension>()
                    .map(|ext| ext.data.node_address)
            });
            self.seen.lock().push(address);
        }
    }

    #[test]
    fn test_span_carries_node_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = Registry::default()
            .with(NodeContextLayer::new())
            .with(CaptureLayer { seen: seen.clone() });
        let address: NodeAddress = "::1".parse().unwrap();

        tracing::subscriber::with_default(subscriber, || {
            let span = {
                let _guard = NodeContextGuard::new(&address);
                tracing::info_span!("on_route_request")
            };
            // The guard is gone, the span still remembers its node
            span.in_scope(|| tracing::info!("inside"));

            let bare = tracing::info_span!("no_context");
            bare.in_scope(|| tracing::info!("outside"));
        });

        assert_eq!(*seen.lock(), vec![Some(address), None]);
    }
}
