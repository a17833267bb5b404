use std::fmt;

use chrono::Local;
use tracing::Event;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::registry::LookupSpan;

/// Line format shared by all deploykit tools:
///
/// ```text
/// 20260828 14:03:07 deploykit [INFO]: downloading attempt 1/3
/// ```
///
/// The tag identifies the emitting tool so that lines from several helpers
/// interleaved in one automation log remain attributable.
pub struct EventFormat {
    tag: String,
}

impl EventFormat {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl<S, N> FormatEvent<S, N> for EventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y%m%d %H:%M:%S");
        write!(
            writer,
            "{timestamp} {} [{}]: ",
            self.tag,
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize a `tracing_subscriber` with the deploykit line format.
///
/// Reports all the log events sent either with the `log` crate or the
/// `tracing` crate.
///
/// If `debug` is `false` then only `error!`, `warn!` and `info!` are reported.
/// If `debug` is `true` then `debug!` and `trace!` are reported as well.
pub fn init_logging(tag: &str, debug: bool) {
    let log_level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .event_format(EventFormat::new(tag))
        .with_max_level(log_level)
        .init();
}
