//! Prometheus metrics

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Frames received from the stream
    MessagesReceived,
    /// Rows appended to the table
    RowsAppended,
    /// Rows that reached the table but not the durable log
    LogWriteFailures,
    /// Reconnect attempts
    Reconnects,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Rows currently held in memory
    TableRows,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::MessagesReceived => "flowtape_messages_received_total",
        CounterMetric::RowsAppended => "flowtape_rows_appended_total",
        CounterMetric::LogWriteFailures => "flowtape_log_write_failures_total",
        CounterMetric::Reconnects => "flowtape_reconnects_total",
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(counter_name(metric)).increment(1);
}

/// Count a rejected message, labelled by reason
pub fn record_rejection(reason: &'static str) {
    ::metrics::counter!("flowtape_rejections_total", "reason" => reason).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::TableRows => "flowtape_table_rows",
    };
    ::metrics::gauge!(name).set(value);
}
