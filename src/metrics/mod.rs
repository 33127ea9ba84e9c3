//! Metrics module
//!
//! Prometheus counters for upload outcomes, rendered in the text exposition
//! format on request.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "presign_uploadr_uploads_total",
        "Upload attempts by outcome",
        &["outcome"]  // "success" or an error kind
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "presign_uploadr_upload_bytes_total",
        "Total bytes uploaded successfully"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "presign_uploadr_upload_duration_seconds",
        "Duration of transfers that reached the network, in seconds",
        &["outcome"],
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(bytes: u64, duration_secs: f64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
    UPLOAD_DURATION
        .with_label_values(&["success"])
        .observe(duration_secs);
}

/// Record a failed upload
///
/// `duration_secs` is `None` for failures caught before the transfer started.
pub fn record_upload_failure(outcome: &str, duration_secs: Option<f64>) {
    UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
    if let Some(secs) = duration_secs {
        UPLOAD_DURATION.with_label_values(&[outcome]).observe(secs);
    }
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_text() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
