//! Final report, written once after the run completes.

use crate::engine::RunStats;
use crate::error::{Error, Result};
use crate::model::ResultStore;
use crate::model::photo::Photo;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Plain-text listing: one `<id> <thumbnailUrl>` line per stored photo in id
/// order, then the total and elapsed wall time.
pub fn write_photos<W: Write>(
    out: &mut W,
    photos: &ResultStore<Photo>,
    elapsed: Duration,
) -> Result<()> {
    writeln!(out, "Photos:")?;
    for (id, photo) in photos.iter() {
        writeln!(out, "{id} {}", photo.thumbnail_url)?;
    }
    writeln!(out, "Total: {}", photos.len())?;
    writeln!(out, "Elapsed: {:.2}s", elapsed.as_secs_f64())?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    stats: &'a RunStats,
    mean_latency_ms: Option<u64>,
    photos: Vec<&'a Photo>,
}

/// Machine-readable report: run stats, mean fetch latency, and the photos in
/// id order.
pub fn write_json<W: Write>(
    out: &mut W,
    photos: &ResultStore<Photo>,
    stats: &RunStats,
) -> Result<()> {
    let report = JsonReport {
        stats,
        mean_latency_ms: stats.mean_latency().map(|d| d.as_millis() as u64),
        photos: photos.iter().map(|(_, p)| p).collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)
        .map_err(|e| Error::Other(format!("failed to encode report: {e}")))?;
    writeln!(out)?;
    Ok(())
}
