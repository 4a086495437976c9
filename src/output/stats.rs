//! Run statistics
//!
//! Counts collected from the resolution table once the crawl has finished,
//! plus the write results and timing of the output phase.

use crate::state::{ResolutionSource, ResolutionTable, ResourceStatus};
use std::time::Duration;

/// Summary of one reconstruction run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Canonical URLs handed out by the frontier
    pub visited: usize,

    /// Resources retrieved and validated
    pub downloaded: usize,

    /// Resources no source could provide
    pub missing: usize,

    /// Resources retrieved but rejected by the integrity check
    pub corrupted: usize,

    /// Redirect aliases recorded
    pub redirected: usize,

    /// URLs still pending when the crawl stopped (file cap or cancellation)
    pub unvisited: usize,

    /// Resources served from a nearby timestamp
    pub nearby_hits: usize,

    /// Resources served from the CDN mirror
    pub cdn_hits: usize,

    /// Files written to the output tree (redirect stubs included)
    pub written: usize,

    /// Files that could not be written
    pub write_failures: usize,

    pub bytes_written: u64,

    pub elapsed: Duration,

    /// The run was interrupted before the frontier drained
    pub cancelled: bool,

    /// Fingerprint of the resolved configuration
    pub fingerprint: String,
}

impl RunSummary {
    /// Resolution counts of a finished crawl
    pub fn from_table(table: &ResolutionTable) -> Self {
        Self {
            downloaded: table.count_status(ResourceStatus::Success),
            missing: table.count_status(ResourceStatus::Missing),
            corrupted: table.count_status(ResourceStatus::Corrupted),
            redirected: table.aliases().count(),
            nearby_hits: table.count_source(ResolutionSource::Nearby),
            cdn_hits: table.count_source(ResolutionSource::Cdn),
            ..Self::default()
        }
    }

    /// Share of visited resources that were downloaded, in percent
    pub fn success_rate(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        (self.downloaded as f64 / self.visited as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_statistics(summary: &RunSummary) {
    println!("=== Run Statistics ===\n");

    println!("Crawl:");
    println!("  Visited: {}", summary.visited);
    println!(
        "  Downloaded: {} ({:.1}%)",
        summary.downloaded,
        summary.success_rate()
    );
    println!("  Missing: {}", summary.missing);
    println!("  Corrupted: {}", summary.corrupted);
    println!("  Redirected: {}", summary.redirected);
    if summary.unvisited > 0 {
        println!("  Unvisited: {}", summary.unvisited);
    }
    println!();

    println!("Fallbacks:");
    println!("  Nearby timestamps: {}", summary.nearby_hits);
    println!("  CDN mirror: {}", summary.cdn_hits);
    println!();

    println!("Output:");
    println!("  Files written: {}", summary.written);
    println!("  Bytes written: {}", summary.bytes_written);
    if summary.write_failures > 0 {
        println!("  Write failures: {}", summary.write_failures);
    }
    println!();

    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    if summary.cancelled {
        println!("Status: cancelled (partial output)");
    } else {
        println!("Status: completed");
    }
    println!("Config fingerprint: {}", summary.fingerprint);
}
