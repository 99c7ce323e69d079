//! Throughput accounting for a run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Totals accumulated over a whole run.
///
/// Only the main loop mutates it; the interrupt handler reads the copy
/// published through [`SharedStats`].
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub started: Instant,
    /// Set once the last directory was processed.
    pub finished: Option<Instant>,
    pub bytes: u64,
    pub files: u64,
    pub directories: u64,
    /// Time spent blocked on confirmation prompts.
    pub wait: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            started: Instant::now(),
            finished: None,
            bytes: 0,
            files: 0,
            directories: 0,
            wait: Duration::ZERO,
        }
    }

    pub fn record_directory(&mut self, files: u64, bytes: u64) {
        self.directories += 1;
        self.files += files;
        self.bytes += bytes;
    }

    /// Stops the clock. Later calls keep the first end time.
    pub fn finish(&mut self) {
        self.finished.get_or_insert_with(Instant::now);
    }

    /// Wall time from the start until [`RunStats::finish`] (or now, while
    /// still running), excluding time spent waiting on the user.
    pub fn busy_time(&self) -> Duration {
        self.finished
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.started)
            .saturating_sub(self.wait)
    }

    /// The summary printed at the end of a run, one string per line.
    pub fn summary_lines(&self) -> Vec<String> {
        summary_lines(self.bytes, self.files, self.directories, self.busy_time(), self.wait)
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Published {
    stats: RunStats,
    waiting_since: Option<Instant>,
}

/// Statistics shared between the main loop and the interrupt handler.
///
/// The main loop publishes after every change. While a confirmation prompt
/// is open its start is kept, so a snapshot taken at that moment counts the
/// time spent so far as wait time.
#[derive(Debug, Clone)]
pub struct SharedStats {
    inner: Arc<Mutex<Published>>,
}

impl SharedStats {
    pub fn new(stats: RunStats) -> Self {
        SharedStats {
            inner: Arc::new(Mutex::new(Published {
                stats,
                waiting_since: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Published> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the published copy and closes any open prompt.
    pub fn publish(&self, stats: &RunStats) {
        let mut published = self.lock();
        published.stats = *stats;
        published.waiting_since = None;
    }

    /// Marks the start of a confirmation prompt.
    pub fn begin_wait(&self, since: Instant) {
        self.lock().waiting_since = Some(since);
    }

    /// The published statistics, with an open prompt counted as wait time.
    pub fn snapshot(&self) -> RunStats {
        let published = self.lock();
        let mut stats = published.stats;
        if let Some(since) = published.waiting_since {
            stats.wait += since.elapsed();
        }
        stats
    }
}

fn summary_lines(
    bytes: u64,
    files: u64,
    directories: u64,
    busy: Duration,
    wait: Duration,
) -> Vec<String> {
    let seconds = busy.as_secs_f64();
    let speed = if seconds > 0.0 {
        bytes as f64 / seconds
    } else {
        0.0
    };

    let mut lines = vec![
        format!(
            "Processed {} in {} files and {} directories in {}",
            format_size(bytes),
            format_count(files),
            format_count(directories),
            format_duration(busy)
        ),
        format!("Average rate of {}", format_rate(bytes, speed)),
    ];

    if !wait.is_zero() {
        lines.push(format!(
            "Spent {} waiting for user input",
            format_duration(wait)
        ));
    }

    lines
}

pub fn format_size(bytes: u64) -> String {
    let value = bytes as f64;

    if value > TIB {
        format!("{:.3} TiB", value / TIB)
    } else if value > GIB {
        format!("{:.3} GiB", value / GIB)
    } else if value > MIB {
        format!("{:.3} MiB", value / MIB)
    } else if value > KIB {
        format!("{:.3} KiB", value / KIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// The rate unit follows the total size, not the rate itself.
fn format_rate(bytes: u64, speed: f64) -> String {
    let total = bytes as f64;

    if total > MIB {
        format!(
            "{:.3} MiB/sec ({:.3} GiB/min; {:.3} TiB/hr)",
            speed / MIB,
            speed / GIB * 60.0,
            speed / TIB * 3600.0
        )
    } else if total > KIB {
        format!("{:.3} KiB/sec", speed / KIB)
    } else {
        format!("{:.3} bytes/sec", speed)
    }
}

/// Formats a count with `,` as thousands separator.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Formats a duration as `H:MM:SS` with microseconds when non-zero.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let micros = duration.subsec_micros();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if micros == 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, micros)
    }
}
