//! Progress parsing from yt-dlp output lines
//!
//! All knowledge of the textual progress marker format lives here, as a pure
//! function over single lines plus a small stateful tracker that enforces the
//! monotonicity contract consumers rely on. Nothing in this module spawns a
//! process.

/// One parsed progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Percent complete, clamped to 0..=100
    pub percent: u8,
    /// Total size in bytes when the line carried one
    pub total_bytes: Option<u64>,
    /// Bytes downloaded so far, derived from percent and total
    pub downloaded_bytes: Option<u64>,
}

/// Parses progress from a yt-dlp output line.
/// Example: "[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10"
pub fn parse_progress(line: &str) -> Option<ProgressUpdate> {
    if !line.contains("[download]") || !line.contains('%') {
        return None;
    }

    let mut percent = None;
    let mut total_bytes = None;

    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if part.ends_with('%') {
            if let Ok(p) = part.trim_end_matches('%').parse::<f32>() {
                // Clamp so garbage lines can never jump a job to 100%
                percent = Some(p.clamp(0.0, 100.0) as u8);
            }
        }

        // Size token: "of 10.00MiB" (or "of ~10.00MiB" on estimated totals)
        if *part == "of" && i + 1 < parts.len() {
            if let Some(size) = parse_size(parts[i + 1].trim_start_matches('~')) {
                total_bytes = Some(size);
            }
        }
    }

    let percent = percent?;
    let downloaded_bytes = total_bytes.map(|total| (total as f64 * (percent as f64 / 100.0)) as u64);

    Some(ProgressUpdate {
        percent,
        total_bytes,
        downloaded_bytes,
    })
}

/// Parses a size token like "10.00MiB" or "500.00KiB" into bytes.
fn parse_size(size_str: &str) -> Option<u64> {
    let size_str = size_str.trim_end_matches("/s");
    if let Some(mb) = size_str.strip_suffix("MiB") {
        return mb.parse::<f64>().ok().map(|v| (v * 1024.0 * 1024.0) as u64);
    }
    if let Some(kb) = size_str.strip_suffix("KiB") {
        return kb.parse::<f64>().ok().map(|v| (v * 1024.0) as u64);
    }
    if let Some(gb) = size_str.strip_suffix("GiB") {
        return gb.parse::<f64>().ok().map(|v| (v * 1024.0 * 1024.0 * 1024.0) as u64);
    }
    if let Some(b) = size_str.strip_suffix("B") {
        return b.parse::<f64>().ok().map(|v| v as u64);
    }
    None
}

/// Forwards only strictly increasing percents and guarantees a terminal 100%.
///
/// yt-dlp repeats and occasionally reorders progress lines (separate video
/// and audio streams each run 0→100); consumers are promised a monotonic
/// non-decreasing sequence, so duplicates and regressions are suppressed
/// here. `finish` synthesizes the final sample if the process's last line
/// stopped short of 100.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_forwarded: Option<u8>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the update to forward, or None when it would violate
    /// monotonicity.
    pub fn advance(&mut self, update: ProgressUpdate) -> Option<ProgressUpdate> {
        match self.last_forwarded {
            Some(last) if update.percent <= last => None,
            _ => {
                self.last_forwarded = Some(update.percent);
                Some(update)
            }
        }
    }

    /// Synthesizes the terminal 100% sample unless one was already forwarded.
    pub fn finish(&mut self, file_size_bytes: u64) -> Option<ProgressUpdate> {
        if self.last_forwarded == Some(100) {
            return None;
        }
        self.last_forwarded = Some(100);
        Some(ProgressUpdate {
            percent: 100,
            total_bytes: Some(file_size_bytes),
            downloaded_bytes: Some(file_size_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_typical_line() {
        let update = parse_progress("[download]  45.2% of 10.00MiB at 500.00KiB/s ETA 00:10").unwrap();
        assert_eq!(update.percent, 45);
        assert_eq!(update.total_bytes, Some(10 * 1024 * 1024));
        assert!(update.downloaded_bytes.unwrap() > 4 * 1024 * 1024);
    }

    #[test]
    fn parses_estimated_total() {
        let update = parse_progress("[download]   2.0% of ~123.45MiB at 1.23MiB/s ETA 00:42").unwrap();
        assert_eq!(update.percent, 2);
        assert!(update.total_bytes.is_some());
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert_eq!(parse_progress("[download] Destination: /tmp/video.mp4"), None);
        assert_eq!(parse_progress("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_progress(""), None);
    }

    #[test]
    fn clamps_out_of_range_percents() {
        let update = parse_progress("[download] 250.0% of 10.00MiB").unwrap();
        assert_eq!(update.percent, 100);
    }

    #[test]
    fn parses_size_units() {
        assert_eq!(parse_size("500.00KiB"), Some(512_000));
        assert_eq!(parse_size("1.00GiB"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size("2.00MiB/s"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("nonsense"), None);
    }

    #[test]
    fn tracker_suppresses_duplicates_and_regressions() {
        let mut tracker = ProgressTracker::new();
        let sample = |p| ProgressUpdate {
            percent: p,
            total_bytes: None,
            downloaded_bytes: None,
        };

        assert!(tracker.advance(sample(10)).is_some());
        assert!(tracker.advance(sample(25)).is_some());
        assert!(tracker.advance(sample(25)).is_none());
        assert!(tracker.advance(sample(20)).is_none());
        assert!(tracker.advance(sample(60)).is_some());
    }

    #[test]
    fn tracker_synthesizes_final_sample() {
        let mut tracker = ProgressTracker::new();
        tracker.advance(ProgressUpdate {
            percent: 97,
            total_bytes: None,
            downloaded_bytes: None,
        });

        let last = tracker.finish(4096).unwrap();
        assert_eq!(last.percent, 100);
        assert_eq!(last.total_bytes, Some(4096));

        // Already at 100 → nothing more to synthesize
        assert!(tracker.finish(4096).is_none());
    }
}
