use std::io::prelude::*;

use itertools::Itertools;
use serde::Serialize;
use serde_json::{json, Value};
use vid_loop_finder_lib::{time_label, LoopCandidate, ReferenceMatch, Scan, SimilarPair};

use super::Sorting;

/// The printable face of a single analysis result.
pub trait ResultRow: Serialize {
    fn indices(&self) -> Vec<u64>;
    fn score(&self) -> f64;
    fn describe(&self, fps: f64) -> String;

    fn time_labels(&self, fps: f64) -> Vec<String> {
        self.indices().into_iter().map(|i| time_label(i, fps)).collect()
    }
}

fn frame_at(index: u64, fps: f64) -> String {
    format!("{} (frame {index})", time_label(index, fps))
}

impl ResultRow for SimilarPair {
    fn indices(&self) -> Vec<u64> {
        vec![self.first, self.second]
    }

    fn score(&self) -> f64 {
        self.similarity
    }

    fn describe(&self, fps: f64) -> String {
        format!(
            "{} <-> {}  similarity {:.3}",
            frame_at(self.first, fps),
            frame_at(self.second, fps),
            self.similarity
        )
    }
}

impl ResultRow for ReferenceMatch {
    fn indices(&self) -> Vec<u64> {
        vec![self.index]
    }

    fn score(&self) -> f64 {
        self.similarity
    }

    fn describe(&self, fps: f64) -> String {
        format!("{}  similarity {:.3}", frame_at(self.index, fps), self.similarity)
    }
}

impl ResultRow for LoopCandidate {
    fn indices(&self) -> Vec<u64> {
        vec![self.start, self.end]
    }

    fn score(&self) -> f64 {
        self.ssim
    }

    fn describe(&self, fps: f64) -> String {
        format!(
            "{} -> {}  ssim {:.3}  length {:.2}s",
            frame_at(self.start, fps),
            frame_at(self.end, fps),
            self.ssim,
            self.len_frames() as f64 / fps
        )
    }
}

/// The results of one analysis, ready to be sorted, filtered and printed.
#[derive(Debug, Clone)]
pub struct SearchOutput<T> {
    title: &'static str,
    fps: f64,
    scan: Scan<T>,
}

impl<T: ResultRow> SearchOutput<T> {
    pub fn new(title: &'static str, fps: f64, scan: Scan<T>) -> Self {
        Self { title, fps, scan }
    }

    pub fn len(&self) -> usize {
        self.scan.len()
    }

    pub fn sort(&mut self, sorting: Sorting) {
        match sorting {
            Sorting::Index => self.scan.results.sort_by_key(|r| r.indices()),
            Sorting::Similarity => self.scan.results.sort_by(|a, b| b.score().total_cmp(&a.score())),
            Sorting::RevSimilarity => self.scan.results.sort_by(|a, b| a.score().total_cmp(&b.score())),
        }
    }

    /// Keep only the results where one of the timestamps or frame numbers contains `query`.
    pub fn filter(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let fps = self.fps;
        self.scan.results.retain(|row| {
            row.time_labels(fps).iter().any(|label| label.contains(query))
                || row.indices().iter().any(|i| i.to_string().contains(query))
        });
    }

    pub fn write_normal(&self, mut out: impl Write) -> std::io::Result<()> {
        writeln!(out, "{} ({}):", self.title, self.len())?;
        for row in &self.scan.results {
            writeln!(out, "    {}", row.describe(self.fps))?;
        }
        if self.scan.summary.cancelled {
            writeln!(out, "    (cancelled, results are incomplete)")?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let results = self
            .scan
            .results
            .iter()
            .map(|row| {
                let mut value = serde_json::to_value(row)?;
                if let Value::Object(map) = &mut value {
                    map.insert("time_labels".to_string(), json!(row.time_labels(self.fps)));
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        Ok(json!({
            "results": results,
            "summary": self.scan.summary,
        }))
    }

    pub fn log_summary(&self) {
        let summary = &self.scan.summary;
        info!(
            target: "app",
            "{}: {} results from {} frames ({} compared, {} comparisons)",
            self.title,
            self.len(),
            summary.frames_decoded,
            summary.frames_evaluated,
            summary.comparisons
        );
        if summary.decode_gaps > 0 {
            warn!(target: "app", "{}: {} frames could not be decoded", self.title, summary.decode_gaps);
        }
        if summary.comparison_failures > 0 {
            warn!(
                target: "app",
                "{}: {} frame pairs could not be compared",
                self.title,
                summary.comparison_failures
            );
        }
        debug!(
            target: "app",
            "{}: indices {}",
            self.title,
            self.scan.results.iter().map(|r| r.indices().iter().join("/")).join(", ")
        );
    }
}
