// ============================================================
// Layer 2 — SummaryUseCase
// ============================================================
// Class-level numbers over the stored rows: the outcome
// distribution, the mean of each indicator, and ten-bin
// histograms of the mid-term, final-term and GPA columns.
// Means and histograms only count numeric cells, so a blank or
// text cell never drags a mean to zero. Histogram bins are equal
// width over the column's accepted range; the last bin includes
// the upper edge and values outside the range are not binned.

use anyhow::Result;
use serde::Serialize;
use std::fmt;

use crate::domain::student::{FieldValue, Outcome, StudentRecord, FEATURE_RANGES};
use crate::domain::traits::RecordStore;

pub const HISTOGRAM_BINS: usize = 10;

/// Equal-width bin counts over [lo, hi]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Histogram {
    pub lo:     f64,
    pub hi:     f64,
    pub counts: [usize; HISTOGRAM_BINS],
}

impl Histogram {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi, counts: [0; HISTOGRAM_BINS] }
    }

    /// Count `v`; returns false when it falls outside [lo, hi].
    pub fn add(&mut self, v: f64) -> bool {
        if !(self.lo..=self.hi).contains(&v) {
            return false;
        }
        let width = (self.hi - self.lo) / HISTOGRAM_BINS as f64;
        let bin   = (((v - self.lo) / width) as usize).min(HISTOGRAM_BINS - 1);
        self.counts[bin] += 1;
        true
    }

    /// Lower edge of each bin
    pub fn edges(&self) -> impl Iterator<Item = f64> + '_ {
        let width = (self.hi - self.lo) / HISTOGRAM_BINS as f64;
        (0..HISTOGRAM_BINS).map(move |i| self.lo + width * i as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClassSummary {
    pub total:      usize,
    pub pass:       usize,
    pub fail:       usize,
    pub unlabelled: usize,
    pub mean_attendance:        Option<f64>,
    pub mean_mid_term_marks:    Option<f64>,
    pub mean_final_term_marks:  Option<f64>,
    pub mean_previous_gpa:      Option<f64>,
    pub mid_term_histogram:     Histogram,
    pub final_term_histogram:   Histogram,
    pub previous_gpa_histogram: Histogram,
}

impl ClassSummary {
    pub fn from_records(records: &[StudentRecord]) -> Self {
        let count = |o: Option<Outcome>| records.iter().filter(|r| r.outcome == o).count();
        let mean  = |cell: fn(&StudentRecord) -> &FieldValue| {
            let values: Vec<f64> = records.iter().filter_map(|r| cell(r).as_number()).collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };
        let histogram = |cell: fn(&StudentRecord) -> &FieldValue, (lo, hi): (f64, f64)| {
            let mut h = Histogram::new(lo, hi);
            for v in records.iter().filter_map(|r| cell(r).as_number()) {
                h.add(v);
            }
            h
        };
        let [_, mid_term_range, gpa_range] = FEATURE_RANGES;

        Self {
            total:      records.len(),
            pass:       count(Some(Outcome::Pass)),
            fail:       count(Some(Outcome::Fail)),
            unlabelled: count(None),
            mean_attendance:        mean(|r| &r.attendance),
            mean_mid_term_marks:    mean(|r| &r.mid_term_marks),
            mean_final_term_marks:  mean(|r| &r.final_term_marks),
            mean_previous_gpa:      mean(|r| &r.previous_gpa),
            mid_term_histogram:     histogram(|r| &r.mid_term_marks, mid_term_range),
            final_term_histogram:   histogram(|r| &r.final_term_marks, (0.0, 100.0)),
            previous_gpa_histogram: histogram(|r| &r.previous_gpa, gpa_range),
        }
    }
}

impl fmt::Display for ClassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        writeln!(f, "Students:   {}", self.total)?;
        writeln!(f, "Pass:       {}", self.pass)?;
        writeln!(f, "Fail:       {}", self.fail)?;
        if self.unlabelled > 0 {
            writeln!(f, "Unlabelled: {}", self.unlabelled)?;
        }
        writeln!(f)?;
        writeln!(f, "Mean attendance:       {}", show(self.mean_attendance))?;
        writeln!(f, "Mean mid-term marks:   {}", show(self.mean_mid_term_marks))?;
        writeln!(f, "Mean final-term marks: {}", show(self.mean_final_term_marks))?;
        write!(f,   "Mean previous GPA:     {}", show(self.mean_previous_gpa))?;

        for (title, h) in [
            ("Mid-term marks", &self.mid_term_histogram),
            ("Final-term marks", &self.final_term_histogram),
            ("Previous GPA", &self.previous_gpa_histogram),
        ] {
            writeln!(f, "\n\n{title} distribution:")?;
            let width = (h.hi - h.lo) / HISTOGRAM_BINS as f64;
            for (lo, n) in h.edges().zip(h.counts) {
                write!(f, "\n  {:>6.1} – {:<6.1} {:>4} {}", lo, lo + width, n, "#".repeat(n))?;
            }
        }
        Ok(())
    }
}

pub struct SummaryUseCase<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> SummaryUseCase<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<ClassSummary> {
        let records = self.store.read_all()?;
        let summary = ClassSummary::from_records(&records);
        tracing::debug!("Summarised {} rows", summary.total);
        Ok(summary)
    }
}
