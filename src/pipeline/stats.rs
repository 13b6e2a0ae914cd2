use std::collections::BTreeMap;
use std::fmt;

/// Statistics from a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Cells that produced at least one target
    pub pixels_processed: usize,
    /// Cells with no selected objects in any class
    pub pixels_empty: usize,
    /// Objects read per class, before selection
    pub objects_read: BTreeMap<String, usize>,
    /// Selected targets per class
    pub targets_selected: BTreeMap<String, usize>,
    /// Stars passing each extragalactic selection (BGS, ELG, LRG, QSO)
    pub contaminants: BTreeMap<String, usize>,
}

impl PipelineStats {
    /// Total number of selected targets
    pub fn total_targets(&self) -> usize {
        self.targets_selected.values().sum()
    }

    /// Fold another cell's statistics into these
    pub fn merge(&mut self, other: &PipelineStats) {
        self.pixels_processed += other.pixels_processed;
        self.pixels_empty += other.pixels_empty;
        for (dst, src) in [
            (&mut self.objects_read, &other.objects_read),
            (&mut self.targets_selected, &other.targets_selected),
            (&mut self.contaminants, &other.contaminants),
        ] {
            for (class, n) in src {
                *dst.entry(class.clone()).or_insert(0) += n;
            }
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selected {} targets in {} cells ({} empty)",
            self.total_targets(),
            self.pixels_processed,
            self.pixels_empty
        )?;
        for (class, n) in &self.targets_selected {
            let read = self.objects_read.get(class).copied().unwrap_or(0);
            write!(f, "\n  {:<10} {:>8} of {:>8}", class, n, read)?;
        }
        if !self.contaminants.is_empty() {
            write!(f, "\n  stellar contaminants:")?;
            for (class, n) in &self.contaminants {
                write!(f, " {}={}", class, n)?;
            }
        }
        Ok(())
    }
}
