/// Column count of the classic `jstat -gc` layout:
/// S0C S1C S0U S1U EC EU OC OU PC PU YGC YGCT FGC FGCT GCT
pub const JSTAT_GC_COLUMNS: usize = 15;

/// Capacity and occupancy of one heap region, in kB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub capacity_kb: f64,
    pub used_kb:     f64,
}

/// Young/full collection counters from the tail of a `jstat -gc` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcCounters {
    pub young_count: u64,
    pub young_secs:  f64,
    pub full_count:  u64,
    pub full_secs:   f64,
    pub total_secs:  f64,
}

/// One parsed row of `jstat -gc <pid>` output.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub survivor0: Region,
    pub survivor1: Region,
    pub eden:      Region,
    pub old:       Region,
    /// PermGen on older JVMs, Metaspace on newer ones.
    pub metadata:  Region,
    /// Only present when the row has exactly the classic 15 columns;
    /// newer JVMs insert extra columns before the counters.
    pub gc:        Option<GcCounters>,
}

impl MemoryRecord {
    /// Build a record from one row of tokens. The first ten columns are
    /// the same on every JVM generation, so longer rows (Java 8+ adds
    /// CCSC/CCSU, Java 9+ adds CGC/CGCT) still size correctly.
    ///
    /// Survivor columns are not pairwise: both capacities come first
    /// (S0C S1C), then both used figures (S0U S1U). Eden, old and metadata
    /// are capacity/used pairs.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Option<Self> {
        if tokens.len() < JSTAT_GC_COLUMNS { return None; }

        let kb = |i: usize| -> Option<f64> {
            let raw = tokens.get(i)?.as_ref();
            // Collectors without a given space (ZGC, Shenandoah young gen) print "-"
            if raw == "-" { return Some(0.0); }
            let v: f64 = raw.parse().ok()?;
            if v.is_finite() && v >= 0.0 { Some(v) } else { None }
        };
        let region = |c: usize| -> Option<Region> {
            Some(Region { capacity_kb: kb(c)?, used_kb: kb(c + 1)? })
        };

        let gc = if tokens.len() == JSTAT_GC_COLUMNS {
            let count = |i: usize| tokens.get(i).and_then(|t| t.as_ref().parse::<u64>().ok());
            match (count(10), kb(11), count(12), kb(13), kb(14)) {
                (Some(young_count), Some(young_secs), Some(full_count), Some(full_secs), Some(total_secs)) => {
                    Some(GcCounters { young_count, young_secs, full_count, full_secs, total_secs })
                }
                _ => None,
            }
        } else {
            None
        };

        Some(MemoryRecord {
            survivor0: Region { capacity_kb: kb(0)?, used_kb: kb(2)? },
            survivor1: Region { capacity_kb: kb(1)?, used_kb: kb(3)? },
            eden:      region(4)?,
            old:       region(6)?,
            metadata:  region(8)?,
            gc,
        })
    }

    /// Sum of the used columns: what a heap dump will roughly occupy on disk.
    pub fn used_kb(&self) -> f64 {
        self.survivor0.used_kb
            + self.survivor1.used_kb
            + self.eden.used_kb
            + self.old.used_kb
            + self.metadata.used_kb
    }

    pub fn capacity_kb(&self) -> f64 {
        [self.survivor0, self.survivor1, self.eden, self.old, self.metadata]
            .iter()
            .map(|r| r.capacity_kb)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_classic_row_with_counters() {
        let row = "512.0 512.0 10.0 20.0 4096.0 300.0 10240.0 4000.0 21248.0 50.0 7 0.042 1 0.031 0.073";
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let rec = MemoryRecord::from_tokens(&tokens).unwrap();

        assert_eq!(rec.survivor0, Region { capacity_kb: 512.0, used_kb: 10.0 });
        assert_eq!(rec.survivor1, Region { capacity_kb: 512.0, used_kb: 20.0 });
        assert_eq!(rec.eden, Region { capacity_kb: 4096.0, used_kb: 300.0 });
        assert_eq!(rec.metadata.used_kb, 50.0);
        assert_eq!(rec.used_kb(), 4380.0);
        assert_eq!(rec.capacity_kb(), 512.0 + 512.0 + 4096.0 + 10240.0 + 21248.0);
        let gc = rec.gc.unwrap();
        assert_eq!(gc.young_count, 7);
        assert_eq!(gc.full_count, 1);
    }

    #[test]
    fn java8_row_sizes_from_leading_columns() {
        // S0C S1C S0U S1U EC EU OC OU MC MU CCSC CCSU YGC YGCT FGC FGCT GCT
        let row = "1024.0 1024.0 0.0 512.0 8192.0 2048.0 20480.0 10000.0 4864.0 4500.0 512.0 400.0 3 0.010 0 0.000 0.010";
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let rec = MemoryRecord::from_tokens(&tokens).unwrap();

        assert_eq!(rec.used_kb(), 512.0 + 2048.0 + 10000.0 + 4500.0);
        assert!(rec.gc.is_none());
    }

    #[test]
    fn rejects_short_or_garbled_rows() {
        assert!(MemoryRecord::from_tokens(&["1.0", "2.0", "3.0"]).is_none());

        let mut tokens = vec!["1.0"; JSTAT_GC_COLUMNS];
        tokens[5] = "n/a";
        assert!(MemoryRecord::from_tokens(&tokens).is_none());

        tokens[5] = "-12.0";
        assert!(MemoryRecord::from_tokens(&tokens).is_none());
    }

    #[test]
    fn dash_columns_count_as_empty() {
        // ZGC: no survivor or eden spaces
        let row = "- - - - - - 52428800.0 41943040.0 65536.0 60000.0 0 0.000 12 1.250 1.250";
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let rec = MemoryRecord::from_tokens(&tokens).unwrap();

        assert_eq!(rec.eden, Region { capacity_kb: 0.0, used_kb: 0.0 });
        assert_eq!(rec.used_kb(), 41943040.0 + 60000.0);
    }
}
