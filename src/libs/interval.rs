use crate::libs::error::KspecError;
use anyhow::{bail, Context};
use std::io::BufRead;

//----------------------------
// GenomicInterval
//----------------------------

/// A genomic interval. Coordinates are 0-based, half-open, as in BED.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicInterval {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub strand: Option<char>,
}

impl GenomicInterval {
    /// ```
    /// # use kspec::libs::interval::GenomicInterval;
    /// let iv = GenomicInterval::new("chr1", 100, 850);
    /// assert_eq!(iv.width(), 750);
    /// assert_eq!(iv.to_string(), "chr1\t100\t850");
    /// ```
    pub fn new(name: &str, start: usize, end: usize) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            strand: None,
        }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

impl std::fmt::Display for GenomicInterval {
    /// BED3 representation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.name, self.start, self.end)
    }
}

//----------------------------
// Window
//----------------------------

/// A fixed-width interval produced by `window()`. The width of every window
/// equals the size passed to the windower; nothing else constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    iv: GenomicInterval,
}

impl Window {
    pub fn interval(&self) -> &GenomicInterval {
        &self.iv
    }

    pub fn name(&self) -> &str {
        &self.iv.name
    }

    pub fn start(&self) -> usize {
        self.iv.start
    }

    pub fn end(&self) -> usize {
        self.iv.end
    }

    /// Window identity in `name:start-end` form, 0-based half-open
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.iv.name, self.iv.start, self.iv.end)
    }
}

/// Tiles intervals into adjacent, non-overlapping windows of exactly
/// `window_size` bases, left to right. Each interval's width is truncated
/// down to the largest multiple of `window_size`; the trailing excess is
/// dropped. Intervals narrower than `window_size` produce no windows.
///
/// ```
/// # use kspec::libs::interval::{window, GenomicInterval};
/// let ivs = vec![GenomicInterval::new("chr1", 0, 2300)];
/// let wins = window(&ivs, 750).unwrap();
/// assert_eq!(wins.len(), 3);
/// assert_eq!(wins[2].end(), 2250);
/// ```
pub fn window(
    intervals: &[GenomicInterval],
    window_size: usize,
) -> Result<Vec<Window>, KspecError> {
    if window_size == 0 {
        return Err(KspecError::InvalidInput(
            "window size must be positive".to_string(),
        ));
    }

    let mut windows = vec![];
    for iv in intervals {
        let count = iv.width() / window_size;
        for i in 0..count {
            let start = iv.start + i * window_size;
            windows.push(Window {
                iv: GenomicInterval {
                    name: iv.name.clone(),
                    start,
                    end: start + window_size,
                    strand: iv.strand,
                },
            });
        }
    }

    Ok(windows)
}

//----------------------------
// BED I/O
//----------------------------

/// Reads BED3+ intervals. `#`, `track` and `browser` lines are skipped.
pub fn read_bed(input: &str) -> anyhow::Result<Vec<GenomicInterval>> {
    let reader = crate::reader(input)?;

    let mut intervals = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            bail!("{}: line {}: expected at least 3 BED fields", input, i + 1);
        }

        let start = fields[1]
            .parse::<usize>()
            .with_context(|| format!("{}: line {}: bad start `{}`", input, i + 1, fields[1]))?;
        let end = fields[2]
            .parse::<usize>()
            .with_context(|| format!("{}: line {}: bad end `{}`", input, i + 1, fields[2]))?;
        if start > end {
            bail!("{}: line {}: start {} > end {}", input, i + 1, start, end);
        }

        let mut iv = GenomicInterval::new(fields[0], start, end);
        iv.strand = fields
            .get(5)
            .and_then(|s| s.chars().next())
            .filter(|&c| c == '+' || c == '-');
        intervals.push(iv);
    }

    Ok(intervals)
}

/// Merges overlapping and adjacent intervals per sequence. Sequences keep
/// the order of first appearance; merged runs come out sorted by position.
///
/// Coordinates above i32::MAX are not representable in the underlying sets.
pub fn merge(intervals: &[GenomicInterval]) -> Vec<GenomicInterval> {
    let mut set_of: indexmap::IndexMap<String, intspan::IntSpan> = indexmap::IndexMap::new();
    for iv in intervals {
        if iv.width() == 0 {
            continue;
        }
        let set = set_of
            .entry(iv.name.clone())
            .or_insert_with(intspan::IntSpan::new);
        // IntSpan is 1-based, inclusive
        set.add_pair(iv.start as i32 + 1, iv.end as i32);
    }

    let mut merged = vec![];
    for (name, set) in &set_of {
        let ranges = set.ranges();
        for pair in ranges.chunks(2) {
            merged.push(GenomicInterval::new(
                name,
                pair[0] as usize - 1,
                pair[1] as usize,
            ));
        }
    }

    merged
}
