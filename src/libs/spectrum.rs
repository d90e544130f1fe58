use crate::libs::error::KspecError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

//----------------------------
// SpectrumParams
//----------------------------

/// K-mer spectrum configuration, validated once at construction.
///
/// `alphabet` is stored uppercased; k-mer ranks are the base-|alphabet|
/// encoding of the k-mer, so `|alphabet|^k` must fit in a u64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumParams {
    pub k: usize,
    pub alphabet: String,
    pub use_sign: bool,
}

impl SpectrumParams {
    /// ```
    /// # use kspec::libs::spectrum::SpectrumParams;
    /// let params = SpectrumParams::new(2, "acgt", false).unwrap();
    /// assert_eq!(params.alphabet, "ACGT");
    /// assert!(SpectrumParams::new(0, "ACGT", false).is_err());
    /// assert!(SpectrumParams::new(40, "ACGT", false).is_err());
    /// ```
    pub fn new(k: usize, alphabet: &str, use_sign: bool) -> Result<Self, KspecError> {
        if k == 0 {
            return Err(KspecError::InvalidInput("k must be positive".to_string()));
        }
        if alphabet.is_empty() || !alphabet.is_ascii() {
            return Err(KspecError::InvalidInput(
                "alphabet must be non-empty ASCII".to_string(),
            ));
        }

        let alphabet = alphabet.to_ascii_uppercase();
        if alphabet.bytes().duplicates().next().is_some() {
            return Err(KspecError::InvalidInput(format!(
                "alphabet `{}` contains duplicate symbols",
                alphabet
            )));
        }

        // rank encoding capacity
        if k > 64
            || (alphabet.len() as u64)
                .checked_pow(k as u32)
                .is_none()
        {
            return Err(KspecError::InvalidInput(format!(
                "k {} too large for an alphabet of {} symbols",
                k,
                alphabet.len()
            )));
        }

        Ok(Self {
            k,
            alphabet,
            use_sign,
        })
    }

    fn index_of(&self, b: u8) -> Option<u64> {
        self.alphabet
            .bytes()
            .position(|s| s == b.to_ascii_uppercase())
            .map(|i| i as u64)
    }

    fn modulus(&self) -> u64 {
        (self.alphabet.len() as u64).pow(self.k as u32)
    }
}

//----------------------------
// KmerVector
//----------------------------

/// Sparse k-mer spectrum, sorted by rank. The implied dense space has
/// dimension `|alphabet|^k`; only occupied entries are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KmerVector {
    pub ranks: Vec<u64>,
    pub values: Vec<f64>,
}

impl KmerVector {
    pub fn nnz(&self) -> usize {
        self.ranks.len()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Inner product over the shared rank space; merge join on the sorted
    /// ranks, numerically identical to the dense dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        let mut acc = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.ranks.len() && j < other.ranks.len() {
            match self.ranks[i].cmp(&other.ranks[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }

        acc
    }
}

/// Counts every k-mer of the sequence with stride 1. K-mers containing
/// symbols outside the alphabet (ambiguous bases, usually N) are excluded.
/// With `use_sign`, counts collapse to presence (1.0).
pub fn extract(seq: &[u8], params: &SpectrumParams) -> Result<KmerVector, KspecError> {
    let k = params.k;
    if seq.len() < k {
        return Err(KspecError::InvalidInput(format!(
            "sequence length {} shorter than k {}",
            seq.len(),
            k
        )));
    }

    let size = params.alphabet.len() as u64;
    // dropping the leading digit before the shift keeps ranks below
    // |alphabet|^k, so the arithmetic stays within u64
    let divisor = params.modulus() / size;

    // Rolling base-|alphabet| encoding; an out-of-alphabet symbol resets
    // the run, dropping every k-mer that covers it.
    let mut ranks: Vec<u64> = Vec::with_capacity(seq.len() - k + 1);
    let mut rank = 0u64;
    let mut run = 0usize;
    for &b in seq {
        match params.index_of(b) {
            Some(digit) => {
                rank = (rank % divisor) * size + digit;
                run += 1;
                if run >= k {
                    ranks.push(rank);
                }
            }
            None => {
                rank = 0;
                run = 0;
            }
        }
    }

    ranks.sort_unstable();

    let mut vector = KmerVector::default();
    for (count, rank) in ranks.into_iter().dedup_with_count() {
        vector.ranks.push(rank);
        vector.values.push(if params.use_sign {
            1.0
        } else {
            count as f64
        });
    }

    Ok(vector)
}
