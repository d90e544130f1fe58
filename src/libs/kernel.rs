use crate::libs::spectrum::KmerVector;
use rayon::prelude::*;

/// Spectrum kernel value for two extracted spectra
pub fn kernel(a: &KmerVector, b: &KmerVector) -> f64 {
    a.dot(b)
}

/// Rectangular kernel matrix, one row per entry of `rows`. Rows are
/// computed in parallel on the global pool.
pub fn kernel_matrix(rows: &[KmerVector], cols: &[KmerVector]) -> Vec<Vec<f64>> {
    rows.par_iter()
        .map(|r| cols.iter().map(|c| r.dot(c)).collect())
        .collect()
}

/// Symmetric Gram matrix. The upper triangle is computed once, in
/// parallel, and mirrored.
pub fn gram(vectors: &[KmerVector]) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| (i..n).map(|j| vectors[i].dot(&vectors[j])).collect())
        .collect();

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in upper.iter().enumerate() {
        for (offset, &value) in row.iter().enumerate() {
            let j = i + offset;
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }

    matrix
}
