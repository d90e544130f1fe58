use crate::libs::error::KspecError;
use crate::libs::kernel::gram;
use crate::libs::spectrum::{extract, KmerVector, SpectrumParams};
use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

//----------------------------
// SMO solver
//----------------------------

/// Dual coefficients and bias from one solver run
#[derive(Debug, Clone)]
pub struct SvmFit {
    pub alpha: Vec<f64>,
    pub bias: f64,
    pub iterations: usize,
}

struct Solver<'a> {
    gram: &'a [Vec<f64>],
    labels: &'a [f64],
    c: f64,
    eps: f64,
    alpha: Vec<f64>,
    // running decision values Σ_j α_j y_j K[i][j], bias excluded
    fcache: Vec<f64>,
    bias: f64,
}

impl Solver<'_> {
    fn error(&self, i: usize) -> f64 {
        self.fcache[i] + self.bias - self.labels[i]
    }

    /// Joint optimization of the pair (i, j); returns whether the pair moved
    fn take_step(&mut self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }

        let (a_i_old, a_j_old) = (self.alpha[i], self.alpha[j]);
        let (y_i, y_j) = (self.labels[i], self.labels[j]);
        let (e_i, e_j) = (self.error(i), self.error(j));

        let (low, high) = if y_i != y_j {
            (
                (a_j_old - a_i_old).max(0.0),
                self.c.min(self.c + a_j_old - a_i_old),
            )
        } else {
            (
                (a_i_old + a_j_old - self.c).max(0.0),
                self.c.min(a_i_old + a_j_old),
            )
        };
        if low >= high {
            return false;
        }

        let eta = 2.0 * self.gram[i][j] - self.gram[i][i] - self.gram[j][j];
        if eta >= 0.0 {
            return false;
        }

        let mut a_j = a_j_old - y_j * (e_i - e_j) / eta;
        a_j = a_j.clamp(low, high);
        if (a_j - a_j_old).abs() < self.eps * (a_j + a_j_old + self.eps) {
            return false;
        }
        let a_i = a_i_old + y_i * y_j * (a_j_old - a_j);

        let b1 = self.bias
            - e_i
            - y_i * (a_i - a_i_old) * self.gram[i][i]
            - y_j * (a_j - a_j_old) * self.gram[i][j];
        let b2 = self.bias
            - e_j
            - y_i * (a_i - a_i_old) * self.gram[i][j]
            - y_j * (a_j - a_j_old) * self.gram[j][j];
        self.bias = if a_i > 0.0 && a_i < self.c {
            b1
        } else if a_j > 0.0 && a_j < self.c {
            b2
        } else {
            (b1 + b2) / 2.0
        };

        let (d_i, d_j) = (y_i * (a_i - a_i_old), y_j * (a_j - a_j_old));
        for m in 0..self.labels.len() {
            self.fcache[m] += d_i * self.gram[i][m] + d_j * self.gram[j][m];
        }

        self.alpha[i] = a_i;
        self.alpha[j] = a_j;
        true
    }

    fn examine(&mut self, i: usize) -> bool {
        let e_i = self.error(i);
        let r_i = e_i * self.labels[i];
        let violates = (r_i < -self.eps && self.alpha[i] < self.c)
            || (r_i > self.eps && self.alpha[i] > 0.0);
        if !violates {
            return false;
        }

        // second choice: the largest |E_i - E_j| step
        let n = self.labels.len();
        let mut best = None;
        let mut best_gap = 0.0;
        for j in 0..n {
            if j == i {
                continue;
            }
            let gap = (e_i - self.error(j)).abs();
            if gap > best_gap {
                best_gap = gap;
                best = Some(j);
            }
        }
        if let Some(j) = best {
            if self.take_step(i, j) {
                return true;
            }
        }

        // fall back to any pair that makes progress
        for j in 0..n {
            if j != i && best != Some(j) && self.take_step(i, j) {
                return true;
            }
        }

        false
    }
}

/// Solves the soft-margin dual QP over a precomputed kernel matrix with
/// sequential minimal optimization.
///
/// `labels` must be +1/-1 with both classes present. A full pass with no
/// pair updates means every example satisfies its KKT condition within
/// `eps`; exhausting `max_iter` passes before that is a convergence
/// failure, not a usable model.
pub fn fit(
    gram: &[Vec<f64>],
    labels: &[f64],
    c: f64,
    eps: f64,
    max_iter: usize,
) -> Result<SvmFit, KspecError> {
    let n = labels.len();
    if gram.len() != n {
        return Err(KspecError::DimensionMismatch {
            expected: n,
            found: gram.len(),
        });
    }
    if let Some(row) = gram.iter().find(|row| row.len() != n) {
        return Err(KspecError::DimensionMismatch {
            expected: n,
            found: row.len(),
        });
    }
    if labels.iter().any(|&y| y != 1.0 && y != -1.0) {
        return Err(KspecError::InvalidInput(
            "labels must be +1 or -1".to_string(),
        ));
    }
    let positives = labels.iter().filter(|&&y| y > 0.0).count();
    if positives == 0 || positives == n {
        return Err(KspecError::InvalidInput(
            "training set contains a single class".to_string(),
        ));
    }
    if c <= 0.0 {
        return Err(KspecError::InvalidInput("C must be positive".to_string()));
    }
    if eps <= 0.0 {
        return Err(KspecError::InvalidInput("eps must be positive".to_string()));
    }
    if max_iter == 0 {
        return Err(KspecError::InvalidInput(
            "iteration budget must be positive".to_string(),
        ));
    }

    let mut solver = Solver {
        gram,
        labels,
        c,
        eps,
        alpha: vec![0.0; n],
        fcache: vec![0.0; n],
        bias: 0.0,
    };

    let mut iterations = 0;
    loop {
        let mut changed = 0;
        for i in 0..n {
            if solver.examine(i) {
                changed += 1;
            }
        }
        iterations += 1;
        if changed == 0 {
            break;
        }
        if iterations >= max_iter {
            return Err(KspecError::Convergence { iterations });
        }
    }

    // bias from the KKT conditions at free support vectors; the running
    // estimate stays when every support vector sits on the C bound
    let free: Vec<usize> = (0..n)
        .filter(|&i| solver.alpha[i] > 0.0 && solver.alpha[i] < c)
        .collect();
    if !free.is_empty() {
        let sum: f64 = free.iter().map(|&i| labels[i] - solver.fcache[i]).sum();
        solver.bias = sum / free.len() as f64;
    }

    Ok(SvmFit {
        alpha: solver.alpha,
        bias: solver.bias,
        iterations,
    })
}

//----------------------------
// Model
//----------------------------

/// A fitted spectrum-SVM classifier. Immutable once written; loading
/// re-checks the support/coefficient invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub params: SpectrumParams,
    pub window_size: usize,
    pub c: f64,
    pub eps: f64,
    pub bias: f64,
    pub iterations: usize,
    /// alpha_i * y_i, one per support vector
    pub coefs: Vec<f64>,
    pub support: Vec<KmerVector>,
    /// window identities of the support vectors
    pub support_ids: Vec<String>,
}

impl Model {
    pub fn save(&self, output: &str) -> anyhow::Result<()> {
        let mut writer = crate::writer(output)?;
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn load(input: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(input)?;
        let model: Model = serde_json::from_reader(reader)
            .with_context(|| format!("malformed model file {}", input))?;
        if model.coefs.len() != model.support.len()
            || model.support_ids.len() != model.support.len()
        {
            return Err(KspecError::DimensionMismatch {
                expected: model.support.len(),
                found: model.coefs.len(),
            }
            .into());
        }

        Ok(model)
    }

    /// Decision score against the stored support vectors
    pub fn decision(&self, query: &KmerVector) -> f64 {
        let mut score = self.bias;
        for (coef, sv) in self.coefs.iter().zip(&self.support) {
            score += coef * sv.dot(query);
        }
        score
    }

    /// Scores every query, preserving input order
    pub fn predict(&self, queries: &[KmerVector]) -> Vec<f64> {
        queries.par_iter().map(|q| self.decision(q)).collect()
    }
}

/// One scored window; `score > 0` reads as foreground-like
#[derive(Debug, Clone)]
pub struct Prediction {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{:.6}",
            self.name, self.start, self.end, self.score
        )
    }
}

//----------------------------
// Pipeline entry points
//----------------------------

/// Extracts spectra for the labeled windows, assembles the Gram matrix
/// in parallel and fits the classifier.
#[allow(clippy::too_many_arguments)]
pub fn fit_spectrum_svm(
    seqs: &[&[u8]],
    ids: &[String],
    labels: &[f64],
    params: &SpectrumParams,
    window_size: usize,
    c: f64,
    eps: f64,
    max_iter: usize,
) -> anyhow::Result<Model> {
    if seqs.len() != labels.len() {
        return Err(KspecError::DimensionMismatch {
            expected: seqs.len(),
            found: labels.len(),
        }
        .into());
    }
    if seqs.len() != ids.len() {
        return Err(KspecError::DimensionMismatch {
            expected: seqs.len(),
            found: ids.len(),
        }
        .into());
    }

    let vectors: Vec<KmerVector> = seqs
        .par_iter()
        .map(|s| extract(s, params))
        .collect::<Result<_, _>>()?;
    let matrix = gram(&vectors);
    let solved = fit(&matrix, labels, c, eps, max_iter)?;

    let mut coefs = vec![];
    let mut support = vec![];
    let mut support_ids = vec![];
    for (i, &a) in solved.alpha.iter().enumerate() {
        if a > 0.0 {
            coefs.push(a * labels[i]);
            support.push(vectors[i].clone());
            support_ids.push(ids[i].clone());
        }
    }

    Ok(Model {
        params: params.clone(),
        window_size,
        c,
        eps,
        bias: solved.bias,
        iterations: solved.iterations,
        coefs,
        support,
        support_ids,
    })
}

/// Scores raw sequences with a fitted model, preserving input order
pub fn predict_spectrum_svm(model: &Model, seqs: &[&[u8]]) -> anyhow::Result<Vec<f64>> {
    let vectors: Vec<KmerVector> = seqs
        .par_iter()
        .map(|s| extract(s, &model.params))
        .collect::<Result<_, _>>()?;

    Ok(model.predict(&vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn toy() -> (Vec<&'static [u8]>, Vec<String>, Vec<f64>, SpectrumParams) {
        let seqs: Vec<&[u8]> = vec![b"AAAAAAAA", b"AAAAAAAA", b"TTTTTTTT", b"TTTTTTTT"];
        let ids = (0..4).map(|i| format!("toy:{}", i)).collect();
        let labels = vec![1.0, 1.0, -1.0, -1.0];
        let params = SpectrumParams::new(1, "ACGT", false).unwrap();
        (seqs, ids, labels, params)
    }

    #[test]
    fn test_fit_separates_toy_classes() {
        let (seqs, ids, labels, params) = toy();
        let model = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1000).unwrap();
        let scores = predict_spectrum_svm(&model, &seqs).unwrap();

        for (score, label) in scores.iter().zip(&labels) {
            assert!(score * label > 0.0, "score {} for label {}", score, label);
        }
    }

    #[test]
    fn test_fit_near_hard_margin() {
        let (seqs, ids, labels, params) = toy();
        let model = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1000).unwrap();
        let scores = predict_spectrum_svm(&model, &seqs).unwrap();

        // well-separated data with a large C puts the margins at +-1
        assert_relative_eq!(scores[0], 1.0, epsilon = 0.05);
        assert_relative_eq!(scores[2], -1.0, epsilon = 0.05);
        assert_relative_eq!(model.bias, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_fit_single_class() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let res = fit(&matrix, &[1.0, 1.0], 1.0, 1e-3, 100);
        assert!(matches!(res, Err(KspecError::InvalidInput(_))));
    }

    #[test]
    fn test_fit_bad_labels() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let res = fit(&matrix, &[1.0, 0.5], 1.0, 1e-3, 100);
        assert!(matches!(res, Err(KspecError::InvalidInput(_))));
    }

    #[test]
    fn test_fit_dimension_mismatch() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let res = fit(&matrix, &[1.0, -1.0, 1.0], 1.0, 1e-3, 100);
        assert!(matches!(res, Err(KspecError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_fit_budget_exhausted() {
        let (seqs, ids, labels, params) = toy();
        let res = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1);
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KspecError>(),
            Some(KspecError::Convergence { .. })
        ));
    }

    #[test]
    fn test_fit_does_not_mutate_gram() {
        let params = SpectrumParams::new(1, "ACGT", false).unwrap();
        let vectors: Vec<KmerVector> = [b"AAAAAAAA".as_slice(), b"TTTTTTTT".as_slice()]
            .iter()
            .map(|s| extract(s, &params).unwrap())
            .collect();
        let matrix = gram(&vectors);
        let before = matrix.clone();

        fit(&matrix, &[1.0, -1.0], 10.0, 1e-3, 1000).unwrap();
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_support_vectors_subset() {
        let (seqs, ids, labels, params) = toy();
        let model = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1000).unwrap();

        assert!(!model.support.is_empty());
        assert!(model.support.len() <= seqs.len());
        assert_eq!(model.coefs.len(), model.support.len());
        assert_eq!(model.support_ids.len(), model.support.len());
        // dual feasibility: sum of alpha_i y_i is zero
        let balance: f64 = model.coefs.iter().sum();
        assert_relative_eq!(balance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_predict_idempotent() {
        let (seqs, ids, labels, params) = toy();
        let model = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1000).unwrap();

        let first = predict_spectrum_svm(&model, &seqs).unwrap();
        let second = predict_spectrum_svm(&model, &seqs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_model_roundtrip() {
        let (seqs, ids, labels, params) = toy();
        let model = fit_spectrum_svm(&seqs, &ids, &labels, &params, 8, 10.0, 1e-3, 1000).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(path.to_str().unwrap()).unwrap();
        let loaded = Model::load(path.to_str().unwrap()).unwrap();

        assert_eq!(loaded.params, model.params);
        assert_eq!(
            predict_spectrum_svm(&loaded, &seqs).unwrap(),
            predict_spectrum_svm(&model, &seqs).unwrap()
        );
    }
}
