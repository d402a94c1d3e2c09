//! 参照データとの適合度（ビンごとのカイ二乗）

use alloc::vec::Vec;

use crate::error::FitError;
use crate::record::{Bin, HistogramRecord};

/// 理論値に上乗せする相対不確かさのデフォルト値
pub const DEFAULT_UNCERTAINTY: f64 = 0.05;

impl HistogramRecord {
    /// ビンごとのカイ二乗を計算する
    ///
    /// `self` を理論値（シミュレーション）、`data` を参照データとして扱う。
    ///
    /// ```text
    /// X = (theory - data)² / (σ_data² + σ_theory² + (uncertainty · theory)²)
    /// ```
    ///
    /// σ は差を縮める側の誤差を使う。値の大きい方は `y_err_minus`、
    /// 小さい方は `y_err_plus`。採点側がこの取り方に依存しているので変えないこと。
    ///
    /// - 片方だけ y == 0 のビンは 0
    /// - 分母がちょうど 0 のビンは 0
    /// - 値や誤差が有限でない（NaN / ±∞）ビンは 0
    ///
    /// # エラー
    /// - `FitError::ShapeMismatch`: ビン数が異なる
    /// - `FitError::BothEmpty`: 両方 y == 0 のビンがあった（その時点で打ち切る）
    pub fn chi_squared_per_bin(
        &self,
        data: &HistogramRecord,
        uncertainty: f64,
    ) -> Result<Vec<f64>, FitError> {
        if self.bin_count() != data.bin_count() {
            return Err(FitError::ShapeMismatch {
                theory: self.bin_count(),
                data: data.bin_count(),
            });
        }

        let mut result = Vec::with_capacity(self.bins().len());
        for (i, (t, d)) in self.bins().iter().zip(data.bins()).enumerate() {
            match (t.y == 0.0, d.y == 0.0) {
                (true, true) => return Err(FitError::BothEmpty { bin: i }),
                (true, false) | (false, true) => result.push(0.0),
                (false, false) => result.push(bin_chi_squared(t, d, uncertainty)),
            }
        }
        Ok(result)
    }

    /// ビンごとのカイ二乗の平均（画面に出すスコア）
    ///
    /// ビンがなければ 0。エラー条件は `chi_squared_per_bin` と同じ。
    pub fn chi_squared(&self, data: &HistogramRecord, uncertainty: f64) -> Result<f64, FitError> {
        let per_bin = self.chi_squared_per_bin(data, uncertainty)?;
        if per_bin.is_empty() {
            return Ok(0.0);
        }
        Ok(per_bin.iter().sum::<f64>() / per_bin.len() as f64)
    }
}

fn bin_chi_squared(theory: &Bin, data: &Bin, uncertainty: f64) -> f64 {
    let (sigma_theory, sigma_data) = if theory.y > data.y {
        (theory.y_err_minus, data.y_err_plus)
    } else {
        (theory.y_err_plus, data.y_err_minus)
    };

    let diff = theory.y - data.y;
    let rel = uncertainty * theory.y;
    let denominator = sigma_data * sigma_data + sigma_theory * sigma_theory + rel * rel;
    if denominator == 0.0 {
        return 0.0;
    }
    let x = diff * diff / denominator;
    if x.is_finite() {
        x
    } else {
        0.0
    }
}
