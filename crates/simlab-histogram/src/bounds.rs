//! 描画範囲の計算

use serde::Serialize;

use crate::record::HistogramRecord;

/// 対数スケールで y の下限がゼロ以下になったときに使う値
pub const LOG_SCALE_FLOOR: f64 = 1e-6;

/// ヒストグラム全体の描画範囲
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// 正の y の最小値（対数スケール用）。正のビンがなければ `None`
    pub y_min_positive: Option<f64>,
}

impl HistogramRecord {
    /// 誤差棒を含めた描画範囲を計算する
    ///
    /// - 上端は `y + y_err_plus`。ただし y ≥ 0 なら `10y`、y < 0 なら `y/10` を超えない
    /// - 下端は `y - y_err_minus`。ただし y ≥ 0 なら `y/10`、y < 0 なら `10y` を下回らない
    /// - x は `x - x_err_minus` 〜 `x + x_err_plus`
    ///
    /// `log_protect` が true なら、ゼロ以下になった `y_min` を `LOG_SCALE_FLOOR` に置き換える。
    ///
    /// 一度も更新されていない、またはビンがない場合は `None`。
    pub fn bounds(&self, log_protect: bool) -> Option<Bounds> {
        if self.is_empty() || self.bins().is_empty() {
            return None;
        }

        let mut b = Bounds {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
            y_min_positive: None,
        };

        for bin in self.bins() {
            let y = bin.y;
            let (cap, floor) = if y >= 0.0 { (y * 10.0, y / 10.0) } else { (y / 10.0, y * 10.0) };

            let upper = (y + bin.y_err_plus).min(cap);
            let lower = (y - bin.y_err_minus).max(floor);

            b.y_max = b.y_max.max(upper);
            b.y_min = b.y_min.min(lower);
            b.x_min = b.x_min.min(bin.x - bin.x_err_minus);
            b.x_max = b.x_max.max(bin.x + bin.x_err_plus);

            if y > 0.0 {
                b.y_min_positive = Some(b.y_min_positive.map_or(y, |m| m.min(y)));
            }
        }

        // NaN しかないビン列でも対数スケールを壊さない
        if log_protect && !(b.y_min > 0.0) {
            b.y_min = LOG_SCALE_FLOOR;
        }

        Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Bin;
    use alloc::vec;

    fn record(bins: &[[f64; 6]]) -> HistogramRecord {
        HistogramRecord::from_bins("/h", bins.iter().map(|b| Bin::from_array(*b)).collect(), 1)
    }

    #[test]
    fn test_bounds_empty_record() {
        let empty = HistogramRecord::empty("/h", 3);
        assert_eq!(empty.bounds(true), None);
    }

    #[test]
    fn test_bounds_simple() {
        let h = record(&[
            [10.0, 1.0, 2.0, 0.0, 0.5, 0.5],
            [20.0, 3.0, 1.0, 1.0, 0.5, 0.5],
        ]);
        let b = h.bounds(true).unwrap();

        assert_eq!(b.x_min, -0.5);
        assert_eq!(b.x_max, 1.5);
        assert_eq!(b.y_min, 8.0);
        assert_eq!(b.y_max, 23.0);
        assert_eq!(b.y_min_positive, Some(10.0));
    }

    #[test]
    fn test_bounds_caps_large_errors() {
        // 誤差が値の 10 倍を超える → 上端は 10y、下端は y/10
        let h = record(&[[1.0, 100.0, 100.0, 0.0, 0.5, 0.5]]);
        let b = h.bounds(false).unwrap();
        assert_eq!(b.y_max, 10.0);
        assert_eq!(b.y_min, 0.1);
    }

    #[test]
    fn test_bounds_negative_values() {
        let h = record(&[[-10.0, 100.0, 100.0, 0.0, 0.5, 0.5]]);
        let b = h.bounds(false).unwrap();
        assert_eq!(b.y_max, -1.0);
        assert_eq!(b.y_min, -100.0);
        assert_eq!(b.y_min_positive, None);
    }

    #[test]
    fn test_bounds_log_protect() {
        let h = record(&[[0.0, 1.0, 1.0, 0.0, 0.5, 0.5], [-5.0, 1.0, 1.0, 1.0, 0.5, 0.5]]);
        assert!(h.bounds(false).unwrap().y_min <= 0.0);
        assert_eq!(h.bounds(true).unwrap().y_min, LOG_SCALE_FLOOR);
    }

    #[test]
    fn test_bounds_log_protect_never_non_positive() {
        let cases = vec![
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1e-9, 1.0, 1.0, 0.0, 0.0, 0.0],
            [-3.0, 0.1, 0.1, 0.0, 0.0, 0.0],
            [f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        for case in cases {
            let b = record(&[case]).bounds(true).unwrap();
            assert!(b.y_min > 0.0, "y_min = {} for {:?}", b.y_min, case);
        }
    }
}
