//! カイ二乗・描画範囲・差分更新の特性テスト

use proptest::prelude::*;

use simlab_histogram::{Bin, FitError, HistogramRecord, UpdateError, DEFAULT_UNCERTAINTY};
use simlab_wire::{ByteCursor, ByteWriter};

/// y は 4 回に 1 回ちょうど 0 にする（空ビンの組み合わせを作るため）
fn bin_strategy() -> impl Strategy<Value = Bin> {
    (
        prop_oneof![1 => Just(0.0), 3 => -1.0e3..1.0e3f64],
        0.0..50.0f64,
        0.0..50.0f64,
        -10.0..10.0f64,
        0.0..1.0f64,
        0.0..1.0f64,
    )
        .prop_map(|(y, ep, em, x, xp, xm)| Bin::from_array([y, ep, em, x, xp, xm]))
}

fn pair_strategy() -> impl Strategy<Value = (HistogramRecord, HistogramRecord)> {
    (1usize..12).prop_flat_map(|n| {
        (
            proptest::collection::vec(bin_strategy(), n),
            proptest::collection::vec(bin_strategy(), n),
        )
            .prop_map(|(a, b)| {
                (HistogramRecord::from_bins("/p", a, 100), HistogramRecord::from_bins("/p", b, 100))
            })
    })
}

proptest! {
    #[test]
    fn chi_squared_is_non_negative_on_both_sides((theory, data) in pair_strategy()) {
        let both_empty = theory
            .bins()
            .iter()
            .zip(data.bins())
            .position(|(t, d)| t.y == 0.0 && d.y == 0.0);

        for (a, b) in [(&theory, &data), (&data, &theory)] {
            match a.chi_squared_per_bin(b, DEFAULT_UNCERTAINTY) {
                Ok(values) => {
                    prop_assert!(both_empty.is_none());
                    prop_assert_eq!(values.len(), a.bins().len());
                    prop_assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0));
                }
                Err(FitError::BothEmpty { bin }) => prop_assert_eq!(Some(bin), both_empty),
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }

    #[test]
    fn log_protected_bounds_stay_positive(bins in proptest::collection::vec(bin_strategy(), 1..20)) {
        let record = HistogramRecord::from_bins("/p", bins, 1);
        let bounds = record.bounds(true).unwrap();
        prop_assert!(bounds.y_min > 0.0);
        prop_assert!(bounds.x_min <= bounds.x_max);
    }

    #[test]
    fn rejected_copy_update_leaves_record_unchanged(
        current in proptest::collection::vec(bin_strategy(), 1..8),
        incoming in proptest::collection::vec(bin_strategy(), 1..8),
        rename in any::<bool>(),
    ) {
        let mut record = HistogramRecord::from_bins("/p", current, 10);
        let before = record.clone();

        let id = if rename { "/q" } else { "/p" };
        let mut w = ByteWriter::new();
        HistogramRecord::from_bins(id, incoming, 20).encode(&mut w, true);
        let bytes = w.into_bytes();

        let result = record.apply_update(&mut ByteCursor::new(&bytes), None, true, false);
        match result {
            Ok(()) => {
                prop_assert!(!rename);
                prop_assert_eq!(record.bin_count(), before.bin_count());
                prop_assert_eq!(record.event_count(), 20);
            }
            Err(UpdateError::IdentityMismatch { .. }) => {
                prop_assert!(rename);
                prop_assert_eq!(&record, &before);
            }
            Err(UpdateError::BinCountMismatch { .. }) => {
                prop_assert!(!rename);
                prop_assert_eq!(&record, &before);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }
}
