use proptest::prelude::*;
use tabula_columnar::{
    is_missing_f64, missing_f64, ColumnType, ColumnarError, NumberColumn, Parsers, Representation,
    StorageRejection,
};

fn compact_from(values: &[Option<i32>]) -> NumberColumn {
    let mut column = NumberColumn::create_compact("n", values.len());
    for v in values {
        match v {
            Some(v) => column.append_i32(*v).unwrap(),
            None => column.append_missing(),
        }
    }
    column
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn replacing_missing_values_with_a_constant() {
    let mut column = compact_from(&[Some(1), None, Some(3), None]);
    let missing = column.is_missing_selection();
    column.set_where(&missing, 0.0).unwrap();
    assert_eq!(column.as_f64_vec(), vec![1.0, 0.0, 3.0, 0.0]);
    assert_eq!(column.representation(), Representation::CompactInt);
}

#[test]
fn compact_column_refuses_fractional_values_without_promoting() {
    let mut column = compact_from(&[Some(1)]);
    let err = column.append(2.5).unwrap_err();
    assert_eq!(
        err,
        ColumnarError::IncompatibleType {
            column: "n".to_owned(),
            reason: StorageRejection::NonIntegral(2.5),
        }
    );
    assert_eq!(column.len(), 1);
    assert!(column.is_compact());
}

#[test]
fn parsers_never_yield_a_sentinel() {
    let parsers = Parsers::default();
    assert!(!parsers.can_parse(ColumnType::Integer, "-2147483648"));
    assert!(!parsers.can_parse(ColumnType::Short, "-32768"));
    assert!(!parsers.can_parse(ColumnType::Long, "-9223372036854775808"));
    assert!(parsers.can_parse(ColumnType::Integer, "-2147483647"));

    let nan = parsers.parse(ColumnType::Double, "x", "NaN").unwrap();
    match nan {
        tabula_columnar::Value::Number(v) => {
            assert!(v.is_nan());
            assert!(!is_missing_f64(v));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn top_and_bottom_take_a_prefix() {
    let column = compact_from(&[Some(5), Some(1), Some(4)]);
    assert_eq!(column.top(2), vec![5.0, 4.0]);
    assert_eq!(column.bottom(10), vec![1.0, 4.0, 5.0]);
    assert_eq!(column.top(0), Vec::<f64>::new());
}

fn arb_cells() -> impl Strategy<Value = Vec<Option<i32>>> {
    proptest::collection::vec(
        prop_oneof![
            4 => (i32::MIN + 1..=i32::MAX).prop_map(Some),
            1 => Just(None),
        ],
        0..64,
    )
}

proptest! {
    #[test]
    fn lead_undoes_lag(cells in arb_cells(), n in -8isize..8) {
        let column = compact_from(&cells);
        let restored = column.lag(n).lead(n);
        let len = column.len();
        let shift = n.unsigned_abs().min(len);
        // A positive shift loses the tail, a negative one the head.
        let kept = if n >= 0 { 0..len - shift } else { shift..len };
        let original = column.as_f64_vec();
        let shifted = restored.as_f64_vec();
        prop_assert_eq!(shifted.len(), len);
        prop_assert_eq!(bits(&shifted[kept.clone()]), bits(&original[kept.clone()]));
        prop_assert!(shifted
            .iter()
            .enumerate()
            .filter(|(row, _)| !kept.contains(row))
            .all(|(_, v)| is_missing_f64(*v)));
    }

    #[test]
    fn append_then_get_round_trips(cells in arb_cells()) {
        let compact = compact_from(&cells);
        let mut float = NumberColumn::create("f", cells.len());
        for cell in &cells {
            float.append(cell.map(f64::from).unwrap_or_else(missing_f64)).unwrap();
        }
        for (row, cell) in cells.iter().enumerate() {
            match cell {
                Some(v) => {
                    prop_assert_eq!(compact.get(row), *v as f64);
                    prop_assert_eq!(float.get(row), *v as f64);
                }
                None => {
                    prop_assert!(compact.is_missing(row));
                    prop_assert!(float.is_missing(row));
                }
            }
        }
    }

    #[test]
    fn is_in_and_is_not_in_partition_rows(
        cells in arb_cells(),
        lookup in proptest::collection::vec(-5i32..5, 0..4),
    ) {
        let column = compact_from(&cells);
        let lookup: Vec<f64> = lookup.into_iter().map(f64::from).collect();
        let inside = column.is_in(&lookup);
        let outside = column.is_not_in(&lookup);
        prop_assert!(inside.and(&outside).is_empty());
        prop_assert_eq!(inside.or(&outside).len(), column.len());
    }

    #[test]
    fn sorting_is_monotone(values in proptest::collection::vec(-1e6f64..1e6, 0..128)) {
        let mut column = NumberColumn::from_values("s", &values);
        column.sort_descending();
        let sorted = column.as_f64_vec();
        prop_assert!(sorted.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn top_and_bottom_are_disjoint(
        values in proptest::collection::btree_set(-10_000i32..10_000, 2..64),
        n in 1usize..32,
    ) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        prop_assume!(2 * n <= values.len());
        let column = NumberColumn::from_values("t", &values);
        let top = column.top(n);
        let bottom = column.bottom(n);
        prop_assert_eq!(top.len(), n);
        prop_assert!(top.iter().all(|v| !bottom.contains(v)));
    }
}
