//! Post-processing of raw per-worker results
//!
//! Transposes the worker-ordered raw results into per-field lists and applies the
//! reducer at the same position to each list. Fields past the end of the reducer
//! list get the default sum and raise a [`Notice::ReducerShortfall`]. A reducer
//! that panics is reported as [`ReduceError::ReducerPanicked`].

use crate::parallel::error::{ReduceError, panic_message};
use crate::parallel::notice::{Notice, NoticeSink};
use crate::parallel::reducers::{Accumulate, Reducer, fold_sum};
use crate::parallel::work::Output;
use std::panic::{self, AssertUnwindSafe};

/// Reduce worker-ordered raw results into one value (or one tuple)
pub fn combine<V: Accumulate>(
    raw: Vec<Output<V>>,
    reducers: &[Reducer<V>],
    notices: &dyn NoticeSink,
) -> Result<Output<V>, ReduceError> {
    let fields = transpose(raw)?;
    let width = fields.len();

    let mut reduced = Vec::with_capacity(width);
    for (index, values) in fields.into_iter().enumerate() {
        let outcome = match reducers.get(index) {
            Some(reducer) => {
                tracing::trace!("Reducing field {} with '{}'", index, reducer.name());
                panic::catch_unwind(AssertUnwindSafe(|| reducer.apply(values)))
            }
            None => {
                notices.notify(Notice::ReducerShortfall { field: index });
                panic::catch_unwind(AssertUnwindSafe(|| fold_sum(values)))
            }
        };
        let value = outcome.map_err(|payload| ReduceError::ReducerPanicked {
            field: index,
            message: panic_message(payload.as_ref()),
        })?;
        reduced.push(value);
    }

    if width == 1 {
        Ok(reduced.pop().map_or(Output::Empty, Output::Scalar))
    } else {
        Ok(Output::Fields(reduced))
    }
}

/// Turn per-worker entries into per-field lists, keeping worker order
///
/// Every entry must share the shape of the first: all scalars, or all tuples of
/// the same width.
pub fn transpose<V>(raw: Vec<Output<V>>) -> Result<Vec<Vec<V>>, ReduceError> {
    let first = raw.first().ok_or(ReduceError::NoResults)?;
    let expected = first
        .width()
        .ok_or(ReduceError::NotComputed { worker: 0 })?;
    let scalar_shape = matches!(first, Output::Scalar(_));

    let workers = raw.len();
    let mut fields: Vec<Vec<V>> = (0..expected).map(|_| Vec::with_capacity(workers)).collect();

    for (worker, entry) in raw.into_iter().enumerate() {
        match entry {
            Output::Empty => return Err(ReduceError::NotComputed { worker }),
            Output::Scalar(value) if scalar_shape => fields[0].push(value),
            Output::Fields(values) if !scalar_shape => {
                if values.len() != expected {
                    return Err(ReduceError::ShapeMismatch {
                        worker,
                        expected,
                        found: values.len(),
                    });
                }
                for (field, value) in fields.iter_mut().zip(values) {
                    field.push(value);
                }
            }
            _ => return Err(ReduceError::MixedShapes { worker }),
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::notice::RecordingSink;
    use crate::parallel::reducers::{concat, product, sum};

    #[test]
    fn test_scalar_results_form_one_field() {
        let sink = RecordingSink::new();
        let raw = vec![Output::Scalar(-3), Output::Scalar(5), Output::Scalar(7)];
        let reduced = combine(raw, &[sum()], &sink).unwrap();
        assert_eq!(reduced, Output::Scalar(9));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tuple_results_reduced_per_field() {
        let sink = RecordingSink::new();
        let raw = vec![Output::pair(1, 2), Output::pair(3, 4), Output::pair(5, 6)];
        let reduced = combine(raw, &[sum(), product()], &sink).unwrap();
        assert_eq!(reduced, Output::pair(9, 48));
    }

    #[test]
    fn test_missing_reducers_default_to_sum() {
        let sink = RecordingSink::new();
        let raw = vec![Output::fields([1, 10, 100]), Output::fields([2, 20, 200])];
        let reduced = combine(raw, &[product()], &sink).unwrap();
        assert_eq!(reduced, Output::fields([2, 30, 300]));
        assert_eq!(
            sink.notices(),
            vec![
                Notice::ReducerShortfall { field: 1 },
                Notice::ReducerShortfall { field: 2 }
            ]
        );
    }

    #[test]
    fn test_no_reducers_for_scalar() {
        let sink = RecordingSink::new();
        let raw = vec![Output::Scalar(1.5), Output::Scalar(2.5)];
        let reduced = combine(raw, &[], &sink).unwrap();
        assert_eq!(reduced, Output::Scalar(4.0));
        assert!(sink.contains(|n| matches!(n, Notice::ReducerShortfall { field: 0 })));
    }

    #[test]
    fn test_concat_keeps_worker_order() {
        let sink = RecordingSink::new();
        let raw = vec![
            Output::pair(vec![1], vec![10]),
            Output::pair(vec![2, 3], vec![20, 30]),
        ];
        let reduced = combine(raw, &[concat(), concat()], &sink).unwrap();
        assert_eq!(reduced, Output::pair(vec![1, 2, 3], vec![10, 20, 30]));
    }

    #[test]
    fn test_single_field_tuple_collapses_to_scalar() {
        let sink = RecordingSink::new();
        let raw = vec![Output::fields([4]), Output::fields([5])];
        assert_eq!(combine(raw, &[sum()], &sink).unwrap(), Output::Scalar(9));
    }

    #[test]
    fn test_panicking_reducer_is_reduce_error() {
        let sink = RecordingSink::new();
        let raw = vec![Output::pair(1, 2), Output::pair(3, 4)];
        let exploding = Reducer::new(|_: Vec<i32>| panic!("reducer blew up"));

        match combine(raw, &[sum(), exploding], &sink) {
            Err(ReduceError::ReducerPanicked { field, message }) => {
                assert_eq!(field, 1);
                assert!(message.contains("reducer blew up"));
            }
            other => panic!("expected reducer panic, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_raw_set() {
        let sink = RecordingSink::new();
        let raw: Vec<Output<i32>> = Vec::new();
        assert_eq!(combine(raw, &[sum()], &sink), Err(ReduceError::NoResults));
    }

    #[test]
    fn test_not_computed_entry() {
        let raw = vec![Output::Scalar(1), Output::Empty];
        assert_eq!(
            transpose(raw),
            Err(ReduceError::NotComputed { worker: 1 })
        );
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let raw = vec![Output::Scalar(1), Output::pair(1, 2)];
        assert_eq!(transpose(raw), Err(ReduceError::MixedShapes { worker: 1 }));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let raw = vec![Output::pair(1, 2), Output::fields([1, 2, 3])];
        assert_eq!(
            transpose(raw),
            Err(ReduceError::ShapeMismatch {
                worker: 1,
                expected: 2,
                found: 3
            })
        );
    }
}
