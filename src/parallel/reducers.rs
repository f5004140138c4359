//! Reduction operators
//!
//! A [`Reducer`] folds the per-worker values of one result field into a single
//! value. Fields without an explicit reducer fall back to [`sum`], which relies on
//! the [`Accumulate`] trait.
//!
//! Every field of one dispatch shares the value type `V`. Results that mix
//! kinds, such as a per-segment array next to a per-segment scalar, use a caller
//! enum with one variant per kind that implements [`Accumulate`].

use std::sync::Arc;

/// Iterative in-place addition used by the default reduction
pub trait Accumulate {
    fn accumulate(&mut self, other: Self);
}

macro_rules! accumulate_by_add {
    ($($t:ty),* $(,)?) => {
        $(
            impl Accumulate for $t {
                fn accumulate(&mut self, other: Self) {
                    *self += other;
                }
            }
        )*
    };
}

accumulate_by_add!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Element-wise addition; elements past the end of `self` are appended
impl<T: Accumulate> Accumulate for Vec<T> {
    fn accumulate(&mut self, other: Self) {
        let overlap = self.len();
        let mut rest = other.into_iter();
        for (slot, value) in self.iter_mut().zip(rest.by_ref().take(overlap)) {
            slot.accumulate(value);
        }
        self.extend(rest);
    }
}

/// Combines one field's per-worker values, in worker order
#[derive(Clone)]
pub struct Reducer<V> {
    name: &'static str,
    f: Arc<dyn Fn(Vec<V>) -> V + Send + Sync>,
}

impl<V> Reducer<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        Self::named("custom", f)
    }

    pub fn named<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(Vec<V>) -> V + Send + Sync + 'static,
    {
        Self {
            name,
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply to a non-empty list of per-worker values
    pub fn apply(&self, values: Vec<V>) -> V {
        (self.f)(values)
    }
}

impl<V> std::fmt::Debug for Reducer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer").field("name", &self.name).finish()
    }
}

/// Left fold with [`Accumulate`]: `total = values[0]; total += v for the rest`
///
/// # Panics
/// Panics on an empty list; the reduction step never calls it with one.
pub fn fold_sum<V: Accumulate>(values: Vec<V>) -> V {
    let mut iter = values.into_iter();
    let mut total = iter.next().expect("reduction over an empty field");
    for value in iter {
        total.accumulate(value);
    }
    total
}

/// Default reduction: iterative addition
pub fn sum<V: Accumulate + 'static>() -> Reducer<V> {
    Reducer::named("sum", fold_sum::<V>)
}

/// Concatenate per-worker arrays into one flat array, preserving worker order
pub fn concat<T: 'static>() -> Reducer<Vec<T>> {
    Reducer::named("concat", |parts: Vec<Vec<T>>| {
        parts.into_iter().flatten().collect()
    })
}

/// Multiply per-worker values together
///
/// # Panics
/// Panics on an empty list, like [`fold_sum`].
pub fn product<V>() -> Reducer<V>
where
    V: std::ops::MulAssign + 'static,
{
    Reducer::named("product", |values: Vec<V>| {
        let mut iter = values.into_iter();
        let mut total = iter.next().expect("reduction over an empty field");
        for value in iter {
            total *= value;
        }
        total
    })
}

/// Arithmetic mean of per-worker scalars
pub fn mean() -> Reducer<f64> {
    Reducer::named("mean", |values: Vec<f64>| {
        let count = values.len() as f64;
        values.into_iter().sum::<f64>() / count
    })
}
