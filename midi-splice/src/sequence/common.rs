use std::{convert::Infallible, iter::FromIterator};

/// Wraps each item `T` into `Result<T, ()>`
///
/// Useful because the lazy sequence operators take `Result` items, so a plain iterator of
/// events can be fed into them.
pub fn wrap_ok<T, I: Iterator<Item = T> + Sized>(iter: I) -> impl Iterator<Item = Result<T, ()>> {
    iter.map(Ok)
}

/// Converts a result iterator into a result of a collection, stopping at the first error.
///
/// The target can be a `Vec` or a [`Stream`](crate::sequence::Stream).
pub fn to_vec_result<T, C: FromIterator<T>, Err, I: Iterator<Item = Result<T, Err>> + Sized>(
    iter: I,
) -> Result<C, Err> {
    FromIterator::from_iter(iter)
}

/// Wraps each item `T` into a `Result` that can never fail.
///
/// Lets the stream operations reuse the lazy operators without inventing an error type.
pub fn wrap_infallible<T, I: Iterator<Item = T> + Sized>(
    iter: I,
) -> impl Iterator<Item = Result<T, Infallible>> {
    iter.map(Ok)
}

/// Collects the output of an operator fed by [`wrap_infallible`].
pub fn collect_infallible<T, C: FromIterator<T>, I: Iterator<Item = Result<T, Infallible>>>(
    iter: I,
) -> C {
    iter.map(|item| match item {
        Ok(v) => v,
        Err(never) => match never {},
    })
    .collect()
}
