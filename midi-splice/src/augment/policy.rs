use rand::Rng;
use tracing::debug;

use crate::sequence::{
    event::{delete_keys, merge_streams, KeySet},
    Stream,
};

use super::{CategoryTable, ExampleLibrary};

/// An example chosen to replace one category of a primary stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Substitution<'a> {
    pub category: &'a str,
    pub index: usize,
    pub example: &'a Stream<u64>,
}

/// Decides which categories get replaced, and by which example.
///
/// For each category of `table` an integer is drawn uniformly from `0..=total`, where `total` is
/// the size of the whole library. If it is below the category's example count, the example at
/// that index is chosen. A category is therefore replaced with probability
/// `count / (total + 1)`.
pub fn choose_substitutions<'a, R: Rng + ?Sized>(
    rng: &mut R,
    library: &'a ExampleLibrary,
    table: &'a CategoryTable,
) -> Vec<Substitution<'a>> {
    let total = library.total();
    let mut chosen = Vec::new();
    for (category, _) in table.iter() {
        let index = rng.random_range(0..=total);
        if index < library.count(category) {
            if let Some(example) = library.get(category, index) {
                chosen.push(Substitution {
                    category,
                    index,
                    example,
                });
            }
        }
    }
    chosen
}

/// Strips the notes of every substituted category from `primary`, then merges the chosen
/// examples in with the stripped stream as primary.
///
/// The stripped stream keeps only the header block and note events, even when nothing is
/// substituted.
pub fn substitute(
    primary: &Stream<u64>,
    substitutions: &[Substitution<'_>],
    table: &CategoryTable,
) -> Stream<u64> {
    let replaced = substitutions
        .iter()
        .filter_map(|s| table.get(s.category))
        .fold(KeySet::empty(), |keys, category| keys.union(category));

    let stripped = delete_keys(primary, &replaced);
    let examples: Vec<Stream<u64>> = substitutions.iter().map(|s| s.example.clone()).collect();

    debug!(
        categories = ?substitutions.iter().map(|s| s.category).collect::<Vec<_>>(),
        deleted = replaced.len(),
        "substituting categories"
    );
    merge_streams(&stripped, &examples)
}

/// One random transformation of `primary`.
pub fn transform<R: Rng + ?Sized>(
    rng: &mut R,
    primary: &Stream<u64>,
    library: &ExampleLibrary,
    table: &CategoryTable,
) -> Stream<u64> {
    let substitutions = choose_substitutions(rng, library, table);
    substitute(primary, &substitutions, table)
}
