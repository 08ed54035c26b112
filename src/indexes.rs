use std::{collections::HashSet, sync::Arc};

/// Positional selection of records, either kept or dropped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Indexes {
    selection: Arc<[usize]>,
    drop: bool,
}

impl<const N: usize> From<([usize; N], bool)> for Indexes {
    fn from(value: ([usize; N], bool)) -> Self {
        let selection = Arc::from(value.0);
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl From<(std::ops::Range<usize>, bool)> for Indexes {
    fn from(value: (std::ops::Range<usize>, bool)) -> Self {
        let selection = value.0.collect();
        let drop = value.1;
        Indexes { selection, drop }
    }
}

impl<const N: usize> From<[usize; N]> for Indexes {
    fn from(value: [usize; N]) -> Self {
        Indexes {
            selection: Arc::from(value),
            drop: false,
        }
    }
}

impl From<Vec<usize>> for Indexes {
    fn from(value: Vec<usize>) -> Self {
        Indexes {
            selection: Arc::from(value),
            drop: false,
        }
    }
}

impl From<std::ops::Range<usize>> for Indexes {
    fn from(value: std::ops::Range<usize>) -> Self {
        Indexes {
            selection: value.collect(),
            drop: false,
        }
    }
}

impl Indexes {
    /// Positions to keep in a collection of `collection_len` items.
    ///
    /// Kept positions follow the given order, out of range ones are ignored.
    /// Dropping keeps the remaining positions in ascending order.
    pub fn indexes_from(&self, collection_len: usize) -> Vec<usize> {
        if self.drop {
            let drop_idxs: HashSet<usize> = self.selection.iter().copied().collect();
            (0..collection_len)
                .filter(|idx| !drop_idxs.contains(idx))
                .collect()
        } else {
            self.selection
                .iter()
                .copied()
                .filter(|idx| *idx < collection_len)
                .collect()
        }
    }

    pub fn select_from<T: Clone>(&self, collection: &[T]) -> Vec<T> {
        self.indexes_from(collection.len())
            .into_iter()
            .map(|idx| collection[idx].clone())
            .collect()
    }
}
