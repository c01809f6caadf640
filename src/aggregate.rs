//! Grouping of flat `(place, stats)` join rows into one series per place.

use std::collections::HashMap;

use crate::model::{Place, PlaceSeries, Stats};

/// Values grouped by the id of the place they belong to.
///
/// Groups appear in the order their place was first seen, and values keep the order they were
/// pushed in. Nothing is deduplicated: pushing the same value twice stores it twice.
#[derive(Debug, Clone)]
pub struct Grouped<P, V> {
    index: HashMap<String, usize>,
    groups: Vec<(P, Vec<V>)>,
}

impl<P: Place, V> Grouped<P, V> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Append `value` to the group of `place`. The first place seen for an id is the one kept.
    pub fn push(&mut self, place: P, value: V) {
        match self.index.get(place.id()) {
            Some(&position) => self.groups[position].1.push(value),
            None => {
                self.index.insert(place.id().to_string(), self.groups.len());
                self.groups.push((place, vec![value]));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&P, &[V])> {
        self.groups
            .iter()
            .map(|(place, values)| (place, values.as_slice()))
    }

    pub fn into_vec(self) -> Vec<(P, Vec<V>)> {
        self.groups
    }
}

impl<P: Place, V> Default for Grouped<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Place, V> FromIterator<(P, V)> for Grouped<P, V> {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut grouped = Self::new();
        grouped.extend(iter);
        grouped
    }
}

impl<P: Place, V> Extend<(P, V)> for Grouped<P, V> {
    fn extend<I: IntoIterator<Item = (P, V)>>(&mut self, iter: I) {
        for (place, value) in iter {
            self.push(place, value);
        }
    }
}

impl<P, V> IntoIterator for Grouped<P, V> {
    type Item = (P, Vec<V>);
    type IntoIter = std::vec::IntoIter<(P, Vec<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group flat rows by place, in first-seen order.
pub fn by_place<P: Place, V>(rows: impl IntoIterator<Item = (P, V)>) -> Vec<(P, Vec<V>)> {
    rows.into_iter().collect::<Grouped<P, V>>().into_vec()
}

/// Group flat `(place, stats)` rows into one series per place.
pub fn series<T>(rows: impl IntoIterator<Item = (T::Place, Stats)>) -> Vec<T>
where
    T: PlaceSeries + From<(<T as PlaceSeries>::Place, Vec<Stats>)>,
{
    let series: Vec<T> = by_place(rows).into_iter().map(T::from).collect();
    tracing::trace!(
        level = <T::Place as Place>::level(),
        places = series.len(),
        "grouped join rows"
    );
    series
}
