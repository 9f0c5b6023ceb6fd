use super::partition::Partition;
use crate::filter::Filter;
use crate::model::{CatalogInfo, InfoId};
use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;

/// A lazy sequence of entities.
pub type InfoStream = Box<dyn Iterator<Item = Arc<CatalogInfo>> + Send>;

/// Walks a set of partition snapshots in id order, yielding the entities
/// accepted by a filter.
///
/// The snapshots are captured when the stream is created, so concurrent
/// writes never show up half-way through. Nothing is copied: each step
/// re-enters the id index right after the last key returned.
pub(crate) struct SnapshotStream {
    partitions: VecDeque<Arc<Partition>>,
    cursor: Option<InfoId>,
    filter: Filter,
}

impl SnapshotStream {
    pub(crate) fn new(partitions: Vec<Arc<Partition>>, filter: Filter) -> Self {
        SnapshotStream {
            partitions: partitions.into(),
            cursor: None,
            filter,
        }
    }

    fn next_in_partition(&mut self) -> Option<Arc<CatalogInfo>> {
        let partition = self.partitions.front()?;
        let lower = match self.cursor.take() {
            Some(last) => Bound::Excluded(last),
            None => Bound::Unbounded,
        };
        let mut range = partition.by_id.range((lower, Bound::Unbounded));
        for (id, info) in &mut range {
            if self.filter.apply(info) {
                self.cursor = Some(id.clone());
                return Some(info.clone());
            }
        }
        None
    }
}

impl Iterator for SnapshotStream {
    type Item = Arc<CatalogInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.partitions.is_empty() {
            if let Some(info) = self.next_in_partition() {
                return Some(info);
            }
            self.partitions.pop_front();
            self.cursor = None;
        }
        None
    }
}

/// Concatenates several streams, draining them in order.
pub(crate) struct UnionStream {
    streams: VecDeque<InfoStream>,
}

impl UnionStream {
    pub(crate) fn new(streams: Vec<InfoStream>) -> Self {
        UnionStream {
            streams: streams.into(),
        }
    }
}

impl Iterator for UnionStream {
    type Item = Arc<CatalogInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let stream = self.streams.front_mut()?;
            match stream.next() {
                Some(info) => return Some(info),
                None => {
                    self.streams.pop_front();
                }
            }
        }
    }
}
