// src/scheduler/buckets.rs
use crate::classify::is_policy_class;
use crate::ingest::types::RawItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Carries the flagship tag; pushed one by one, never capped or queued.
    Flagship,
    Policy,
    General,
}

impl Bucket {
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Flagship => "重点",
            Bucket::Policy => "政策",
            Bucket::General => "资讯",
        }
    }
}

pub fn bucket_of(item: &RawItem, flagship_tag: &str) -> Bucket {
    if item.has_tag(flagship_tag) {
        Bucket::Flagship
    } else if is_policy_class(&item.tags) {
        Bucket::Policy
    } else {
        Bucket::General
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    pub flagship: Vec<RawItem>,
    pub policy: Vec<RawItem>,
    pub general: Vec<RawItem>,
}

/// Split preserving arrival order inside each bucket.
pub fn partition(items: Vec<RawItem>, flagship_tag: &str) -> Partition {
    let mut p = Partition::default();
    for it in items {
        match bucket_of(&it, flagship_tag) {
            Bucket::Flagship => p.flagship.push(it),
            Bucket::Policy => p.policy.push(it),
            Bucket::General => p.general.push(it),
        }
    }
    p
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCaps {
    pub policy: usize,
    pub general: usize,
}

impl BucketCaps {
    pub fn new(policy: usize, general: usize) -> Self {
        Self { policy, general }
    }

    pub fn for_bucket(&self, b: Bucket) -> usize {
        match b {
            Bucket::Flagship => usize::MAX,
            Bucket::Policy => self.policy,
            Bucket::General => self.general,
        }
    }
}
