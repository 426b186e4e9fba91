// src/ingest/collapse.rs
//! Source-collapse policies.
//!
//! Some collectors report the same logical signal (several quote sources for
//! one commodity). A [`CollapseGroup`] lists them in priority order; per run at
//! most one item survives for the whole group: the first usable item of the
//! first member (in priority order) that produced one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::RawItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseGroup {
    pub name: String,
    /// Collector names, highest priority first.
    pub members: Vec<String>,
}

impl CollapseGroup {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// What one collector returned this run (empty on failure).
#[derive(Debug, Clone)]
pub struct CollectorBatch {
    pub collector: String,
    pub items: Vec<RawItem>,
    pub failed: bool,
}

/// Flatten batches in registration order, keeping a single winner per group.
/// Returns the candidates and how many grouped items were discarded.
pub fn apply_collapse(batches: Vec<CollectorBatch>, groups: &[CollapseGroup]) -> (Vec<RawItem>, usize) {
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    for (gi, g) in groups.iter().enumerate() {
        for m in &g.members {
            // first declaration wins if a collector is listed twice
            group_of.entry(m.as_str()).or_insert(gi);
        }
    }

    // Winner per group: first member in priority order with a usable item.
    let mut winners: Vec<Option<&str>> = vec![None; groups.len()];
    for (gi, g) in groups.iter().enumerate() {
        winners[gi] = g
            .members
            .iter()
            .map(String::as_str)
            .filter(|m| group_of.get(m) == Some(&gi))
            .find(|m| {
                batches
                    .iter()
                    .any(|b| b.collector == *m && b.items.iter().any(RawItem::has_text))
            });
    }
    let mut out = Vec::new();
    let mut collapsed = 0usize;
    for batch in batches {
        match group_of.get(batch.collector.as_str()) {
            None => out.extend(batch.items),
            Some(&gi) => {
                let total = batch.items.len();
                if winners[gi] == Some(batch.collector.as_str()) {
                    if let Some(first) = batch.items.into_iter().find(RawItem::has_text) {
                        out.push(first);
                        collapsed += total - 1;
                        continue;
                    }
                }
                collapsed += total;
            }
        }
    }
    (out, collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(name: &str, titles: &[&str]) -> CollectorBatch {
        CollectorBatch {
            collector: name.to_string(),
            items: titles
                .iter()
                .map(|t| RawItem::new(name, *t, "", ""))
                .collect(),
            failed: false,
        }
    }

    #[test]
    fn ungrouped_batches_pass_through_in_order() {
        let (out, collapsed) = apply_collapse(vec![batch("a", &["1", "2"]), batch("b", &["3"])], &[]);
        let titles: Vec<_> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "2", "3"]);
        assert_eq!(collapsed, 0);
    }

    #[test]
    fn priority_follows_group_declaration_not_registration() {
        let groups = [CollapseGroup::new("gold", ["sina", "eastmoney"])];
        let (out, collapsed) = apply_collapse(
            vec![batch("eastmoney", &["em1", "em2"]), batch("sina", &["s1"])],
            &groups,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "s1");
        assert_eq!(collapsed, 2);
    }

    #[test]
    fn blank_items_do_not_count_as_usable() {
        let groups = [CollapseGroup::new("gold", ["a", "b"])];
        let (out, _) = apply_collapse(vec![batch("a", &["  "]), batch("b", &["ok"])], &groups);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "ok");
    }
}
