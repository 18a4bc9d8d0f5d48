//! Lowest common ancestor search
//!
//! Finds the merge base of two commits by walking both ancestries at once:
//! a breadth-first walk seeded with both tips, where each visited commit
//! remembers which side(s) reached it. The first commit reached from both
//! sides is the base. FIFO processing makes the result deterministic for a
//! given graph regardless of timestamps.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bitflags::bitflags;
use std::collections::{HashMap, VecDeque};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct VisitState: u8 {
        const SOURCE = 0b01;
        const TARGET = 0b10;
        const BOTH = Self::SOURCE.bits() | Self::TARGET.bits();
    }
}

pub struct AncestorFinder<Loader> {
    load_parents: Loader,
}

impl<Loader> AncestorFinder<Loader>
where
    Loader: Fn(&ObjectId) -> Result<Vec<ObjectId>>,
{
    /// `load_parents` maps a commit id to its parent ids.
    pub fn new(load_parents: Loader) -> Self {
        AncestorFinder { load_parents }
    }

    /// The lowest common ancestor of `source` and `target`, or `None` for
    /// unrelated histories.
    pub fn find(&self, source: &ObjectId, target: &ObjectId) -> Result<Option<ObjectId>> {
        if source == target {
            return Ok(Some(*source));
        }

        let mut states: HashMap<ObjectId, VisitState> = HashMap::new();
        let mut queue: VecDeque<ObjectId> = VecDeque::new();

        states.insert(*source, VisitState::SOURCE);
        states.insert(*target, VisitState::TARGET);
        queue.push_back(*source);
        queue.push_back(*target);

        while let Some(oid) = queue.pop_front() {
            let state = states[&oid];
            if state == VisitState::BOTH {
                return Ok(Some(oid));
            }

            for parent in (self.load_parents)(&oid)? {
                let parent_state = states.entry(parent).or_insert(VisitState::empty());
                let seen_before = *parent_state;
                *parent_state |= state;

                if seen_before != *parent_state {
                    queue.push_back(parent);
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes([byte; 20])
    }

    fn dag(edges: &[(u8, &[u8])]) -> impl Fn(&ObjectId) -> Result<Vec<ObjectId>> {
        let graph: HashMap<ObjectId, Vec<ObjectId>> = edges
            .iter()
            .map(|(child, parents)| (oid(*child), parents.iter().map(|p| oid(*p)).collect()))
            .collect();

        move |commit: &ObjectId| Ok(graph.get(commit).cloned().unwrap_or_default())
    }

    #[test]
    fn base_of_a_simple_fork() {
        // 1 <- 2 <- 3 (source)
        //      ^--- 4 (target)
        let finder = AncestorFinder::new(dag(&[(1, &[]), (2, &[1]), (3, &[2]), (4, &[2])]));

        assert_eq!(finder.find(&oid(3), &oid(4)).unwrap(), Some(oid(2)));
    }

    #[test]
    fn ancestor_of_the_other_tip_is_the_base() {
        // 1 <- 2 <- 3; merging 3 into 2 fast-forwards
        let finder = AncestorFinder::new(dag(&[(1, &[]), (2, &[1]), (3, &[2])]));

        assert_eq!(finder.find(&oid(2), &oid(3)).unwrap(), Some(oid(2)));
        assert_eq!(finder.find(&oid(3), &oid(2)).unwrap(), Some(oid(2)));
    }

    #[test]
    fn identical_tips_are_their_own_base() {
        let finder = AncestorFinder::new(dag(&[(1, &[])]));

        assert_eq!(finder.find(&oid(1), &oid(1)).unwrap(), Some(oid(1)));
    }

    #[test]
    fn unrelated_histories_have_no_base() {
        // two disjoint root commits
        let finder = AncestorFinder::new(dag(&[(1, &[]), (2, &[])]));

        assert_eq!(finder.find(&oid(1), &oid(2)).unwrap(), None);
    }

    #[test]
    fn base_through_a_merge_commit() {
        //    1
        //   / \
        //  2   3
        //   \ / \
        //    4   5
        // base of 4 (a merge of 2 and 3) and 5 is 3
        let finder = AncestorFinder::new(dag(&[
            (1, &[]),
            (2, &[1]),
            (3, &[1]),
            (4, &[2, 3]),
            (5, &[3]),
        ]));

        assert_eq!(finder.find(&oid(4), &oid(5)).unwrap(), Some(oid(3)));
    }
}
