//! The A* open list.
//!
//! A plain d-ary min-heap of `(rank, insertion order)` keys pointing into a
//! `SearchTree`. The search tree is never re-ranked in place, so the heap does
//! not need to track where nodes live.

use std::cmp::Ordering;
use std::cmp::min;

use crate::heap_primitives::index_first_children;
use crate::heap_primitives::index_min;
use crate::heap_primitives::index_parent;
use crate::search::SearchTreeIndex;
use crate::space::Cost;

const HEAP_ARITY: usize = 4usize;

#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    index_parent::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn down_left(i: usize) -> usize {
    index_first_children::<HEAP_ARITY>(i)
}

/// The ranking tuple for A*
///
/// We prefer better f-values, and tie break for lower h.
///
/// ```
/// use search::data_structures::frontier::AStarRank;
///
/// let low_h = AStarRank::new(2u32, 0u32);
/// let high_h = AStarRank::new(0u32, 2u32);
/// assert_eq!(low_h.f(), high_h.f());
/// assert!(low_h < high_h);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarRank<C: Cost> {
    f: C,
    h: C,
}

impl<C> AStarRank<C>
where
    C: Cost,
{
    pub fn new(g: C, h: C) -> Self {
        Self {
            f: g.saturating_add(&h),
            h,
        }
    }
    pub fn f(&self) -> C {
        self.f
    }
    pub fn h(&self) -> C {
        self.h
    }
}

#[derive(Copy, Clone, Debug)]
pub struct FrontierEntry<C>
where
    C: Cost,
{
    pub rank: AStarRank<C>,
    /// Insertion order. Keeps equally ranked nodes first-in first-out.
    seq: u64,
    pub node_index: SearchTreeIndex,
}

impl<C: Cost> FrontierEntry<C> {
    #[inline(always)]
    fn key(&self) -> (AStarRank<C>, u64) {
        (self.rank, self.seq)
    }
}

impl<C: Cost> PartialEq for FrontierEntry<C> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl<C: Cost> Eq for FrontierEntry<C> {}

impl<C: Cost> PartialOrd for FrontierEntry<C> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<C: Cost> Ord for FrontierEntry<C> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[derive(Debug)]
pub struct Frontier<C>
where
    C: Cost,
{
    heap: Vec<FrontierEntry<C>>,
    pushed: u64,
}

impl<C> Frontier<C>
where
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: Vec::with_capacity(1024),
            pushed: 0,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    #[inline(always)]
    pub fn peek(&self) -> Option<&FrontierEntry<C>> {
        self.heap.first()
    }

    pub fn push(&mut self, rank: AStarRank<C>, node_index: SearchTreeIndex) {
        let seq = self.pushed;
        self.pushed += 1;
        self.heap.push(FrontierEntry {
            rank,
            seq,
            node_index,
        });
        self.sift_up(self.heap.len() - 1);
        self.verify_heap();
    }

    pub fn pop(&mut self) -> Option<FrontierEntry<C>> {
        let last = self.heap.len().checked_sub(1)?;
        self.heap.swap(0, last);
        let top = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        self.verify_heap();
        top
    }

    /// Raises a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = up(pos);
            if self.heap[parent] <= self.heap[pos] {
                break;
            }
            self.heap.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    #[inline(always)]
    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        loop {
            let first = down_left(pos);
            if first >= len {
                break;
            }
            let child = first + index_min(&self.heap[first..min(first + HEAP_ARITY, len)]);
            if self.heap[pos] <= self.heap[child] {
                break;
            }
            self.heap.swap(pos, child);
            pos = child;
        }
        pos
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    pub(crate) fn verify_heap(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    pub(crate) fn verify_heap(&self) {
        for i in 1..self.heap.len() {
            let p = up(i);
            assert!(
                self.heap[p] <= self.heap[i],
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.heap[p],
                self.heap[i],
                self.heap.len(),
            );
        }
    }
}

impl<C> Default for Frontier<C>
where
    C: Cost,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::maze::MazeAction;
    use crate::problems::maze::MazeCost;
    use crate::problems::maze::MazeState;
    use crate::search::SearchTree;
    use crate::search::SearchTreeNode;

    fn handles(n: usize) -> Vec<SearchTreeIndex> {
        let mut tree = SearchTree::<MazeState, MazeAction, MazeCost>::new();
        (0..n)
            .map(|i| tree.push(SearchTreeNode::new_root(MazeState::new(0, i as u32), true, 0)))
            .collect()
    }

    #[test]
    fn ranking() {
        let c0: MazeCost = 0;
        let c1: MazeCost = 1;
        let c2: MazeCost = 2;

        assert!(AStarRank::new(c2, c0) < AStarRank::new(c2, c1));
        assert!(AStarRank::new(c2, c1) == AStarRank::new(c2, c1));
        assert!(AStarRank::new(c0, c1) < AStarRank::new(c2, c0));
    }

    #[test]
    fn pops_in_rank_order() {
        let ids = handles(20);
        let mut frontier = Frontier::<MazeCost>::new();
        for (i, id) in ids.iter().enumerate() {
            let g = ((i * 7) % 11) as MazeCost;
            frontier.push(AStarRank::new(g, 1), *id);
        }
        assert_eq!(frontier.len(), 20);

        let mut last = None;
        while let Some(e) = frontier.pop() {
            if let Some(prev) = last {
                assert!(prev <= e.rank);
            }
            last = Some(e.rank);
        }
        assert!(frontier.is_empty());
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn equal_ranks_are_first_in_first_out() {
        let ids = handles(10);
        let mut frontier = Frontier::<MazeCost>::new();
        for id in &ids {
            frontier.push(AStarRank::new(3, 2), *id);
        }
        let popped: Vec<_> = std::iter::from_fn(|| frontier.pop())
            .map(|e| e.node_index)
            .collect();
        assert_eq!(popped, ids);
    }

    #[test]
    fn peek_is_the_minimum() {
        let ids = handles(3);
        let mut frontier = Frontier::<MazeCost>::new();
        frontier.push(AStarRank::new(5, 0), ids[0]);
        frontier.push(AStarRank::new(1, 1), ids[1]);
        frontier.push(AStarRank::new(2, 0), ids[2]);
        assert_eq!(frontier.peek().map(|e| e.node_index), Some(ids[1]));
    }
}
