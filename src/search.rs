use nonmax::NonMaxU32;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// A handle to a `SearchTreeNode<St, A, C>` within its `SearchTree`.
///
/// The niche keeps `Option<(SearchTreeIndex, A)>` as small as the pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchTreeIndex {
    index: NonMaxU32,
}

impl SearchTreeIndex {
    #[inline(always)]
    fn new(index: usize) -> Self {
        let index = u32::try_from(index)
            .ok()
            .and_then(NonMaxU32::new)
            .expect("The search tree outgrew its index space");
        Self { index }
    }

    #[inline(always)]
    fn get(&self) -> usize {
        self.index.get() as usize
    }
}

/// A node of the search tree.
///
/// Nodes only know their parent, and never change once created.
#[derive(Clone, Debug)]
pub struct SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub(crate) parent: Option<(SearchTreeIndex, A)>,
    pub(crate) state: St,
    /// Whether the path to this node visited the key (if there's any).
    pub(crate) has_key: bool,
    pub(crate) g: C,
    pub(crate) h: C,
}

impl<St, A, C> SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn new_root(s: St, has_key: bool, h: C) -> Self {
        Self {
            parent: None,
            state: s,
            has_key,
            g: C::zero(),
            h,
        }
    }

    pub fn new(s: St, parent: (SearchTreeIndex, A), has_key: bool, g: C, h: C) -> Self {
        Self {
            parent: Some(parent),
            state: s,
            has_key,
            g,
            h,
        }
    }

    pub fn state(&self) -> &St {
        &self.state
    }
    pub fn action(&self) -> Option<A> {
        self.parent.map(|(_, a)| a)
    }
    pub fn has_key(&self) -> bool {
        self.has_key
    }
    pub fn g(&self) -> C {
        self.g
    }
    pub fn h(&self) -> C {
        self.h
    }
    /// The A* priority, `f = g + h`.
    pub fn f(&self) -> C {
        self.g.saturating_add(&self.h)
    }
}

/// Arena of search nodes.
pub struct SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchTreeNode<St, A, C>>,
}

impl<St, A, C> SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, node: SearchTreeNode<St, A, C>) -> SearchTreeIndex {
        let index = SearchTreeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks the parent links from `node_index` back to its root.
    #[must_use]
    pub fn path<Sp: Space<St, A, C>>(
        &self,
        space: &Sp,
        mut node_index: SearchTreeIndex,
    ) -> Path<St, A, C> {
        let end = &self[node_index];
        let mut path = Path::<St, A, C>::new_from_start(end.state);

        while let Some((parent_index, a)) = self[node_index].parent {
            let c: C = space.cost(&self[node_index].state);
            debug_assert!(c != C::zero());

            path.push_back_step(self[parent_index].state, a, c);
            debug_assert!(node_index != parent_index);
            node_index = parent_index;
        }

        path.reverse_actions();
        debug_assert_eq!(path.cost, end.g);
        path
    }
}

impl<St, A, C> Default for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<St, A, C> std::ops::Index<SearchTreeIndex> for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    type Output = SearchTreeNode<St, A, C>;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.get()]
    }
}

impl<St, A, C> std::fmt::Debug for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::maze::MazeAction;
    use crate::problems::maze::MazeCost;
    use crate::problems::maze::MazeSpace;
    use crate::problems::maze::MazeState;

    #[test]
    fn option_handle_is_niche_optimised() {
        assert_eq!(
            std::mem::size_of::<Option<SearchTreeIndex>>(),
            std::mem::size_of::<SearchTreeIndex>()
        );
    }

    #[test]
    fn path_follows_parents() {
        let space = MazeSpace::try_from("..M\n...").unwrap();
        let mut tree = SearchTree::<MazeState, MazeAction, MazeCost>::new();

        let root = tree.push(SearchTreeNode::new_root(MazeState::new(0, 0), true, 3));
        let a = tree.push(SearchTreeNode::new(
            MazeState::new(0, 1),
            (root, MazeAction::Right),
            true,
            1,
            2,
        ));
        let b = tree.push(SearchTreeNode::new(
            MazeState::new(0, 2),
            (a, MazeAction::Right),
            true,
            4,
            0,
        ));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[b].f(), 4);
        assert_eq!(tree[b].action(), Some(MazeAction::Right));
        assert_eq!(tree[root].action(), None);

        let path = tree.path(&space, b);
        assert_eq!(path.start, MazeState::new(0, 0));
        assert_eq!(path.end, MazeState::new(0, 2));
        assert_eq!(path.cost, 4);
        assert_eq!(path.actions, vec![MazeAction::Right, MazeAction::Right]);
    }
}
