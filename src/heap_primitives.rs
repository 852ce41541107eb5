// Index arithmetic for d-ary heaps stored in a flat array.
//
// ```text
//                 0
//        1        2        3        (A = 3)
//     4  5  6  7  8  9  10 11 12
// ```
//
// The last level will often be incomplete.
//
//   - Up:          `(i-1)//A`
//   - First child: `(A*i) + 1`
//   - Last child:  `A*(i+1)`

/// The parent node
///
/// ```
/// use search::heap_primitives::index_parent;
/// assert_eq!(index_parent::<2>(1), 0);
/// assert_eq!(index_parent::<2>(2), 0);
/// assert_eq!(index_parent::<2>(6), 2);
/// assert_eq!(index_parent::<4>(4), 0);
/// assert_eq!(index_parent::<4>(5), 1);
/// ```
#[inline(always)]
#[must_use]
pub fn index_parent<const A: usize>(i: usize) -> usize {
    debug_assert!(i > 0, "The root has no parent");
    (i - 1) / A
}

/// The first children
///
/// ```
/// use search::heap_primitives::index_first_children;
/// assert_eq!(index_first_children::<2>(0), 1);
/// assert_eq!(index_first_children::<2>(3), 7);
/// assert_eq!(index_first_children::<4>(1), 5);
/// ```
#[inline(always)]
#[must_use]
pub fn index_first_children<const A: usize>(i: usize) -> usize {
    (A * i) + 1
}

/// The last children
///
/// ```
/// use search::heap_primitives::index_last_children;
/// assert_eq!(index_last_children::<2>(0), 2);
/// assert_eq!(index_last_children::<2>(4), 10);
/// assert_eq!(index_last_children::<4>(1), 8);
/// ```
#[inline(always)]
#[must_use]
pub fn index_last_children<const A: usize>(i: usize) -> usize {
    A * (i + 1)
}

/// Offset of the smallest element in a slice of siblings.
///
/// The earliest of equal elements wins.
///
/// ```
/// use search::heap_primitives::index_min;
/// assert_eq!(index_min(&[3, 1, 2, 1]), 1);
/// assert_eq!(index_min(&[7]), 0);
/// ```
#[inline(always)]
#[must_use]
pub fn index_min<T: PartialOrd>(a: &[T]) -> usize {
    debug_assert!(!a.is_empty());
    let mut best = 0;
    for i in 1..a.len() {
        if a[i] < a[best] {
            best = i;
        }
    }
    best
}
