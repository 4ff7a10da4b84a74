//! Tape frame layout constants.
//!
//! Centralizes every offset the emitter, the call-lowering pass, and tests
//! agree on, so the frame shape only needs to change in one place.

/// Offset of the return-flag cell within a function frame. Initialized to 1
/// on entry; cleared by `return` (and by falling off the end of the body)
/// to terminate the body's outer guard loop.
pub const RETURN_FLAG: usize = 0;

/// Offset of the return-value cell within a function frame.
pub const RETURN_VALUE: usize = 1;

/// First cell offset available to parameters, locals, and temporaries.
pub const FIRST_PARAM: usize = 2;

/// Ceiling on inlined call depth used only to catch runaway mutual
/// recursion during semantic analysis before it produces an unbounded
/// instruction buffer; recursion itself is rejected outright (see
/// `SemanticError::Recursion`), this is a backstop against call chains
/// that are not recursive but are absurdly deep.
pub const MAX_INLINE_DEPTH: usize = 64;

/// Every array reserves one extra leading cell (kept permanently at zero
/// at rest) ahead of its elements. Element `k` lives at `symbol.cell +
/// ARRAY_WALK_LANE_CELLS + k`; the lane cell itself is presently unused by
/// the indexing strategy (a compile-time-unrolled comparison scan rather
/// than a single runtime pointer walk — see DESIGN.md) but is kept
/// reserved so that strategy can be swapped in later without changing
/// frame layout or invalidating `Type::size_in_cells`.
pub const ARRAY_WALK_LANE_CELLS: usize = 1;
