//! Bump allocator backing every AST and type node.
//!
//! One arena lives for a single compiler invocation: tokens, AST nodes,
//! types, symbols, and monomorphized declarations are all allocated from
//! it and freed together when the arena is dropped. `bumpalo` already
//! gives us a block-linked, reset-capable allocator; we keep a thin
//! wrapper so call sites read the same whether they are
//! allocating a node, a slice of fields, or an interned string.

use bumpalo::Bump;

pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Arena { bump: Bump::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            bump: Bump::with_capacity(capacity),
        }
    }

    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(src)
    }

    pub fn alloc_slice_fill_iter<T, I>(&self, iter: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.bump.alloc_slice_fill_iter(iter)
    }

    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Resets the arena, releasing every previous allocation at once.
    /// Used by the editor-protocol server between analyses of the same
    /// document.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_round_trips() {
        let arena = Arena::new();
        let x = arena.alloc(42);
        assert_eq!(*x, 42);
    }

    #[test]
    fn slice_round_trips() {
        let arena = Arena::new();
        let slice = arena.alloc_slice_copy(&[1, 2, 3, 4, 5]);
        assert_eq!(slice, &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn str_round_trips() {
        let arena = Arena::new();
        let s = arena.alloc_str("hello anchor");
        assert_eq!(s, "hello anchor");
    }

    #[test]
    fn reset_frees_and_allows_reuse() {
        let mut arena = Arena::new();
        let _a = arena.alloc(1);
        let _b = arena.alloc(2);
        arena.reset();
        let c = arena.alloc(3);
        assert_eq!(*c, 3);
    }
}
