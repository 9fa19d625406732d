//! This module contains the interface to the source-map collaborator that can
//! correlate bytecode offsets back to ranges in the original source text.
//!
//! The analyzer itself never parses compiler source maps. If a client has one,
//! it implements [`SourceResolver`] on top of it and passes the resolver in
//! when rendering a report.

use std::rc::Rc;

/// A half-open range in a source file, in the form the compiler's source maps
/// use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SourceRange {
    /// The byte offset of the start of the range in the source file.
    pub offset: usize,

    /// The length of the range in bytes.
    pub length: usize,

    /// The index of the source file in the report's source list.
    pub file_index: usize,
}

impl SourceRange {
    /// Renders the range in the `<offset>:<length>:<fileIndex>` form used by
    /// report locations.
    #[must_use]
    pub fn as_source_map(&self) -> String {
        format!("{}:{}:{}", self.offset, self.length, self.file_index)
    }
}

/// The interface to a collaborator that can resolve bytecode offsets to
/// source ranges.
///
/// # Object Safety
///
/// This trait must remain
/// [object safe](https://doc.rust-lang.org/reference/items/traits.html#object-safety)
/// as the implementors of the trait will be used in dynamic dispatch.
pub trait SourceResolver {
    /// Resolves the instruction at `instruction_pointer` to a range in the
    /// original source, if the mapping is known.
    fn resolve(&self, instruction_pointer: u32) -> Option<SourceRange>;
}

/// A type for a [`SourceResolver`] that is dynamically dispatched.
pub type DynSourceResolver = Rc<dyn SourceResolver>;

/// A resolver for when no source mapping is available, such as when analyzing
/// raw bytecode.
///
/// Every query resolves to [`None`], making report locations fall back to the
/// bytecode offset itself.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NullResolver;

impl NullResolver {
    /// Constructs a new null resolver, wrapped for dynamic dispatch.
    #[must_use]
    pub fn in_rc() -> DynSourceResolver {
        Rc::new(Self)
    }
}

impl SourceResolver for NullResolver {
    fn resolve(&self, _instruction_pointer: u32) -> Option<SourceRange> {
        None
    }
}

#[cfg(test)]
mod test {
    use crate::report::source_map::{NullResolver, SourceRange, SourceResolver};

    #[test]
    fn renders_ranges_in_source_map_form() {
        let range = SourceRange {
            offset: 1234,
            length: 17,
            file_index: 2,
        };
        assert_eq!(range.as_source_map(), "1234:17:2");
    }

    #[test]
    fn null_resolver_never_resolves() {
        assert_eq!(NullResolver.resolve(0), None);
        assert_eq!(NullResolver.resolve(1038), None);
    }
}
