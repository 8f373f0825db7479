//! `NodeFlags`: the per-AST-node bitset carried by every declaration and
//! statement node, as required by `spec.md` §3 ("every node carries ... a
//! flag set").

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u32 {
        /// Set by `ReferenceAnalyzer`: transitively reachable from the
        /// entry point. Gates declaration-level emission.
        const REACHABLE          = 1 << 0;
        /// Synthesized by a transformer rather than present in the source
        /// (e.g. the IO-flattening wrapper entry point).
        const GENERATED          = 1 << 1;
        /// Computed by `control_flow::has_non_return_control_path`: true if
        /// some path through a function body reaches its end without a
        /// `return`.
        const HAS_NON_RETURN_PATH = 1 << 2;
        /// This is the resolved entry-point function.
        const IS_ENTRY_POINT     = 1 << 3;
        /// Declared `const`; rejects assignment targets during analysis.
        const IS_IMMUTABLE       = 1 << 4;
        /// Struct is used only as entry-point IO and should not survive as
        /// a nominal type in the output (set by `StructParameterAnalyzer`).
        const IO_ONLY_STRUCT     = 1 << 5;
        /// Declared `static`.
        const IS_STATIC          = 1 << 6;
        /// Declared `uniform`.
        const IS_UNIFORM         = 1 << 7;
    }
}
