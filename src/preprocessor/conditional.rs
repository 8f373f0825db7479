//! `#if`/`#ifdef`/`#elif`/`#else`/`#endif` conditional-compilation stack.

/// State of one open conditional-compilation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// This branch's condition was true and no enclosing branch is skipped;
    /// its content is emitted.
    Taken,
    /// A prior branch of this `#if` was taken; this one (and any further
    /// `#elif`) must be skipped, but a later `#else` is still legal.
    SkipAwaitingElse,
    /// The `#else` branch of this `#if` was reached and taken.
    TakenElse,
    /// Nothing in this `#if` chain has been taken yet; an `#elif` may still
    /// take it.
    SkipUntilTaken,
}

impl BranchState {
    /// Whether content directly inside this frame should be emitted/lexed
    /// (not just parsed for directive structure).
    pub fn is_active(self) -> bool {
        matches!(self, BranchState::Taken | BranchState::TakenElse)
    }
}

#[derive(Debug)]
struct Frame {
    state: BranchState,
    else_seen: bool,
}

/// Tracks nested `#if` frames. Content is only active when every frame on
/// the stack is active — a single skipped ancestor skips everything nested
/// inside it, regardless of nested conditions (`spec.md` §4.3: "nested
/// conditionals inside a skipped region are parsed for structure only").
#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<Frame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True if the current position is being emitted (all enclosing frames
    /// active). Directives still parse even when this is false, but macro
    /// expansion and content emission do not happen, and undefined
    /// identifiers in *nested* conditionals' controlling expressions are not
    /// errors.
    pub fn is_active(&self) -> bool {
        self.frames.iter().all(|f| f.state.is_active())
    }

    /// Whether the *immediately enclosing* frame (not the whole ancestor
    /// chain) is active — used to decide whether an `#if`'s own controlling
    /// expression should be evaluated with errors enabled, per spec.md's
    /// "undefined identifiers in nested conditionals are not errors" rule:
    /// only the outermost skipped frame suppresses expression errors for
    /// everything nested inside it.
    pub fn parent_is_active(&self) -> bool {
        self.frames.iter().all(|f| f.state.is_active())
    }

    pub fn push_if(&mut self, condition_true: bool) {
        let active = self.is_active();
        let state = if !active {
            BranchState::SkipUntilTaken
        } else if condition_true {
            BranchState::Taken
        } else {
            BranchState::SkipUntilTaken
        };
        self.frames.push(Frame { state, else_seen: false });
    }

    pub fn handle_elif(&mut self, condition_true: bool) -> Result<(), ConditionalError> {
        let outer_active = self.frames.len() >= 2
            && self.frames[..self.frames.len() - 1].iter().all(|f| f.state.is_active());
        let outer_active = if self.frames.len() == 1 { true } else { outer_active };
        let frame = self.frames.last_mut().ok_or(ConditionalError::ElifWithoutIf)?;
        if frame.else_seen {
            return Err(ConditionalError::ElifAfterElse);
        }
        frame.state = match frame.state {
            BranchState::Taken | BranchState::TakenElse => BranchState::SkipAwaitingElse,
            BranchState::SkipAwaitingElse => BranchState::SkipAwaitingElse,
            BranchState::SkipUntilTaken if outer_active && condition_true => BranchState::Taken,
            BranchState::SkipUntilTaken => BranchState::SkipUntilTaken,
        };
        Ok(())
    }

    pub fn handle_else(&mut self) -> Result<(), ConditionalError> {
        let outer_active = self.frames.len() <= 1
            || self.frames[..self.frames.len() - 1].iter().all(|f| f.state.is_active());
        let frame = self.frames.last_mut().ok_or(ConditionalError::ElseWithoutIf)?;
        if frame.else_seen {
            return Err(ConditionalError::DuplicateElse);
        }
        frame.else_seen = true;
        frame.state = match frame.state {
            BranchState::Taken | BranchState::TakenElse | BranchState::SkipAwaitingElse => {
                BranchState::SkipAwaitingElse
            }
            BranchState::SkipUntilTaken if outer_active => BranchState::TakenElse,
            BranchState::SkipUntilTaken => BranchState::SkipUntilTaken,
        };
        Ok(())
    }

    pub fn handle_endif(&mut self) -> Result<(), ConditionalError> {
        self.frames.pop().map(|_| ()).ok_or(ConditionalError::EndifWithoutIf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalError {
    ElifWithoutIf,
    ElifAfterElse,
    ElseWithoutIf,
    DuplicateElse,
    EndifWithoutIf,
}

impl std::fmt::Display for ConditionalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ConditionalError::ElifWithoutIf => "#elif without matching #if",
            ConditionalError::ElifAfterElse => "#elif may not follow #else",
            ConditionalError::ElseWithoutIf => "#else without matching #if",
            ConditionalError::DuplicateElse => "#else may appear at most once per #if",
            ConditionalError::EndifWithoutIf => "#endif without matching #if",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ConditionalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_if_else() {
        let mut stack = ConditionalStack::new();
        stack.push_if(false);
        assert!(!stack.is_active());
        stack.handle_else().unwrap();
        assert!(stack.is_active());
        stack.handle_endif().unwrap();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn nested_conditional_inside_skipped_region_stays_inactive() {
        let mut stack = ConditionalStack::new();
        stack.push_if(false); // #if 0
        stack.push_if(true); // nested #if 1, but outer is inactive
        assert!(!stack.is_active());
        stack.handle_endif().unwrap();
        stack.handle_endif().unwrap();
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn duplicate_else_is_an_error() {
        let mut stack = ConditionalStack::new();
        stack.push_if(true);
        stack.handle_else().unwrap();
        assert_eq!(stack.handle_else(), Err(ConditionalError::DuplicateElse));
    }

    #[test]
    fn elif_after_else_is_an_error() {
        let mut stack = ConditionalStack::new();
        stack.push_if(true);
        stack.handle_else().unwrap();
        assert_eq!(stack.handle_elif(true), Err(ConditionalError::ElifAfterElse));
    }
}
