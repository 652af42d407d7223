use crate::error::ScriptError;

/// Maximum number of elements allowed across the main stack and altstack
/// combined.
pub(crate) const MAX_STACK_SIZE: usize = 1000;

/// Maximum size in bytes of a single stack element (`MAX_SCRIPT_ELEMENT_SIZE`).
pub(crate) const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Determines whether a byte slice is "true" under Bitcoin Script semantics.
///
/// Bitcoin defines false as any representation of zero:
/// - Empty byte vector
/// - All bytes `0x00`, except the last byte may be `0x80` (negative zero)
///
/// Everything else is true.
pub(crate) fn is_true(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    for byte in &bytes[..bytes.len() - 1] {
        if *byte != 0x00 {
            return true;
        }
    }
    let last = bytes[bytes.len() - 1];
    last != 0x00 && last != 0x80
}

/// Internal execution stack for the Bitcoin Script engine.
///
/// Elements are arbitrary byte vectors (`Vec<u8>`). The stack grows
/// upward: `push` appends to the end, `pop` removes from the end. A
/// companion altstack shares the same combined size bound.
pub(crate) struct Stack {
    items: Vec<Vec<u8>>,
    alt: Vec<Vec<u8>>,
}

impl Stack {
    /// Creates an empty stack.
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            alt: Vec::new(),
        }
    }

    fn combined_len(&self) -> usize {
        self.items.len() + self.alt.len()
    }

    /// Pushes a byte vector onto the top of the stack.
    ///
    /// Rejects elements over `MAX_SCRIPT_ELEMENT_SIZE` bytes or pushes that
    /// would exceed `MAX_STACK_SIZE` across both stacks.
    pub(crate) fn push(&mut self, item: Vec<u8>) -> Result<(), ScriptError> {
        if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::PushSize);
        }
        if self.combined_len() >= MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes and returns the top element.
    pub(crate) fn pop(&mut self) -> Result<Vec<u8>, ScriptError> {
        self.items.pop().ok_or(ScriptError::InvalidStackOperation)
    }

    /// Returns a reference to the top element without removing it.
    pub(crate) fn peek(&self) -> Result<&[u8], ScriptError> {
        self.items
            .last()
            .map(|v| v.as_slice())
            .ok_or(ScriptError::InvalidStackOperation)
    }

    /// Returns a reference to the element `n` positions below the top
    /// (`n == 0` is the top itself), used by `OP_PICK`/`OP_ROLL`/`OP_OVER`.
    pub(crate) fn peek_back(&self, n: usize) -> Result<&[u8], ScriptError> {
        let len = self.items.len();
        if n >= len {
            return Err(ScriptError::InvalidStackOperation);
        }
        Ok(&self.items[len - 1 - n])
    }

    /// Returns the number of elements on the main stack.
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the main stack contains no elements.
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pushes a boolean value using Bitcoin Script encoding.
    ///
    /// `true` is encoded as `[0x01]`, `false` as `[]` (empty vector).
    pub(crate) fn push_bool(&mut self, val: bool) -> Result<(), ScriptError> {
        self.push(if val { vec![0x01] } else { Vec::new() })
    }

    /// Removes and returns the element at the given bottom-relative index
    /// (0 = bottom).
    pub(crate) fn remove(&mut self, idx: usize) -> Result<Vec<u8>, ScriptError> {
        if idx >= self.items.len() {
            return Err(ScriptError::InvalidStackOperation);
        }
        Ok(self.items.remove(idx))
    }

    /// Removes and returns the element `n` positions below the top
    /// (used by `OP_ROLL`).
    pub(crate) fn remove_back(&mut self, n: usize) -> Result<Vec<u8>, ScriptError> {
        let len = self.items.len();
        if n >= len {
            return Err(ScriptError::InvalidStackOperation);
        }
        Ok(self.items.remove(len - 1 - n))
    }

    /// Inserts `item` so that it ends up `n` positions below the new top
    /// (used by `OP_ROLL` to relocate the rolled element, and `OP_TUCK`).
    pub(crate) fn insert_back(&mut self, n: usize, item: Vec<u8>) -> Result<(), ScriptError> {
        let len = self.items.len();
        if n > len {
            return Err(ScriptError::InvalidStackOperation);
        }
        if item.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptError::PushSize);
        }
        if self.combined_len() >= MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
        self.items.insert(len - n, item);
        Ok(())
    }

    /// Swaps the two top-relative elements at distances `a` and `b` from
    /// the top (used by `OP_SWAP`/`OP_2SWAP`/`OP_ROT`-family helpers).
    pub(crate) fn swap_back(&mut self, a: usize, b: usize) -> Result<(), ScriptError> {
        let len = self.items.len();
        if a >= len || b >= len {
            return Err(ScriptError::InvalidStackOperation);
        }
        self.items.swap(len - 1 - a, len - 1 - b);
        Ok(())
    }

    // ── Altstack ──────────────────────────────────────────────────────

    /// Moves the top main-stack element to the altstack (`OP_TOALTSTACK`).
    pub(crate) fn to_alt(&mut self) -> Result<(), ScriptError> {
        let item = self.items.pop().ok_or(ScriptError::InvalidStackOperation)?;
        self.alt.push(item);
        Ok(())
    }

    /// Moves the top altstack element back to the main stack
    /// (`OP_FROMALTSTACK`).
    pub(crate) fn from_alt(&mut self) -> Result<(), ScriptError> {
        let item = self
            .alt
            .pop()
            .ok_or(ScriptError::InvalidAltstackOperation)?;
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn alt_len(&self) -> usize {
        self.alt.len()
    }

    /// Deep copy of the main-stack contents, bottom to top. Used by the
    /// P2SH verify path to restore the stack to how it looked before the
    /// output script ran.
    pub(crate) fn snapshot(&self) -> Vec<Vec<u8>> {
        self.items.clone()
    }

    /// Rebuilds a stack from a previously taken [`Stack::snapshot`].
    pub(crate) fn from_items(items: Vec<Vec<u8>>) -> Self {
        Stack {
            items,
            alt: Vec::new(),
        }
    }

    /// Drops every element except the top `n` (used when a witness
    /// program's result collapses the stack to a single value before a
    /// CLEANSTACK check).
    pub(crate) fn truncate_keep_top(&mut self, n: usize) {
        if self.items.len() > n {
            let drop_count = self.items.len() - n;
            self.items.drain(0..drop_count);
        }
    }
}

/// Tracks the nesting of `OP_IF`/`OP_NOTIF`/`OP_ELSE` branches during
/// execution without materializing a `Vec<bool>` per level: only the
/// total depth and the depth of the first still-false branch are kept,
/// mirroring Bitcoin Core's `ConditionStack` optimization.
#[derive(Debug, Default)]
pub(crate) struct ConditionStack {
    size: usize,
    first_false_pos: Option<usize>,
}

impl ConditionStack {
    pub(crate) fn new() -> Self {
        ConditionStack {
            size: 0,
            first_false_pos: None,
        }
    }

    pub(crate) fn empty(&self) -> bool {
        self.size == 0
    }

    /// `true` while every enclosing branch is taken (i.e. opcodes should
    /// actually execute, not just be parsed).
    pub(crate) fn all_true(&self) -> bool {
        self.first_false_pos.is_none()
    }

    pub(crate) fn push(&mut self, branch_taken: bool) {
        if self.first_false_pos.is_none() && !branch_taken {
            self.first_false_pos = Some(self.size);
        }
        self.size += 1;
    }

    pub(crate) fn pop(&mut self) -> Result<(), ScriptError> {
        if self.size == 0 {
            return Err(ScriptError::UnbalancedConditional);
        }
        self.size -= 1;
        if self.first_false_pos == Some(self.size) {
            self.first_false_pos = None;
        }
        Ok(())
    }

    /// Flips the branch state of the innermost still-open conditional
    /// (`OP_ELSE`).
    pub(crate) fn toggle_top(&mut self) -> Result<(), ScriptError> {
        if self.size == 0 {
            return Err(ScriptError::UnbalancedConditional);
        }
        match self.first_false_pos {
            None => self.first_false_pos = Some(self.size - 1),
            Some(pos) if pos == self.size - 1 => self.first_false_pos = None,
            Some(_) => {} // an enclosing branch is already false; no visible change
        }
        Ok(())
    }
}
