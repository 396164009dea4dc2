use super::VerificationType;
use crate::class_file::{ClassConstantIndex, ConstantPoolOverflow, ConstantsPool, StackMapFrame};
use crate::util::Width;

/// Snapshot of the stack and local variables at a point in the bytecode
///
/// This is the raw form handed over by an instruction emitter: `locals` has one entry per local
/// variable _slot_, so a category-2 value (`long`/`double`) occupies its lowest slot and is
/// followed by a [`VerificationType::Top`] filler in the slot above it. The operand stack is
/// bottom to top with one entry per value (the wire format never splits stack entries).
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Frame<Cls, U> {
    /// Local variables in scope, indexed by slot
    pub locals: Vec<VerificationType<Cls, U>>,

    /// Types of values on the stack
    pub stack: Vec<VerificationType<Cls, U>>,
}

impl<Cls: Clone, U: Clone> Frame<Cls, U> {
    /// Collapse the per-slot local array into the logical verification-type sequence used by the
    /// wire format
    ///
    /// Each category-2 value is represented once, keyed by its lowest slot, and trailing slots
    /// holding no live type information are trimmed. Interior `Top` entries are live (they mark
    /// slots the verifier must treat as unusable) and are kept.
    pub fn compact(&self) -> CompactFrame<Cls, U> {
        let mut locals = Vec::with_capacity(self.locals.len());
        let mut slots = self.locals.iter();
        while let Some(slot) = slots.next() {
            locals.push(slot.clone());
            if slot.width() == 2 {
                let filler = slots.next();
                assert!(
                    matches!(filler, None | Some(VerificationType::Top)),
                    "category-2 local must be followed by a Top filler slot"
                );
            }
        }
        while matches!(locals.last(), Some(VerificationType::Top)) {
            locals.pop();
        }

        CompactFrame {
            locals,
            stack: self.stack.clone(),
        }
    }
}

impl Frame<String, u16> {
    /// Resolve the frame into its serializable form
    pub fn into_serializable(
        &self,
        constants: &mut ConstantsPool,
    ) -> Result<Frame<ClassConstantIndex, u16>, ConstantPoolOverflow> {
        Ok(Frame {
            locals: self
                .locals
                .iter()
                .map(|t| t.into_serializable(constants))
                .collect::<Result<_, _>>()?,
            stack: self
                .stack
                .iter()
                .map(|t| t.into_serializable(constants))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Compacted view of a [`Frame`]: one verification type per logical variable
///
/// Two compacted frames are compared only by their verification-type sequences; the raw slot
/// layout has already been discarded.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct CompactFrame<Cls, U> {
    pub locals: Vec<VerificationType<Cls, U>>,
    pub stack: Vec<VerificationType<Cls, U>>,
}

impl CompactFrame<ClassConstantIndex, u16> {
    /// Compute a stack map frame for this frame, given the previous frame
    ///
    /// This will fall back to the `Full` option using [`Self::full_stack_map_frame`] only if none
    /// of the other stack map frame variants are enough to encode the transition.
    pub fn stack_map_frame(&self, offset_delta: u16, previous_frame: &Self) -> StackMapFrame {
        match self.stack.len() {
            0 => {
                let this_locals_len = self.locals.len();
                let prev_locals_len = previous_frame.locals.len();

                if this_locals_len <= prev_locals_len {
                    let chopped = prev_locals_len - this_locals_len;
                    let this_is_prefix_of_prev =
                        self.locals == previous_frame.locals[..this_locals_len];

                    if chopped < 4 && this_is_prefix_of_prev {
                        if chopped == 0 {
                            return StackMapFrame::SameLocalsNoStack { offset_delta };
                        } else {
                            return StackMapFrame::ChopLocalsNoStack {
                                offset_delta,
                                chopped_k: chopped as u8,
                            };
                        }
                    }
                } else if this_locals_len - prev_locals_len < 4
                    && self.locals[..prev_locals_len] == previous_frame.locals[..]
                {
                    return StackMapFrame::AppendLocalsNoStack {
                        offset_delta,
                        locals: self.locals[prev_locals_len..].to_vec(),
                    };
                }
            }
            1 if self.locals == previous_frame.locals => {
                return StackMapFrame::SameLocalsOneStack {
                    offset_delta,
                    stack: self.stack[0],
                }
            }
            _ => (),
        }

        self.full_stack_map_frame(offset_delta)
    }

    /// Compute a `Full` stack map frame
    pub fn full_stack_map_frame(&self, offset_delta: u16) -> StackMapFrame {
        StackMapFrame::Full {
            offset_delta,
            locals: self.locals.clone(),
            stack: self.stack.clone(),
        }
    }
}
