//! Verifier metadata for method bodies
//!
//! For any specific instruction inside a method body, the stack and locals must have the same
//! structure regardless of which control flow was used to reach that instruction. This
//! information is the _stack map frame_ (a [`Frame`] here), and the set of frames for all
//! possible jump targets in a method is the _stack map table_.
//!
//! Since inferring the stack map table of a method is potentially quite expensive, method code
//! is annotated with a [`crate::class_file::StackMapTable`] attribute which stores the frame for
//! every offset that is the target of a jump. This module turns raw per-slot snapshots into the
//! compacted form the attribute encodes ([`Frame::compact`]) and picks the smallest frame
//! variant that can express each transition ([`CompactFrame::stack_map_frame`]). Producing the
//! snapshots in the first place is the instruction emitter's job, not this crate's.

mod frame;
mod types;

pub use frame::*;
pub use types::*;
