use crate::class_file::{self, BytecodeArray, ConstantsPool, StackMapTable};
use crate::errors::Error;
use crate::verifier::Frame;

/// Semantic representation of a method body
///
/// The bytecode is already encoded by the instruction layer; what this crate adds is the
/// verifier metadata. `frames` is the stack map table in symbolic form: one entry per jump
/// target or other control-flow-significant offset, in ascending offset order.
pub struct Code {
    /// Maximum operand stack depth through the method, as declared by the instruction layer
    pub max_stack: u16,

    /// Maximum size of locals through the method, as declared by the instruction layer
    pub max_locals: u16,

    /// Encoded instructions
    pub bytecode: Vec<u8>,

    /// Type state on entry to the method: the initial locals with an empty stack
    ///
    /// The first entry of `frames` is measured against this state, which is why its offset
    /// delta is the absolute offset.
    pub entry_frame: Frame<String, u16>,

    /// Ascending offset -> type state table for every control-flow-significant offset
    pub frames: Vec<(u16, Frame<String, u16>)>,
}

impl Code {
    /// Serialize the method body into a `Code` attribute structure
    ///
    /// Consecutive states are compacted and pairwise-compared to pick the smallest valid frame
    /// encoding; offsets are turned into deltas here (the wire format's `offset - previous - 1`
    /// rule). Two states registered for the same offset are tolerated when equal and rejected
    /// loudly when they differ.
    pub fn serialize_code(self, constants: &mut ConstantsPool) -> Result<class_file::Code, Error> {
        let mut previous_frame = self.entry_frame.into_serializable(constants)?.compact();
        let mut previous_offset: u16 = 0;
        let mut stack_map_frames = vec![];

        for (offset, frame) in &self.frames {
            let frame = frame.into_serializable(constants)?.compact();
            let offset_delta = if stack_map_frames.is_empty() {
                *offset
            } else if *offset == previous_offset {
                if frame != previous_frame {
                    log::error!(
                        "conflicting type states registered for offset {}",
                        offset
                    );
                    return Err(Error::ConflictingFrames {
                        offset: *offset,
                        frame,
                        existing: previous_frame,
                    });
                } else {
                    continue;
                }
            } else if *offset < previous_offset {
                return Err(Error::FramesOutOfOrder {
                    previous: previous_offset,
                    found: *offset,
                });
            } else {
                *offset - previous_offset - 1
            };
            stack_map_frames.push(frame.stack_map_frame(offset_delta, &previous_frame));

            previous_frame = frame;
            previous_offset = *offset;
        }

        let mut attributes = vec![];

        // Add `StackMapTable` attribute only if there are frames
        if !stack_map_frames.is_empty() {
            let stack_map_table = StackMapTable(stack_map_frames);
            attributes.push(constants.get_attribute(stack_map_table)?);
        }

        Ok(class_file::Code {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            code_array: BytecodeArray(self.bytecode),
            exception_table: vec![],
            attributes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::verifier::VerificationType::*;

    fn states(frames: Vec<(u16, Frame<String, u16>)>) -> Code {
        Code {
            max_stack: 4,
            max_locals: 4,
            bytecode: vec![0xb1],
            entry_frame: Frame {
                locals: vec![Integer],
                stack: vec![],
            },
            frames,
        }
    }

    fn read_u16(body: &[u8], at: &mut usize) -> u16 {
        let value = u16::from_be_bytes([body[*at], body[*at + 1]]);
        *at += 2;
        value
    }

    fn skip_verification_type(body: &[u8], at: &mut usize) {
        let tag = body[*at];
        *at += 1;
        if tag == 7 || tag == 8 {
            *at += 2;
        }
    }

    /// Invert the delta rule: recover `(absolute offset, tag)` pairs from an encoded table body
    fn decode_frame_offsets(body: &[u8]) -> Vec<(u16, u8)> {
        let mut at = 0;
        let entries = read_u16(body, &mut at);
        let mut previous: Option<u16> = None;
        let mut decoded = vec![];

        for _ in 0..entries {
            let tag = body[at];
            at += 1;
            let offset_delta = match tag {
                0..=63 => tag as u16,
                64..=127 => {
                    skip_verification_type(body, &mut at);
                    (tag - 64) as u16
                }
                247 => {
                    let delta = read_u16(body, &mut at);
                    skip_verification_type(body, &mut at);
                    delta
                }
                248..=251 => read_u16(body, &mut at),
                252..=254 => {
                    let delta = read_u16(body, &mut at);
                    for _ in 0..(tag - 251) {
                        skip_verification_type(body, &mut at);
                    }
                    delta
                }
                255 => {
                    let delta = read_u16(body, &mut at);
                    let locals = read_u16(body, &mut at);
                    for _ in 0..locals {
                        skip_verification_type(body, &mut at);
                    }
                    let stack = read_u16(body, &mut at);
                    for _ in 0..stack {
                        skip_verification_type(body, &mut at);
                    }
                    delta
                }
                other => panic!("unused frame tag {}", other),
            };
            let offset = match previous {
                None => offset_delta,
                Some(previous) => previous + offset_delta + 1,
            };
            decoded.push((offset, tag));
            previous = Some(offset);
        }
        assert_eq!(at, body.len(), "decoder must consume the whole body");
        decoded
    }

    #[test]
    fn deltas_round_trip_to_absolute_offsets() {
        let same = Frame {
            locals: vec![Integer],
            stack: vec![],
        };
        let appended = Frame {
            locals: vec![Integer, Integer, Integer],
            stack: vec![],
        };
        let deep_stack = Frame {
            locals: vec![Integer],
            stack: vec![Integer, Integer],
        };

        let code = states(vec![
            (10, same.clone()),
            (15, same.clone()),
            (100, appended),
            (101, same.clone()),
            (200, deep_stack),
        ]);

        let mut constants = ConstantsPool::new();
        let code = code.serialize_code(&mut constants).unwrap();
        assert_eq!(code.attributes.len(), 1);

        // same(10), same(delta 4), append 2(delta 84), chop 2(delta 0), full(delta 98)
        assert_eq!(
            decode_frame_offsets(&code.attributes[0].info),
            vec![(10, 10), (15, 4), (100, 253), (101, 249), (200, 255)]
        );
    }

    #[test]
    fn large_first_offset_uses_the_extended_form() {
        let same = Frame {
            locals: vec![Integer],
            stack: vec![],
        };
        let code = states(vec![(70, same)]);

        let mut constants = ConstantsPool::new();
        let code = code.serialize_code(&mut constants).unwrap();
        assert_eq!(code.attributes[0].info, vec![0, 1, 251, 0, 70]);
    }

    #[test]
    fn methods_without_jump_targets_carry_no_table() {
        let code = states(vec![]);
        let mut constants = ConstantsPool::new();
        let code = code.serialize_code(&mut constants).unwrap();
        assert!(code.attributes.is_empty());
    }

    #[test]
    fn equal_duplicate_offsets_collapse() {
        let same = Frame {
            locals: vec![Integer],
            stack: vec![],
        };
        let code = states(vec![(10, same.clone()), (10, same)]);

        let mut constants = ConstantsPool::new();
        let code = code.serialize_code(&mut constants).unwrap();
        assert_eq!(decode_frame_offsets(&code.attributes[0].info), vec![(10, 10)]);
    }

    #[test]
    fn conflicting_duplicate_offsets_are_rejected() {
        let code = states(vec![
            (
                10,
                Frame {
                    locals: vec![Integer],
                    stack: vec![],
                },
            ),
            (
                10,
                Frame {
                    locals: vec![Float],
                    stack: vec![],
                },
            ),
        ]);

        let mut constants = ConstantsPool::new();
        assert!(matches!(
            code.serialize_code(&mut constants),
            Err(Error::ConflictingFrames { offset: 10, .. })
        ));
    }

    #[test]
    fn backwards_offsets_are_rejected() {
        let same = Frame {
            locals: vec![Integer],
            stack: vec![],
        };
        let code = states(vec![(10, same.clone()), (5, same)]);

        let mut constants = ConstantsPool::new();
        assert!(matches!(
            code.serialize_code(&mut constants),
            Err(Error::FramesOutOfOrder {
                previous: 10,
                found: 5,
            })
        ));
    }
}
