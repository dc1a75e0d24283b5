//! ISO-TP (ISO 15765-2) message reconstruction
//!
//! Reconstructs multi-frame diagnostic responses from individual CAN frames.
//! Each arbitration ID is reassembled independently: the `Reassembler` owns a
//! table of in-flight buffers keyed by CAN ID, so concurrent exchanges on
//! different IDs never interfere. Within one ID, frames must arrive in order;
//! a consecutive-index gap is a protocol error, not something to reorder.
//!
//! Flow control frames are classified and dropped. This library decodes
//! pre-captured responses, so there is no peer to send a flow control frame
//! back to - a deliberate simplification over the full ISO-TP handshake.

use crate::types::{CanFrame, DecoderError, Result};
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

const SF_PCI: u8 = 0x00; // Single Frame
const FF_PCI: u8 = 0x10; // First Frame
const CF_PCI: u8 = 0x20; // Consecutive Frame
const FC_PCI: u8 = 0x30; // Flow Control

/// ISO-TP classification of one CAN frame's data bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TpFrame {
    /// Complete message in one frame; length from the low PCI nibble
    Single { len: usize, payload: Vec<u8> },
    /// Start of a multi-frame message with its declared total length
    First { total_len: usize, payload: Vec<u8> },
    /// Continuation carrying the next payload chunk
    Consecutive { index: u8, payload: Vec<u8> },
    /// Flow control handshake frame (ignored during offline decoding)
    FlowControl { flag: u8, block_size: u8, st_min: u8 },
}

impl TpFrame {
    /// Classify a raw CAN frame by its PCI nibble
    pub fn classify(frame: &CanFrame) -> Result<TpFrame> {
        let data = &frame.data;
        if data.is_empty() {
            return Err(DecoderError::FrameFormat(
                "frame has no data bytes to classify".to_string(),
            ));
        }

        match data[0] & 0xF0 {
            SF_PCI => {
                let len = (data[0] & 0x0F) as usize;
                if len == 0 || len > 7 || len > data.len() - 1 {
                    return Err(DecoderError::FrameFormat(format!(
                        "single frame declares {} payload bytes but carries {}",
                        len,
                        data.len() - 1
                    )));
                }
                Ok(TpFrame::Single {
                    len,
                    payload: data[1..1 + len].to_vec(),
                })
            }
            FF_PCI => {
                if data.len() < 3 {
                    return Err(DecoderError::FrameFormat(
                        "first frame is too short for a length field".to_string(),
                    ));
                }
                let total_len = (((data[0] & 0x0F) as usize) << 8) | data[1] as usize;
                if total_len > 0 {
                    return Ok(TpFrame::First {
                        total_len,
                        payload: data[2..].to_vec(),
                    });
                }
                // FF_DL of 0 switches to the escape encoding: the next four
                // bytes carry a 32-bit length and the payload starts at byte 6.
                if data.len() < 7 {
                    return Err(DecoderError::FrameFormat(
                        "first frame is too short for an escape length field".to_string(),
                    ));
                }
                let total_len = BigEndian::read_u32(&data[2..6]) as usize;
                if total_len == 0 {
                    return Err(DecoderError::FrameFormat(
                        "first frame declares a zero-length message".to_string(),
                    ));
                }
                Ok(TpFrame::First {
                    total_len,
                    payload: data[6..].to_vec(),
                })
            }
            CF_PCI => Ok(TpFrame::Consecutive {
                index: data[0] & 0x0F,
                payload: data[1..].to_vec(),
            }),
            FC_PCI => {
                if (data[0] & 0x0F) > 2 {
                    return Err(DecoderError::FrameFormat(format!(
                        "flow control frame has invalid flow status {}",
                        data[0] & 0x0F
                    )));
                }
                Ok(TpFrame::FlowControl {
                    flag: data[0] & 0x0F,
                    block_size: data.get(1).copied().unwrap_or(0),
                    st_min: data.get(2).copied().unwrap_or(0),
                })
            }
            pci => Err(DecoderError::FrameFormat(format!(
                "unknown ISO-TP PCI nibble 0x{:X}",
                pci >> 4
            ))),
        }
    }
}

/// Policy for a First/Single frame arriving while its ID is still collecting
///
/// Real devices are not consistent here, so the choice is configuration
/// rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MidMessagePolicy {
    /// Treat the premature new message as a protocol violation (default)
    #[default]
    Error,
    /// Discard the in-flight buffer and start reassembling the new message
    Restart,
}

/// One completed ISO-TP payload, tagged with its source arbitration ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPayload {
    /// Arbitration ID the frames arrived on
    pub can_id: u32,
    /// Reassembled payload bytes, exactly the declared length
    pub data: Vec<u8>,
}

/// In-flight reassembly state for one arbitration ID
#[derive(Debug)]
struct ReassemblyBuffer {
    /// Declared total message length from the first frame
    total_len: usize,
    /// Accumulated payload bytes; never grows past total_len
    data: Vec<u8>,
    /// Next expected consecutive frame index (mod 16)
    next_index: u8,
}

impl ReassemblyBuffer {
    fn new(total_len: usize, mut first_chunk: Vec<u8>) -> Self {
        first_chunk.truncate(total_len);
        ReassemblyBuffer {
            total_len,
            data: first_chunk,
            next_index: 1,
        }
    }

    fn is_complete(&self) -> bool {
        self.data.len() >= self.total_len
    }

    /// Append a consecutive frame's payload, trimming the final chunk to the
    /// declared length. Returns true once the message is complete.
    fn absorb(&mut self, index: u8, payload: &[u8]) -> std::result::Result<bool, String> {
        if index != self.next_index {
            return Err(format!(
                "expected consecutive index {} but got {}",
                self.next_index, index
            ));
        }
        let remaining = self.total_len - self.data.len();
        self.data.extend_from_slice(&payload[..remaining.min(payload.len())]);
        self.next_index = (self.next_index + 1) & 0x0F;
        Ok(self.is_complete())
    }
}

/// ISO-TP reassembler for captured diagnostic exchanges
///
/// Owns the per-arbitration-ID buffer table; create one instance per logical
/// capture session. The reassembler assumes single-writer access - sharing
/// one instance across threads requires external mutual exclusion.
#[derive(Debug)]
pub struct Reassembler {
    buffers: HashMap<u32, ReassemblyBuffer>,
    policy: MidMessagePolicy,
}

impl Reassembler {
    /// Create a reassembler with the default mid-message policy
    pub fn new() -> Self {
        Self::with_policy(MidMessagePolicy::default())
    }

    /// Create a reassembler with an explicit mid-message policy
    pub fn with_policy(policy: MidMessagePolicy) -> Self {
        Reassembler {
            buffers: HashMap::new(),
            policy,
        }
    }

    /// Number of arbitration IDs currently collecting a multi-frame message
    pub fn in_flight(&self) -> usize {
        self.buffers.len()
    }

    /// True if the given arbitration ID has a message in progress
    pub fn is_collecting(&self, can_id: u32) -> bool {
        self.buffers.contains_key(&can_id)
    }

    /// Discard any in-flight buffer for the given arbitration ID
    pub fn reset(&mut self, can_id: u32) {
        self.buffers.remove(&can_id);
    }

    /// Process one frame in arrival order
    ///
    /// Returns `Ok(Some(payload))` when the frame completes a message,
    /// `Ok(None)` while a message is still collecting (or for ignored flow
    /// control frames), and an error on a protocol violation. A protocol
    /// error discards the in-flight buffer for that ID; reassembly can
    /// restart from idle on a later First or Single frame.
    pub fn push_frame(&mut self, frame: &CanFrame) -> Result<Option<AssembledPayload>> {
        let can_id = frame.can_id;

        match TpFrame::classify(frame)? {
            TpFrame::Single { len, payload } => {
                if self.buffers.remove(&can_id).is_some() {
                    match self.policy {
                        MidMessagePolicy::Error => {
                            return Err(DecoderError::ReassemblyProtocol {
                                can_id,
                                reason: "single frame arrived mid-collection".to_string(),
                            });
                        }
                        MidMessagePolicy::Restart => {
                            log::debug!(
                                "Restarting reassembly on 0x{:X} for a new single frame",
                                can_id
                            );
                        }
                    }
                }
                log::trace!("Single frame on 0x{:X}: {} bytes", can_id, len);
                Ok(Some(AssembledPayload {
                    can_id,
                    data: payload,
                }))
            }
            TpFrame::First { total_len, payload } => {
                if self.buffers.remove(&can_id).is_some() {
                    match self.policy {
                        MidMessagePolicy::Error => {
                            return Err(DecoderError::ReassemblyProtocol {
                                can_id,
                                reason: "first frame arrived mid-collection".to_string(),
                            });
                        }
                        MidMessagePolicy::Restart => {
                            log::debug!(
                                "Restarting reassembly on 0x{:X} for a new first frame",
                                can_id
                            );
                        }
                    }
                }
                log::trace!(
                    "First frame on 0x{:X}: {} of {} bytes",
                    can_id,
                    payload.len(),
                    total_len
                );
                let buffer = ReassemblyBuffer::new(total_len, payload);
                if buffer.is_complete() {
                    // A first frame can satisfy its own declared length when
                    // the sender should have used a single frame instead.
                    return Ok(Some(AssembledPayload {
                        can_id,
                        data: buffer.data,
                    }));
                }
                self.buffers.insert(can_id, buffer);
                Ok(None)
            }
            TpFrame::Consecutive { index, payload } => {
                let mut buffer = match self.buffers.remove(&can_id) {
                    Some(buffer) => buffer,
                    None => {
                        return Err(DecoderError::ReassemblyProtocol {
                            can_id,
                            reason: format!(
                                "consecutive frame {} with no message in progress",
                                index
                            ),
                        });
                    }
                };
                match buffer.absorb(index, &payload) {
                    Ok(true) => {
                        log::trace!(
                            "Completed {}-byte message on 0x{:X}",
                            buffer.total_len,
                            can_id
                        );
                        Ok(Some(AssembledPayload {
                            can_id,
                            data: buffer.data,
                        }))
                    }
                    Ok(false) => {
                        self.buffers.insert(can_id, buffer);
                        Ok(None)
                    }
                    Err(reason) => Err(DecoderError::ReassemblyProtocol { can_id, reason }),
                }
            }
            TpFrame::FlowControl { flag, .. } => {
                log::trace!("Ignoring flow control frame on 0x{:X} (status {})", can_id, flag);
                Ok(None)
            }
        }
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
