/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    buffers.rs

    SBD Buffers (component D). The MO byte buffer and MT text buffer, plus
    their monotonic sequence counters. Pure state: no behavior beyond
    fill/overwrite/slice, no I/O, no locking of its own (the engine holds
    these behind its single state mutex).
*/

pub const MO_BUFFER_LEN: usize = 340;

#[derive(Debug)]
pub struct MoBuffer {
    bytes: [u8; MO_BUFFER_LEN],
}

impl Default for MoBuffer {
    fn default() -> Self {
        MoBuffer { bytes: [0u8; MO_BUFFER_LEN] }
    }
}

impl MoBuffer {
    pub fn fill_zero(&mut self) {
        self.bytes = [0u8; MO_BUFFER_LEN];
    }

    /// Zero-fills first, then copies `payload` into the front of the
    /// buffer. `payload.len()` must not exceed [`MO_BUFFER_LEN`].
    pub fn overwrite(&mut self, payload: &[u8]) {
        debug_assert!(payload.len() <= MO_BUFFER_LEN);
        self.fill_zero();
        self.bytes[..payload.len()].copy_from_slice(payload);
    }

    pub fn as_slice(&self) -> &[u8; MO_BUFFER_LEN] {
        &self.bytes
    }

    /// The payload as written: everything through the last non-zero byte.
    /// Empty if the buffer is entirely zero.
    pub fn slice_until_last_nonzero(&self) -> &[u8] {
        match self.bytes.iter().rposition(|&b| b != 0) {
            Some(last) => &self.bytes[..=last],
            None => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct MtBuffer {
    text: String,
}

impl MtBuffer {
    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The MO/MT buffer pair with their sequence counters, grouped because
/// `SBDD2` clears both and both counters bump together on a successful
/// session.
#[derive(Debug, Default)]
pub struct SbdBuffers {
    pub mo: MoBuffer,
    pub mo_seq: u16,
    pub mt: MtBuffer,
    pub mt_seq: u16,
}

impl SbdBuffers {
    pub fn clear_mo(&mut self) {
        self.mo.fill_zero();
    }

    pub fn clear_mt(&mut self) {
        self.mt.clear();
    }

    pub fn clear_both(&mut self) {
        self.clear_mo();
        self.clear_mt();
    }

    /// Bumps both sequence counters on a successful session, wrapping per
    /// the field width like the real module's 16-bit momsn/mtmsn.
    pub fn bump_sequences(&mut self) {
        self.mo_seq = self.mo_seq.wrapping_add(1);
        self.mt_seq = self.mt_seq.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mo_buffer_is_always_340_bytes() {
        let mut mo = MoBuffer::default();
        mo.overwrite(b"Hello");
        assert_eq!(mo.as_slice().len(), MO_BUFFER_LEN);
        assert_eq!(&mo.as_slice()[..5], b"Hello");
        assert!(mo.as_slice()[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn slice_until_last_nonzero_trims_trailing_zeros() {
        let mut mo = MoBuffer::default();
        mo.overwrite(&[1, 2, 3]);
        assert_eq!(mo.slice_until_last_nonzero(), &[1, 2, 3]);
    }

    #[test]
    fn all_zero_buffer_slices_to_empty() {
        let mo = MoBuffer::default();
        assert_eq!(mo.slice_until_last_nonzero(), &[] as &[u8]);
    }

    #[test]
    fn sbdd2_equals_sbdd0_then_sbdd1_either_order() {
        let mut a = SbdBuffers::default();
        a.mo.overwrite(b"x");
        a.mt.set("y");
        a.clear_mo();
        a.clear_mt();

        let mut b = SbdBuffers::default();
        b.mo.overwrite(b"x");
        b.mt.set("y");
        b.clear_mt();
        b.clear_mo();

        assert_eq!(a.mo.as_slice(), b.mo.as_slice());
        assert_eq!(a.mt.as_str(), b.mt.as_str());
    }
}
