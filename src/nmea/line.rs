use tinyvec::ArrayVec;

pub type Line<const N: usize> = ArrayVec<[u8; N]>;

/// Collects bytes into LF-terminated lines of at most `N - 1` bytes.
///
/// Carriage returns are dropped. A line that outgrows the buffer is thrown
/// away together with the byte that overflowed it, and assembly starts over
/// from empty, so a corrupted line never bleeds into the next one.
pub struct LineAssembler<const N: usize> {
    buf: Line<N>,
    overflows: u32,
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineAssembler<N> {
    pub const MAX_LEN: usize = N - 1;

    pub fn new() -> Self {
        Self {
            buf: Line::default(),
            overflows: 0,
        }
    }

    /// Returns the finished line (without terminator) when `byte` is LF.
    pub fn feed(&mut self, byte: u8) -> Option<Line<N>> {
        match byte {
            b'\r' => None,
            b'\n' => Some(core::mem::take(&mut self.buf)),
            _ if self.buf.len() < Self::MAX_LEN => {
                self.buf.push(byte);
                None
            }
            _ => {
                trace!("line overflow after {=usize} bytes", self.buf.len());
                self.buf.clear();
                self.overflows = self.overflows.wrapping_add(1);
                None
            }
        }
    }

    /// Bytes of the line currently being assembled.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Lines discarded for being too long.
    pub fn overflows(&self) -> u32 {
        self.overflows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all<const N: usize>(asm: &mut LineAssembler<N>, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes
            .iter()
            .filter_map(|&b| asm.feed(b))
            .map(|line| line.to_vec())
            .collect()
    }

    #[test]
    fn yields_lines_without_terminators() {
        let mut asm = LineAssembler::<32>::new();
        let lines = feed_all(&mut asm, b"$GPRMC,1\r\n$GPGGA,2\r\npartial");
        assert_eq!(lines, vec![b"$GPRMC,1".to_vec(), b"$GPGGA,2".to_vec()]);
        assert_eq!(asm.pending(), 7);
    }

    #[test]
    fn bare_lf_and_empty_lines() {
        let mut asm = LineAssembler::<16>::new();
        let lines = feed_all(&mut asm, b"a\n\r\nb\n");
        assert_eq!(lines, vec![b"a".to_vec(), Vec::new(), b"b".to_vec()]);
    }

    #[test]
    fn holds_capacity_minus_one() {
        let mut asm = LineAssembler::<8>::new();
        let lines = feed_all(&mut asm, b"1234567\n");
        assert_eq!(lines, vec![b"1234567".to_vec()]);
        assert_eq!(asm.overflows(), 0);
    }

    #[test]
    fn overflow_drops_line_and_byte() {
        let mut asm = LineAssembler::<8>::new();
        // The eighth byte overflows: it and the seven before it are dropped
        let lines = feed_all(&mut asm, b"12345678abc\n");
        assert_eq!(lines, vec![b"abc".to_vec()]);
        assert_eq!(asm.overflows(), 1);
    }

    #[test]
    fn resynchronises_after_overflow() {
        let mut asm = LineAssembler::<8>::new();
        let lines = feed_all(&mut asm, b"0123456789012345\nok\n");
        assert_eq!(asm.overflows(), 2);
        assert_eq!(lines.last(), Some(&b"ok".to_vec()));
    }
}
