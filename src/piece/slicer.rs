use bytes::Bytes;

/// Largest window handed out at once. The piece buffer grows by at most
/// this much per read, so memory follows the content rather than the piece
/// length.
pub const MAX_WINDOW: usize = 64 * 1024;

/// Cuts a byte stream into fixed-size pieces.
///
/// Callers read straight into [`Slicer::window`] and then report how many
/// bytes arrived with [`Slicer::advance`]. A piece is handed back whenever
/// the window fills up; [`Slicer::finish`] returns the trailing partial
/// piece, unpadded.
///
/// ```
/// use create_torrent::piece::Slicer;
///
/// let mut slicer = Slicer::new(4);
/// slicer.window()[..3].copy_from_slice(b"abc");
/// assert!(slicer.advance(3).is_none());
///
/// slicer.window()[..1].copy_from_slice(b"d");
/// assert_eq!(slicer.advance(1).unwrap().as_ref(), b"abcd");
///
/// slicer.window()[..2].copy_from_slice(b"ef");
/// slicer.advance(2);
/// assert_eq!(slicer.finish().unwrap().as_ref(), b"ef");
/// ```
#[derive(Debug)]
pub struct Slicer {
    piece_length: usize,
    buf: Vec<u8>,
    filled: usize,
}

impl Slicer {
    /// Creates a slicer for pieces of `piece_length` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `piece_length` is zero.
    pub fn new(piece_length: usize) -> Self {
        assert!(piece_length > 0, "piece length must be positive");
        Self {
            piece_length,
            buf: Vec::new(),
            filled: 0,
        }
    }

    /// The next unfilled part of the current piece, at most
    /// [`MAX_WINDOW`] bytes long. Never empty.
    pub fn window(&mut self) -> &mut [u8] {
        let want = (self.piece_length - self.filled).min(MAX_WINDOW);
        self.buf.resize(self.filled + want, 0);
        &mut self.buf[self.filled..]
    }

    /// Marks `n` more bytes of the window as filled.
    ///
    /// Returns the completed piece when the window is full.
    pub fn advance(&mut self, n: usize) -> Option<Bytes> {
        self.filled += n;
        debug_assert!(self.filled <= self.buf.len());

        if self.filled < self.piece_length {
            return None;
        }

        let mut piece = std::mem::take(&mut self.buf);
        piece.truncate(self.filled);
        self.filled = 0;
        Some(Bytes::from(piece))
    }

    /// Consumes the slicer, returning the partial last piece if any bytes
    /// are left over.
    pub fn finish(mut self) -> Option<Bytes> {
        if self.filled == 0 {
            return None;
        }
        self.buf.truncate(self.filled);
        Some(Bytes::from(self.buf))
    }
}
