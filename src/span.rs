use miette::SourceSpan;

/// Byte offset relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub usize);

/// Holds a view into a source, usually a single trimmed line.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: usize,
}

impl Span {
    pub fn new(start: Idx, len: usize) -> Self {
        Span { start, len }
    }

    /// Span of `part`, which must be a subslice of `src`.
    pub fn of(src: &str, part: &str) -> Self {
        let start = part.as_ptr() as usize - src.as_ptr() as usize;
        debug_assert!(start + part.len() <= src.len(), "`part` is not inside `src`");
        Span::new(Idx(start), part.len())
    }

    pub fn offs(&self) -> usize {
        self.start.0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.offs().into(), value.len())
    }
}
