use crate::error::DndError;

/// A single line of a document, without its line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    /// 1-based line number
    pub number: usize,
    /// Offset of the first byte of the line
    pub from: usize,
    /// Offset just past the last byte before the line break
    pub to: usize,
}

/// Maps between byte offsets and 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Line number holding `offset`. The offset just past the end is valid.
    pub fn line_of_offset(&self, offset: usize) -> Result<usize, DndError> {
        if offset > self.len {
            return Err(DndError::PositionOutsideDocument {
                offset,
                len: self.len,
            });
        }
        Ok(self.starts.partition_point(|&start| start <= offset))
    }

    pub fn line(&self, number: usize) -> Result<LineRef, DndError> {
        if number == 0 || number > self.starts.len() {
            return Err(DndError::LineOutOfRange {
                line: number,
                line_count: self.starts.len(),
            });
        }
        let from = self.starts[number - 1];
        let to = match self.starts.get(number) {
            Some(next) => next - 1,
            None => self.len,
        };
        Ok(LineRef { number, from, to })
    }

    pub fn line_at_offset(&self, offset: usize) -> Result<LineRef, DndError> {
        self.line(self.line_of_offset(offset)?)
    }
}
