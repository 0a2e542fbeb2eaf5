use std::fmt;

/// Whether a GEMM operand is used as stored or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlasOp {
    #[default]
    NoTrans,
    Trans,
}

impl BlasOp {
    pub const fn as_char(self) -> char {
        match self {
            BlasOp::NoTrans => 'N',
            BlasOp::Trans => 'T',
        }
    }

    /// Parse a BLAS transpose flag. Both cases are accepted.
    pub fn from_char(flag: char) -> Option<Self> {
        match flag {
            'n' | 'N' => Some(BlasOp::NoTrans),
            't' | 'T' => Some(BlasOp::Trans),
            _ => None,
        }
    }

    /// Column-major storage shape `(rows, cols)` of an operand whose logical
    /// shape after applying this op is `rows x cols`.
    pub const fn stored(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            BlasOp::NoTrans => (rows, cols),
            BlasOp::Trans => (cols, rows),
        }
    }
}

impl fmt::Display for BlasOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
