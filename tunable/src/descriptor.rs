use gemmtune_dtype::Element;

use crate::batched::GemmStridedBatchedParams;
use crate::gemm::GemmParams;
use crate::params::{OpParams, Operands};

/// Either GEMM flavour, for code that tunes both through one queue.
#[derive(Debug, Clone, PartialEq)]
pub enum GemmDescriptor<T: Element> {
    Single(GemmParams<T>),
    StridedBatched(GemmStridedBatchedParams<T>),
}

macro_rules! delegate {
    ($self:ident, $params:ident => $body:expr) => {
        match $self {
            GemmDescriptor::Single($params) => $body,
            GemmDescriptor::StridedBatched($params) => $body,
        }
    };
}

impl<T: Element> OpParams for GemmDescriptor<T> {
    type Elem = T;

    fn signature(&self) -> String {
        delegate!(self, p => p.signature())
    }

    fn checked_size_a(&self) -> Option<usize> {
        delegate!(self, p => p.checked_size_a())
    }

    fn checked_size_b(&self) -> Option<usize> {
        delegate!(self, p => p.checked_size_b())
    }

    fn checked_size_c(&self) -> Option<usize> {
        delegate!(self, p => p.checked_size_c())
    }

    fn output_len(&self) -> usize {
        delegate!(self, p => p.output_len())
    }

    fn operands(&self) -> Operands {
        delegate!(self, p => p.operands())
    }

    fn with_operands(&self, operands: Operands) -> Self {
        match self {
            GemmDescriptor::Single(p) => GemmDescriptor::Single(p.with_operands(operands)),
            GemmDescriptor::StridedBatched(p) => GemmDescriptor::StridedBatched(p.with_operands(operands)),
        }
    }
}

impl<T: Element> From<GemmParams<T>> for GemmDescriptor<T> {
    fn from(params: GemmParams<T>) -> Self {
        GemmDescriptor::Single(params)
    }
}

impl<T: Element> From<GemmStridedBatchedParams<T>> for GemmDescriptor<T> {
    fn from(params: GemmStridedBatchedParams<T>) -> Self {
        GemmDescriptor::StridedBatched(params)
    }
}
