use std::marker::PhantomData;

use bon::bon;
use gemmtune_device::DevicePtr;
use gemmtune_dtype::Element;

use crate::error::Result;
use crate::op::BlasOp;
use crate::params::{OpParams, Operands, checked_product, ensure_addressable, ensure_positive, leading_dimension};

/// A single column-major GEMM: `c = alpha * op(a) * op(b) + beta * c`.
///
/// `op(a)` is `m x k`, `op(b)` is `k x n` and `c` is `m x n`.
#[derive(Debug, Clone, PartialEq)]
pub struct GemmParams<T: Element> {
    pub trans_a: BlasOp,
    pub trans_b: BlasOp,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: T::OpMath,
    pub a: DevicePtr,
    pub lda: usize,
    pub b: DevicePtr,
    pub ldb: usize,
    pub beta: T::OpMath,
    pub c: DevicePtr,
    pub ldc: usize,
    elem: PhantomData<T>,
}

#[bon]
impl<T: Element> GemmParams<T> {
    /// Validating constructor. Leading dimensions default to the tightest
    /// packing of their operand.
    #[builder]
    pub fn new(
        #[builder(default)] trans_a: BlasOp,
        #[builder(default)] trans_b: BlasOp,
        m: usize,
        n: usize,
        k: usize,
        alpha: T::OpMath,
        a: DevicePtr,
        lda: Option<usize>,
        b: DevicePtr,
        ldb: Option<usize>,
        beta: T::OpMath,
        c: DevicePtr,
        ldc: Option<usize>,
    ) -> Result<Self> {
        ensure_positive(&[("m", m), ("n", n), ("k", k)])?;
        let lda = leading_dimension("lda", lda, trans_a.stored(m, k).0)?;
        let ldb = leading_dimension("ldb", ldb, trans_b.stored(k, n).0)?;
        let ldc = leading_dimension("ldc", ldc, m)?;

        ensure_addressable(Self { trans_a, trans_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc, elem: PhantomData })
    }
}

impl<T: Element> OpParams for GemmParams<T> {
    type Elem = T;

    fn signature(&self) -> String {
        format!("{}{}_{}_{}_{}", self.trans_a, self.trans_b, self.m, self.n, self.k)
    }

    fn checked_size_a(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.lda, self.trans_a.stored(self.m, self.k).1])
    }

    fn checked_size_b(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.ldb, self.trans_b.stored(self.k, self.n).1])
    }

    fn checked_size_c(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.ldc, self.n])
    }

    fn output_len(&self) -> usize {
        self.ldc * self.n
    }

    fn operands(&self) -> Operands {
        Operands { a: self.a, b: self.b, c: self.c }
    }

    fn with_operands(&self, Operands { a, b, c }: Operands) -> Self {
        Self { a, b, c, ..self.clone() }
    }
}
