use std::marker::PhantomData;

use bon::bon;
use gemmtune_device::DevicePtr;
use gemmtune_dtype::Element;
use snafu::ensure;

use crate::error::{Result, SizeOverflowSnafu};
use crate::op::BlasOp;
use crate::params::{OpParams, Operands, checked_product, ensure_addressable, ensure_positive, leading_dimension};

/// `batch` independent GEMMs of one shape, each matrix `stride_*` elements
/// after the previous one in its operand buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct GemmStridedBatchedParams<T: Element> {
    pub trans_a: BlasOp,
    pub trans_b: BlasOp,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: T::OpMath,
    pub a: DevicePtr,
    pub lda: usize,
    pub stride_a: usize,
    pub b: DevicePtr,
    pub ldb: usize,
    pub stride_b: usize,
    pub beta: T::OpMath,
    pub c: DevicePtr,
    pub ldc: usize,
    pub stride_c: usize,
    pub batch: usize,
    elem: PhantomData<T>,
}

#[bon]
impl<T: Element> GemmStridedBatchedParams<T> {
    /// Validating constructor. Leading dimensions default to the tightest
    /// packing, strides to back-to-back matrices.
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
        stride_a: Option<usize>,
        b: DevicePtr,
        ldb: Option<usize>,
        stride_b: Option<usize>,
        beta: T::OpMath,
        c: DevicePtr,
        ldc: Option<usize>,
        stride_c: Option<usize>,
        batch: usize,
    ) -> Result<Self> {
        ensure_positive(&[("m", m), ("n", n), ("k", k), ("batch", batch)])?;
        let (a_rows, a_cols) = trans_a.stored(m, k);
        let (b_rows, b_cols) = trans_b.stored(k, n);
        let lda = leading_dimension("lda", lda, a_rows)?;
        let ldb = leading_dimension("ldb", ldb, b_rows)?;
        let ldc = leading_dimension("ldc", ldc, m)?;

        // A saturated default stride implies an overflowing operand size,
        // which the checks below reject.
        let params = ensure_addressable(Self {
            trans_a,
            trans_b,
            m,
            n,
            k,
            alpha,
            a,
            lda,
            stride_a: stride_a.unwrap_or(lda.saturating_mul(a_cols)),
            b,
            ldb,
            stride_b: stride_b.unwrap_or(ldb.saturating_mul(b_cols)),
            beta,
            c,
            ldc,
            stride_c: stride_c.unwrap_or(ldc.saturating_mul(n)),
            batch,
            elem: PhantomData,
        })?;

        let output_bytes = checked_product(&[params.batch, params.stride_c, T::DTYPE.bytes()]);
        ensure!(output_bytes.is_some(), SizeOverflowSnafu { signature: params.signature() });
        Ok(params)
    }
}

impl<T: Element> OpParams for GemmStridedBatchedParams<T> {
    type Elem = T;

    fn signature(&self) -> String {
        format!("{}{}_{}_{}_{}_B_{}", self.trans_a, self.trans_b, self.m, self.n, self.k, self.batch)
    }

    fn checked_size_a(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.lda, self.trans_a.stored(self.m, self.k).1, self.batch])
    }

    fn checked_size_b(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.ldb, self.trans_b.stored(self.k, self.n).1, self.batch])
    }

    fn checked_size_c(&self) -> Option<usize> {
        checked_product(&[T::DTYPE.bytes(), self.ldc, self.n, self.batch])
    }

    /// Counts `stride_c` elements per batch, gaps between matrices included.
    fn output_len(&self) -> usize {
        self.batch * self.stride_c
    }

    fn operands(&self) -> Operands {
        Operands { a: self.a, b: self.b, c: self.c }
    }

    fn with_operands(&self, Operands { a, b, c }: Operands) -> Self {
        Self { a, b, c, ..self.clone() }
    }
}
