//! Core of a GEMM kernel autotuner.
//!
//! Candidate kernels for a matrix multiply are tried against isolated clones
//! of the caller's problem and checked numerically against a trusted result
//! before any of them is timed or selected:
//!
//! - [`GemmParams`] and [`GemmStridedBatchedParams`] describe a problem and
//!   know its signature and memory footprint ([`OpParams`]).
//! - [`isolate`] makes a clone with a private output buffer; the returned
//!   [`Isolated`] handle is released explicitly, exactly once.
//! - [`verify`] compares two outputs over a tolerance grid.
//! - [`run_trial`] sequences the three for one candidate.

pub mod batched;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod gemm;
pub mod isolate;
pub mod op;
pub mod params;
pub mod trial;
pub mod verify;


pub use batched::GemmStridedBatchedParams;
pub use config::TuningConfig;
pub use descriptor::GemmDescriptor;
pub use error::{Error, Result};
pub use gemm::GemmParams;
pub use isolate::{Isolated, isolate};
pub use op::BlasOp;
pub use params::{OpParams, Operands};
pub use trial::{GemmKernel, TrialOutcome, reference_run, run_trial};
pub use verify::{ATOLS, RTOLS, Tolerance, VerificationResult, compare, verify};
