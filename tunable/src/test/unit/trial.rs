use gemmtune_device::{HostDevice, Stream};

use crate::error::Error;
use crate::test::helpers::{Clobber, Faulting, HostGemm, Shift, Unlaunchable, download, gemm_problem, pattern};
use crate::*;

const SHAPE: (usize, usize, usize) = (16, 12, 20);
const TRANS: (BlasOp, BlasOp) = (BlasOp::Trans, BlasOp::NoTrans);

fn setup(device: &HostDevice) -> (GemmParams<f32>, Isolated<GemmParams<f32>>) {
    let problem = gemm_problem::<f32>(device, TRANS, SHAPE, 1.5, 0.5);
    let reference = reference_run(&problem, &HostGemm::default(), device, device.default_stream()).unwrap();
    (problem, reference)
}

fn teardown(device: &HostDevice, reference: Isolated<GemmParams<f32>>) {
    reference.release(device, device.default_stream());
    device.default_stream().synchronize().unwrap();
    assert_eq!(device.live_allocations(), 3);
}

#[test]
fn test_equivalent_kernel_is_accepted() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);

    let kernel = HostGemm { reverse_k: true };
    let outcome =
        run_trial(&problem, reference.params(), &kernel, &TuningConfig::default(), &device, device.default_stream())
            .unwrap();

    assert_eq!(outcome.kernel, "host_gemm_reversed");
    assert_eq!(outcome.signature, "TN_16_12_20");
    assert!(outcome.accepted());
    assert!(outcome.verification.is_some_and(|v| v.is_passed()));
    teardown(&device, reference);
}

#[test]
fn test_trials_leave_problem_untouched() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);
    let config = TuningConfig::builder().duplicate_inputs(true).build();

    for _ in 0..3 {
        let outcome = run_trial(&problem, reference.params(), &Clobber, &config, &device, device.default_stream());
        assert!(!outcome.unwrap().accepted());
    }
    device.default_stream().synchronize().unwrap();

    assert_eq!(download::<f32>(&device, problem.a, 16 * 20), pattern(16 * 20, 1));
    assert_eq!(download::<f32>(&device, problem.b, 20 * 12), pattern(20 * 12, 2));
    assert_eq!(download::<f32>(&device, problem.c, 16 * 12), pattern(16 * 12, 3));
    teardown(&device, reference);
}

#[test]
fn test_every_candidate_starts_from_problem_output() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);
    let config = TuningConfig::default();

    // beta != 0, so a candidate accumulating onto another's output would fail.
    for reverse_k in [false, true, false] {
        let kernel = HostGemm { reverse_k };
        let outcome = run_trial(&problem, reference.params(), &kernel, &config, &device, device.default_stream());
        assert!(outcome.unwrap().accepted());
    }
    teardown(&device, reference);
}

#[test]
fn test_wrong_kernel_is_rejected() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);

    let outcome = run_trial(
        &problem,
        reference.params(),
        &Shift { delta: 10.0 },
        &TuningConfig::default(),
        &device,
        device.default_stream(),
    )
    .unwrap();

    assert_eq!(outcome.verification, Some(VerificationResult::Failed));
    assert!(!outcome.accepted());
    teardown(&device, reference);
}

#[test]
fn test_disabled_check_skips_verification() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);
    let config = TuningConfig::builder().numerical_check(false).build();

    let outcome =
        run_trial(&problem, reference.params(), &Shift { delta: 10.0 }, &config, &device, device.default_stream())
            .unwrap();

    assert_eq!(outcome.verification, None);
    assert!(outcome.accepted());
    teardown(&device, reference);
}

#[test]
fn test_launch_failure_releases_clone() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);

    let err = run_trial(
        &problem,
        reference.params(),
        &Unlaunchable,
        &TuningConfig::builder().duplicate_inputs(true).build(),
        &device,
        device.default_stream(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Launch { ref kernel, .. } if kernel == "unlaunchable"));
    assert!(!err.is_out_of_memory());
    teardown(&device, reference);
}

#[test]
fn test_execution_fault_releases_clone() {
    let device = HostDevice::new();
    let (problem, reference) = setup(&device);

    let err = run_trial(
        &problem,
        reference.params(),
        &Faulting,
        &TuningConfig::default(),
        &device,
        device.default_stream(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Device { source: gemmtune_device::Error::Runtime { .. } }));
    teardown(&device, reference);
}

#[test]
fn test_out_of_memory_is_reported() {
    // Room for the problem and the reference output only.
    let device = HostDevice::with_capacity(4 * (16 * 20 + 20 * 12 + 2 * 16 * 12));
    let (problem, reference) = setup(&device);

    let err = run_trial(
        &problem,
        reference.params(),
        &HostGemm::default(),
        &TuningConfig::default(),
        &device,
        device.default_stream(),
    )
    .unwrap_err();

    assert!(err.is_out_of_memory());
    teardown(&device, reference);
}

#[test]
fn test_reference_run_launch_failure() {
    let device = HostDevice::new();
    let problem = gemm_problem::<f32>(&device, TRANS, SHAPE, 1.0, 0.0);

    let err = reference_run(&problem, &Unlaunchable, &device, device.default_stream()).unwrap_err();
    assert!(matches!(err, Error::Launch { .. }));

    device.default_stream().synchronize().unwrap();
    assert_eq!(device.live_allocations(), 3);
}

#[test]
fn test_trial_through_descriptor() {
    let device = HostDevice::new();
    let stream = device.default_stream();
    let problem: GemmDescriptor<f32> =
        crate::test::helpers::batched_problem::<f32>(&device, (4, 4, 4), 2, 1.0, 0.0).into();

    let outcome = run_trial(&problem, &problem, &Shift { delta: 0.0 }, &TuningConfig::default(), &device, stream);
    let outcome = outcome.unwrap();

    assert_eq!(outcome.signature, "NN_4_4_4_B_2");
    assert_eq!(outcome.verification, Some(VerificationResult::Passed(Tolerance { atol: 1e-5, rtol: 1e-5 })));
    stream.synchronize().unwrap();
    assert_eq!(device.live_allocations(), 3);
}
