use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn zero_threads_is_rejected() {
    let opts = ExecutionOpts {
        threads: Some(0),
        ..ExecutionOpts::default()
    };
    assert!(matches!(
        ExecutionContext::new(&opts),
        Err(VoxframeError::Validation(_))
    ));
}

#[test]
fn sequential_context_has_one_worker() {
    let ctx = ExecutionContext::new(&ExecutionOpts::sequential()).unwrap();
    assert_eq!(ctx.worker_threads(), 1);
}

#[test]
fn explicit_thread_count_is_honored() {
    let opts = ExecutionOpts {
        threads: Some(3),
        ..ExecutionOpts::default()
    };
    let ctx = ExecutionContext::new(&opts).unwrap();
    assert_eq!(ctx.worker_threads(), 3);
}

#[test]
fn rows_per_batch_is_at_least_one() {
    let opts = ExecutionOpts {
        rows_per_batch: 0,
        ..ExecutionOpts::sequential()
    };
    assert_eq!(ExecutionContext::new(&opts).unwrap().rows_per_batch(), 1);
}

#[test]
fn every_unit_runs_before_errors_surface() {
    for opts in [ExecutionOpts::default(), ExecutionOpts::sequential()] {
        let ctx = ExecutionContext::new(&opts).unwrap();
        let ran = AtomicUsize::new(0);
        let err = ctx
            .run_units((0..20).collect(), |u: usize| {
                ran.fetch_add(1, Ordering::Relaxed);
                if u == 3 || u == 7 {
                    Err(VoxframeError::invariant(format!("unit {u}")))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(ran.load(Ordering::Relaxed), 20);
        assert!(err.to_string().contains("unit 3"));
    }
}

#[test]
fn cancelled_context_runs_nothing() {
    let ctx = ExecutionContext::new(&ExecutionOpts::sequential()).unwrap();
    ctx.cancellation().cancel();
    let ran = AtomicUsize::new(0);
    let err = ctx
        .run_units(vec![(); 5], |_| {
            ran.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, VoxframeError::Cancelled));
    assert_eq!(ran.load(Ordering::Relaxed), 0);
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: ExecutionOpts = serde_json::from_str(r#"{ "threads": 2 }"#).unwrap();
    assert!(opts.parallel);
    assert_eq!(opts.threads, Some(2));
    assert_eq!(opts.rows_per_batch, 16);
}
