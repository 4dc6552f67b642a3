use super::*;
use crate::foundation::error::VoxframeError;
use crate::pipeline::context::ExecutionOpts;
use crate::pipeline::runner::PipelineRunner;

fn region(index: &[i64], size: &[usize]) -> SpatialRegion {
    SpatialRegion::new(index, size).unwrap()
}

fn profile(values: &[f32]) -> Image<f32> {
    Image::from_vec(SpatialRegion::from_size(&[values.len()]), values.to_vec()).unwrap()
}

#[test]
fn divides_each_pixel_by_the_entry_at_its_first_index() {
    let mut primary = Image::from_fn(SpatialRegion::from_size(&[3, 2]), |i| {
        (i[0] + 1) as f32 * 6.0 + i[1] as f32
    });
    let mut reference = profile(&[2.0, 3.0, 6.0]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    PipelineRunner::default().update(&mut stage).unwrap();

    let out = stage.output();
    assert_eq!(out.pixel(&[0, 0]), Some(&3.0));
    assert_eq!(out.pixel(&[1, 0]), Some(&4.0));
    assert_eq!(out.pixel(&[2, 0]), Some(&3.0));
    assert_eq!(out.pixel(&[0, 1]), Some(&3.5));
    assert_eq!(out.pixel(&[2, 1]), Some(&(19.0 / 6.0)));
}

#[test]
fn zero_reference_entries_produce_zero() {
    let mut primary = Image::filled(SpatialRegion::from_size(&[2, 2]), 5.0f32);
    let mut reference = profile(&[0.0, 2.0]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[0.0, 2.5, 0.0, 2.5]);
}

#[test]
fn vector_pixels_use_componentwise_zero_rule() {
    let mut primary = Image::filled(SpatialRegion::from_size(&[2]), [4.0f64, 9.0]);
    let mut reference =
        Image::from_vec(SpatialRegion::from_size(&[2]), vec![[2.0, 0.0], [0.0, 3.0]]).unwrap();
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[[2.0, 0.0], [0.0, 3.0]]);
}

#[test]
fn missing_inputs_and_bad_reference_shapes_are_configuration_errors() {
    let mut primary = Image::filled(SpatialRegion::from_size(&[4, 2]), 1.0f32);
    let mut flat = Image::filled(SpatialRegion::from_size(&[4, 1]), 1.0f32);
    let mut short = profile(&[1.0, 1.0, 1.0]);

    let mut stage = ReferenceNormalize::<f32, f32>::new().with_input(&mut primary);
    assert!(matches!(
        stage.compute_output_information(),
        Err(VoxframeError::Configuration(_))
    ));

    stage.set_reference(&mut flat);
    assert!(matches!(
        stage.compute_output_information(),
        Err(VoxframeError::Configuration(_))
    ));

    stage.set_reference(&mut short);
    assert!(matches!(
        stage.compute_output_information(),
        Err(VoxframeError::Configuration(_))
    ));
}

#[test]
fn reference_may_extend_beyond_the_primary() {
    let mut primary = Image::filled(region(&[2, 0], &[2, 1]), 8.0f32);
    let mut reference = profile(&[1.0, 1.0, 2.0, 4.0, 1.0]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[4.0, 2.0]);
}

#[test]
fn partial_request_only_computes_the_requested_pixels() {
    let mut primary = Image::from_fn(SpatialRegion::from_size(&[4, 4]), |i| {
        (i[0] + 4 * i[1]) as f32
    });
    let mut reference = profile(&[1.0, 2.0, 4.0, 8.0]);
    let sub = region(&[1, 2], &[2, 2]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    stage.set_requested_region(sub.clone());
    PipelineRunner::default().update(&mut stage).unwrap();

    let out = stage.into_output();
    assert_eq!(out.buffered_region(), Some(&sub));
    assert_eq!(out.data(), &[4.5, 2.5, 6.5, 3.5]);
    assert_eq!(primary.requested_region(), Some(&sub));
    assert_eq!(
        reference.requested_region(),
        Some(reference.largest_possible_region())
    );
}

#[test]
fn parallel_and_sequential_execution_agree() {
    let mut primary = Image::from_fn(SpatialRegion::from_size(&[7, 9, 3]), |i| {
        (i[0] * 31 + i[1] * 7 + i[2]) as f32
    });
    let mut reference = profile(&[1.0, 0.0, 3.0, 0.5, 2.0, 8.0, 0.25]);

    let sequential = PipelineRunner::new(&ExecutionOpts::sequential()).unwrap();
    let parallel = PipelineRunner::new(&ExecutionOpts {
        threads: Some(3),
        rows_per_batch: 2,
        ..ExecutionOpts::default()
    })
    .unwrap();

    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    sequential.update(&mut stage).unwrap();
    let expected = stage.output().data().to_vec();
    parallel.update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), expected.as_slice());
}

#[test]
fn unbuffered_primary_is_an_invariant_violation() {
    let mut primary = Image::<f32>::new(SpatialRegion::from_size(&[2, 2]));
    let mut reference = profile(&[1.0, 1.0]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    let err = PipelineRunner::default().update(&mut stage).unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test]
fn signed_overflow_saturates_through_the_stage() {
    let mut primary = Image::from_vec(SpatialRegion::from_size(&[1]), vec![i32::MIN]).unwrap();
    let mut reference = Image::from_vec(SpatialRegion::from_size(&[1]), vec![-1i32]).unwrap();
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[i32::MAX]);
}

#[test]
fn empty_request_outside_the_image_yields_an_empty_output() {
    let mut primary = Image::filled(SpatialRegion::from_size(&[4, 4]), 2.0f32);
    let mut reference = profile(&[1.0, 1.0, 1.0, 1.0]);
    let empty = region(&[100, 0], &[0, 4]);
    let mut stage = ReferenceNormalize::new()
        .with_input(&mut primary)
        .with_reference(&mut reference);
    stage.set_requested_region(empty.clone());
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().buffered_region(), Some(&empty));
    assert!(stage.output().data().is_empty());
}
