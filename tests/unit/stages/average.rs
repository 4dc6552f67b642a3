use super::*;
use crate::pipeline::runner::PipelineRunner;

#[test]
fn mean_of_scalar_inputs() {
    let r = SpatialRegion::from_size(&[3, 2]);
    let mut a = Image::from_fn(r.clone(), |i| (i[0] + 3 * i[1]) as f32);
    let mut b = Image::filled(r.clone(), 10.0f32);
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(
        stage.output().data(),
        &[5.0, 5.5, 6.0, 6.5, 7.0, 7.5]
    );
}

#[test]
fn integer_means_round() {
    let r = SpatialRegion::from_size(&[2]);
    let mut a = Image::from_vec(r.clone(), vec![1u8, 2]).unwrap();
    let mut b = Image::from_vec(r, vec![2u8, 2]).unwrap();
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[2, 2]);
}

#[test]
fn vector_pixels_average_componentwise() {
    let r = SpatialRegion::from_size(&[1]);
    let mut a = Image::filled(r.clone(), vec![1.0f64, 4.0]);
    let mut b = Image::filled(r.clone(), vec![3.0f64, 8.0]);
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().data(), &[vec![2.0, 6.0]]);
}

#[test]
fn differing_component_counts_fail_validation() {
    let r = SpatialRegion::from_size(&[1]);
    let mut a = Image::filled(r.clone(), vec![1.0f64, 4.0]);
    let mut b = Image::filled(r, vec![3.0f64]);
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    assert!(matches!(
        PipelineRunner::default().update(&mut stage),
        Err(VoxframeError::Validation(_))
    ));
}

#[test]
fn no_inputs_or_mismatched_extents_are_configuration_errors() {
    let mut a = Image::filled(SpatialRegion::from_size(&[2, 2]), 0.0f32);
    let mut b = Image::filled(SpatialRegion::from_size(&[2, 3]), 0.0f32);

    let mut empty = AverageImages::<f32>::new();
    assert!(matches!(
        empty.compute_output_information(),
        Err(VoxframeError::Configuration(_))
    ));

    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    assert_eq!(stage.number_of_inputs(), 2);
    assert!(matches!(
        stage.compute_output_information(),
        Err(VoxframeError::Configuration(_))
    ));
}

#[test]
fn requested_region_is_forwarded_to_every_input() {
    let r = SpatialRegion::from_size(&[4, 4]);
    let sub = SpatialRegion::new(&[2, 1], &[2, 3]).unwrap();
    let mut a = Image::filled(r.clone(), 2.0f32);
    let mut b = Image::filled(r, 4.0f32);
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    stage.set_requested_region(sub.clone());
    PipelineRunner::default().update(&mut stage).unwrap();
    let out = stage.into_output();
    assert_eq!(out.buffered_region(), Some(&sub));
    assert!(out.data().iter().all(|&v| v == 3.0));
    assert_eq!(a.requested_region(), Some(&sub));
    assert_eq!(b.requested_region(), Some(&sub));
}

#[test]
fn empty_request_outside_the_inputs_yields_an_empty_output() {
    let r = SpatialRegion::from_size(&[4, 4]);
    let empty = SpatialRegion::new(&[100, 0], &[0, 4]).unwrap();
    let mut a = Image::filled(r.clone(), 1.0f32);
    let mut b = Image::filled(r, 3.0f32);
    let mut stage = AverageImages::new().with_input(&mut a).with_input(&mut b);
    stage.set_requested_region(empty.clone());
    PipelineRunner::default().update(&mut stage).unwrap();
    assert_eq!(stage.output().buffered_region(), Some(&empty));
    assert!(stage.output().data().is_empty());
}
