use super::*;

fn region(index: &[i64], size: &[usize]) -> SpatialRegion {
    SpatialRegion::new(index, size).unwrap()
}

fn described(frames: u64) -> FrameSequence<f32> {
    let mut seq = FrameSequence::new();
    seq.set_largest_possible_temporal_region(TemporalRegion::new(0, frames));
    seq.set_all_largest_possible_spatial_regions(&region(&[0, 0], &[2, 2]));
    seq
}

#[test]
fn uniform_largest_regions_cover_every_frame() {
    let seq = described(3);
    for f in 0..3 {
        assert_eq!(
            seq.frame_largest_possible_spatial_region(f),
            Some(&region(&[0, 0], &[2, 2]))
        );
    }
    assert!(seq.frame_largest_possible_spatial_region(3).is_none());
    assert!(seq.requested_temporal_region().is_none());
}

#[test]
fn per_frame_largest_regions_may_differ() {
    let mut seq = described(2);
    seq.set_frame_largest_possible_spatial_region(1, region(&[0, 0], &[5, 1]));
    assert_eq!(
        seq.frame_largest_possible_spatial_region(1),
        Some(&region(&[0, 0], &[5, 1]))
    );
}

#[test]
fn shrinking_largest_region_forgets_frames() {
    let mut seq = described(4);
    seq.set_largest_possible_temporal_region(TemporalRegion::new(0, 2));
    assert!(seq.frame_largest_possible_spatial_region(3).is_none());
}

#[test]
fn allocation_follows_requested_regions() {
    let mut seq = described(4);
    seq.set_requested_temporal_region(TemporalRegion::new(1, 2));
    seq.set_frame_requested_spatial_region(1, region(&[0, 0], &[2, 2]));
    seq.set_frame_requested_spatial_region(2, region(&[1, 0], &[1, 2]));
    seq.allocate_requested_frames().unwrap();

    assert_eq!(seq.buffered_temporal_region(), TemporalRegion::new(1, 2));
    assert_eq!(seq.number_of_buffered_frames(), 2);
    assert!(seq.frame(0).is_none());
    assert_eq!(
        seq.frame_buffered_spatial_region(2),
        Some(&region(&[1, 0], &[1, 2]))
    );
    assert_eq!(seq.requested_frames_mut().len(), 2);

    seq.release_frames();
    assert_eq!(seq.number_of_buffered_frames(), 0);
    assert!(seq.buffered_temporal_region().is_empty());
    assert!(seq.frame_requested_spatial_region(2).is_some());
}

#[test]
fn allocation_requires_resolved_regions() {
    let mut seq = described(2);
    assert!(seq.allocate_requested_frames().unwrap_err().is_invariant_violation());
    seq.set_requested_temporal_region(TemporalRegion::new(0, 1));
    assert!(seq.allocate_requested_frames().unwrap_err().is_invariant_violation());
}

#[test]
fn empty_request_allocates_nothing() {
    let mut seq = described(2);
    seq.set_requested_temporal_region(TemporalRegion::new(1, 0));
    seq.allocate_requested_frames().unwrap();
    assert_eq!(seq.number_of_buffered_frames(), 0);
    assert!(seq.into_frames().is_empty());
}

#[test]
fn stacking_requires_frames() {
    let seq = described(2);
    assert!(stack_frames(&seq, 0).is_err());
}

#[test]
fn stacking_places_frame_index_on_axis() {
    let mut seq = described(2);
    seq.set_requested_temporal_region(TemporalRegion::new(0, 2));
    for f in 0..2 {
        seq.set_frame_requested_spatial_region(f, region(&[0, 0], &[2, 2]));
    }
    seq.allocate_requested_frames().unwrap();
    for rf in seq.requested_frames_mut() {
        let v = rf.index as f32;
        rf.buffer.data_mut().fill(v);
    }
    let stacked = stack_frames(&seq, 1).unwrap();
    assert_eq!(stacked.largest_possible_region(), &region(&[0, 0, 0], &[2, 2, 2]));
    assert_eq!(stacked.pixel(&[1, 0, 1]), Some(&0.0));
    assert_eq!(stacked.pixel(&[1, 1, 1]), Some(&1.0));
}
