use super::*;

fn region(index: &[i64], size: &[usize]) -> SpatialRegion {
    SpatialRegion::new(index, size).unwrap()
}

fn volume() -> Image<i64> {
    Image::from_fn(region(&[0, 0, 0], &[3, 4, 5]), |i| {
        i[0] + 10 * i[1] + 100 * i[2]
    })
}

#[test]
fn extract_along_each_axis() {
    let v = volume();

    let s = extract_slice(&v, 0, 2).unwrap();
    assert_eq!(s.largest_possible_region(), &region(&[0, 0], &[4, 5]));
    assert_eq!(s.pixel(&[3, 4]), Some(&(2 + 30 + 400)));

    let s = extract_slice(&v, 1, 1).unwrap();
    assert_eq!(s.largest_possible_region(), &region(&[0, 0], &[3, 5]));
    assert_eq!(s.pixel(&[2, 3]), Some(&(2 + 10 + 300)));

    let s = extract_slice(&v, 2, 4).unwrap();
    assert_eq!(s.largest_possible_region(), &region(&[0, 0], &[3, 4]));
    assert_eq!(s.pixel(&[1, 2]), Some(&(1 + 20 + 400)));

    assert!(extract_slice(&v, 2, 5).is_err());
    assert!(extract_slice(&v, 3, 0).is_err());
}

#[test]
fn paste_places_at_destination_index() {
    let v = volume();
    let mut dst = Image::<i64>::new(region(&[0, 0], &[6, 6]));
    dst.allocate();
    let source = region(&[0, 0, 1], &[3, 4, 1]);
    paste_collapsed(&v, &source, 2, &mut dst, &[2, 1]).unwrap();
    assert_eq!(dst.pixel(&[2, 1]), Some(&100));
    assert_eq!(dst.pixel(&[4, 4]), Some(&(2 + 30 + 100)));
    assert_eq!(dst.pixel(&[1, 1]), Some(&0));
}

#[test]
fn out_of_bounds_paste_is_an_invariant_violation_and_writes_nothing() {
    let v = volume();
    let mut dst = Image::<i64>::new(region(&[0, 0], &[3, 4]));
    dst.allocate();
    let source = region(&[0, 0, 1], &[3, 4, 1]);
    let err = paste_collapsed(&v, &source, 2, &mut dst, &[1, 0]).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(dst.data().iter().all(|&p| p == 0));
}

#[test]
fn collapsed_axis_must_have_unit_size() {
    let v = volume();
    let mut dst = Image::<i64>::new(region(&[0, 0], &[3, 4]));
    dst.allocate();
    let source = region(&[0, 0, 1], &[3, 4, 2]);
    let err = paste_collapsed(&v, &source, 2, &mut dst, &[0, 0]).unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test]
fn unbuffered_source_is_rejected() {
    let v = Image::<i64>::new(region(&[0, 0, 0], &[3, 4, 5]));
    let mut dst = Image::<i64>::new(region(&[0, 0], &[3, 4]));
    dst.allocate();
    let source = region(&[0, 0, 1], &[3, 4, 1]);
    assert!(paste_collapsed(&v, &source, 2, &mut dst, &[0, 0]).is_err());
    assert!(extract_slice(&v, 2, 1).is_err());
}

#[test]
fn one_dimensional_source_yields_single_pixel_frames() {
    let line = Image::from_vec(region(&[3], &[4]), vec![7.0f32, 8.0, 9.0, 10.0]).unwrap();
    let s = extract_slice(&line, 0, 5).unwrap();
    assert_eq!(s.dimension(), 0);
    assert_eq!(s.data(), &[9.0]);
}
