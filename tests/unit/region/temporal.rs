use super::*;

#[test]
fn contains_boundaries() {
    let r = TemporalRegion::new(2, 3);
    assert!(!r.contains_frame(1));
    assert!(r.contains_frame(2));
    assert!(r.contains_frame(4));
    assert!(!r.contains_frame(5));
    assert_eq!(r.frames().collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(r.to_string(), "[2, 5)");
}

#[test]
fn empty_regions() {
    let r = TemporalRegion::new(7, 0);
    assert!(r.is_empty());
    assert_eq!(r.frames().count(), 0);
    assert!(TemporalRegion::new(0, 10).contains_region(r));
    assert!(!TemporalRegion::new(0, 5).contains_region(r));
}

#[test]
fn ordering_is_by_start_first() {
    let mut v = vec![
        TemporalRegion::new(3, 1),
        TemporalRegion::new(-1, 9),
        TemporalRegion::new(3, 0),
    ];
    v.sort();
    assert_eq!(
        v,
        vec![
            TemporalRegion::new(-1, 9),
            TemporalRegion::new(3, 0),
            TemporalRegion::new(3, 1)
        ]
    );
}

#[test]
fn intersect_and_union_reconcile_to_one_range() {
    let a = TemporalRegion::new(0, 5);
    let b = TemporalRegion::new(3, 4);
    assert_eq!(a.intersect(b), TemporalRegion::new(3, 2));
    assert_eq!(a.bounding_union(b), TemporalRegion::new(0, 7));
    assert!(a.intersect(TemporalRegion::new(9, 2)).is_empty());
    assert_eq!(a.bounding_union(TemporalRegion::new(40, 0)), a);
}

#[test]
fn huge_durations_saturate_at_the_last_frame() {
    let all = TemporalRegion::new(0, u64::MAX);
    assert_eq!(all.frame_end(), i64::MAX);
    assert!(all.contains_region(TemporalRegion::new(5, 3)));
    assert!(all.contains_frame(1 << 40));
    assert_eq!(TemporalRegion::new(-4, u64::MAX).frame_end(), i64::MAX);

    let wide =
        TemporalRegion::new(i64::MIN, 1).bounding_union(TemporalRegion::new(i64::MAX - 1, 1));
    assert_eq!(wide.frame_duration, u64::MAX);
    assert!(TemporalRegion::new(10, 2).intersect(TemporalRegion::new(0, 3)).is_empty());
}
