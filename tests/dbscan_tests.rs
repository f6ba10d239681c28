//! Density-based clustering tests


use std::rc::Rc;

use seqops_core::cursor::{drain, Cursor};
use seqops_core::id::ClusterId;
use seqops_core::ErrorKind;
use seqops_operators::cluster::{
    linear_scan, points, query_fn, Classification, DbScan, LinearScan, PointRef, RangeQuery,
    SearchRegion,
};
use seqops_operators::source::{IterSource, VecSource};
use test_data_gen::clustered_points;

type Dist = fn(&f64, &f64) -> f64;

fn dist(a: &f64, b: &f64) -> f64 {
    (a - b).abs()
}

/// Opened scan over `pts` in input order, using a linear range search.
fn open_scan(
    pts: &[PointRef<f64>],
    eps: f64,
    min_pts: usize,
) -> DbScan<f64, VecSource<PointRef<f64>>, LinearScan<f64, Dist>> {
    let mut scan =
        DbScan::new(VecSource::new(pts.to_vec()), linear_scan(pts, dist as Dist), eps, min_pts)
            .unwrap();
    scan.open().unwrap();
    scan
}

fn values(members: &[PointRef<f64>]) -> Vec<f64> {
    members.iter().map(|p| *p.value()).collect()
}

/// Ten points 0.2 apart starting at `start`.
fn blob(start: f64) -> Vec<f64> {
    (0..10).map(|k| start + k as f64 * 0.2).collect()
}

/// Pull every cluster and drain it, recording its classification.
fn collect_clusters<I, Q>(
    scan: &mut DbScan<f64, I, Q>,
) -> Vec<(Classification, Vec<PointRef<f64>>)>
where
    I: Cursor<Item = PointRef<f64>>,
    Q: RangeQuery<f64>,
{
    let mut out = Vec::new();
    while scan.has_next().unwrap() {
        let mut cluster = scan.next().unwrap();
        let class = cluster.classification();
        out.push((class, drain(&mut cluster).unwrap()));
    }
    out
}

#[test]
fn test_two_clusters_and_noise() {
    let mut raw = vec![50.0];
    raw.extend(blob(0.0));
    raw.push(200.0);
    raw.extend(blob(100.0));
    let pts = points(raw);

    let mut scan = open_scan(&pts, 0.5, 3);
    let clusters = collect_clusters(&mut scan);

    assert_eq!(clusters.len(), 3);
    let (class0, members0) = &clusters[0];
    assert_eq!(*class0, Classification::Cluster(ClusterId::new(0)));
    let mut got = values(members0);
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(got, blob(0.0));

    assert_eq!(clusters[1].0, Classification::Cluster(ClusterId::new(1)));
    assert_eq!(clusters[1].1.len(), 10);

    assert_eq!(clusters[2].0, Classification::Noise);
    assert_eq!(values(&clusters[2].1), vec![50.0, 200.0]);
    assert!(clusters[2].1.iter().all(|p| p.classification().is_noise()));
    assert_eq!(scan.clusters_found(), 2);
}

#[test]
fn test_min_pts_one_leaves_no_noise() {
    let raw = clustered_points(41, &[0.0, 10.0, 25.0, 60.0], 15, 2.0);
    let pts = points(raw);
    let mut scan = open_scan(&pts, 0.3, 1);
    let clusters = collect_clusters(&mut scan);

    assert!(clusters.iter().all(|(class, _)| class.cluster_id().is_some()));
    assert!(pts.iter().all(|p| p.classification().cluster_id().is_some()));
    let emitted: usize = clusters.iter().map(|(_, m)| m.len()).sum();
    assert_eq!(emitted, pts.len());
}

#[test]
fn test_every_point_emitted_exactly_once() {
    let raw = clustered_points(42, &[0.0, 5.0, 30.0], 25, 3.0);
    let pts = points(raw);
    let mut scan = open_scan(&pts, 0.4, 4);

    let mut emitted: Vec<PointRef<f64>> = Vec::new();
    for (class, members) in collect_clusters(&mut scan) {
        for p in &members {
            // membership agrees with the point's final classification
            assert_eq!(p.classification(), class);
        }
        emitted.extend(members);
    }
    assert_eq!(emitted.len(), pts.len());
    for p in &pts {
        assert_eq!(emitted.iter().filter(|q| Rc::ptr_eq(q, p)).count(), 1);
    }
}

#[test]
fn test_noise_reclaimed_as_border_point() {
    // 0.0 has one neighbor and is seen first; 1.0 is core and reaches it
    let pts = points(vec![0.0, 1.0, 1.5, 2.0]);
    let mut scan = open_scan(&pts, 1.0, 3);

    let clusters = collect_clusters(&mut scan);
    assert_eq!(clusters.len(), 1, "no noise cursor once the noise point is reclaimed");
    assert_eq!(values(&clusters[0].1), vec![1.0, 0.0, 1.5, 2.0]);
    assert_eq!(pts[0].classification(), Classification::Cluster(ClusterId::new(0)));
}

#[test]
fn test_unread_cluster_members_still_classified() {
    let mut raw = blob(0.0);
    raw.extend(blob(10.0));
    let pts = points(raw);
    let mut scan = open_scan(&pts, 0.5, 3);

    let mut first = scan.next().unwrap();
    assert_eq!(first.id(), Some(ClusterId::new(0)));
    first.next().unwrap();

    let mut second = scan.next().unwrap();
    assert!(first.is_stale());
    assert_eq!(first.peek().unwrap_err().kind(), ErrorKind::InvalidState);
    assert!(pts[..10]
        .iter()
        .all(|p| p.classification() == Classification::Cluster(ClusterId::new(0))));
    assert_eq!(drain(&mut second).unwrap().len(), 10);
    assert!(!scan.has_next().unwrap());
}

#[test]
fn test_custom_range_query() {
    let pts = points(vec![1.0, 1.1, 5.0, 5.05, 5.1]);
    let universe = pts.clone();
    let range = query_fn(move |region: &SearchRegion<'_, f64>| {
        let hits = universe
            .iter()
            .filter(|p| (p.value() - region.center).abs() <= region.eps)
            .cloned()
            .collect();
        Ok(VecSource::opened(hits))
    });

    let mut scan = DbScan::new(IterSource::new(pts.clone()), range, 0.2, 2).unwrap();
    scan.open().unwrap();
    let sizes: Vec<usize> = collect_clusters(&mut scan).iter().map(|(_, m)| m.len()).collect();
    assert_eq!(sizes, vec![2, 3]);
}

#[test]
fn test_invalid_parameters() {
    let pts = points(vec![0.0]);
    for (eps, min_pts) in [(1.0, 0), (-0.1, 2), (f64::NAN, 2)] {
        let err = DbScan::new(VecSource::new(pts.clone()), linear_scan(&pts, dist), eps, min_pts);
        let err = err.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_reset_not_supported_and_close() {
    let pts = points(blob(0.0));
    let mut scan = open_scan(&pts, 0.5, 3);
    assert!(!scan.supports_reset());
    assert_eq!(scan.reset().unwrap_err().kind(), ErrorKind::NotSupported);

    let mut cluster = scan.next().unwrap();
    scan.close();
    assert!(cluster.is_stale());
    assert_eq!(cluster.next().unwrap_err().kind(), ErrorKind::InvalidState);
    assert_eq!(scan.has_next().unwrap_err().kind(), ErrorKind::InvalidState);
}

#[test]
fn test_classification_serializes() {
    let json = serde_json::to_string(&Classification::Cluster(ClusterId::new(3))).unwrap();
    assert_eq!(json, r#"{"Cluster":3}"#);
    let back: Classification = serde_json::from_str(r#""Noise""#).unwrap();
    assert_eq!(back, Classification::Noise);
}
