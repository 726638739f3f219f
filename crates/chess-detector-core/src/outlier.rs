//! Spatial outlier rejection: keep only the dominant cluster of points.
//!
//! Points are partitioned into the transitive closure of "closer than the
//! tolerance"; the cluster holding at least half of the points is kept and
//! everything else is treated as clutter.

/// Partition `points` into clusters linked by Euclidean distance `< tol`.
///
/// Returns one label per point and the number of clusters. Labels are
/// numbered in order of first appearance, so the first point is always in
/// cluster 0.
pub fn partition_by_distance(points: &[[f32; 2]], tol: f32) -> (Vec<usize>, usize) {
    let n = points.len();
    let tol2 = tol * tol;
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in i + 1..n {
            let dx = points[i][0] - points[j][0];
            let dy = points[i][1] - points[j][1];
            if dx * dx + dy * dy < tol2 {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut root_label = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut count = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if root_label[root] == usize::MAX {
            root_label[root] = count;
            count += 1;
        }
        labels.push(root_label[root]);
    }
    (labels, count)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Boyer–Moore majority vote followed by an exact recount.
///
/// Returns the candidate label and how many times it actually occurs, or
/// `None` for an empty input.
pub fn majority_label(labels: &[usize]) -> Option<(usize, usize)> {
    let mut candidate = *labels.first()?;
    let mut votes = 0usize;
    for &l in labels {
        if votes == 0 {
            candidate = l;
        }
        if l == candidate {
            votes += 1;
        } else {
            votes -= 1;
        }
    }
    let count = labels.iter().filter(|&&l| l == candidate).count();
    Some((candidate, count))
}

/// Keep the points of the majority cluster.
///
/// A single cluster is returned unchanged. Otherwise the voted cluster is
/// kept only if it holds at least `n / 2` (integer division) of the points;
/// when no cluster qualifies the result is empty.
pub fn filter_spatial_outliers(points: &[[f32; 2]], tol: f32) -> Vec<[f32; 2]> {
    let (labels, clusters) = partition_by_distance(points, tol);
    if clusters <= 1 {
        return points.to_vec();
    }

    match majority_label(&labels) {
        Some((label, count)) if count >= points.len() / 2 => points
            .iter()
            .zip(&labels)
            .filter(|(_, &l)| l == label)
            .map(|(p, _)| *p)
            .collect(),
        _ => {
            log::debug!("no dominant cluster among {clusters} clusters of {} points", points.len());
            Vec::new()
        }
    }
}
