use crate::error::{SeqError, SeqResult};

use super::distance::DistanceMatrix;

#[derive(Debug, Clone)]
pub struct PhyloNode {
    pub label: Option<Box<str>>,
    pub branch_length: Option<f64>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl PhyloNode {
    fn leaf(label: Box<str>) -> Self {
        Self {
            label: Some(label),
            branch_length: None,
            parent: None,
            children: Vec::new(),
        }
    }

    fn internal(children: Vec<usize>) -> Self {
        Self {
            label: None,
            branch_length: None,
            parent: None,
            children,
        }
    }
}

/// Arena-allocated tree; leaves first, internal nodes appended as they are
/// created. `root` is None for unrooted (neighbor-joining) trees.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    nodes: Vec<PhyloNode>,
    root: Option<usize>,
}

impl PhyloTree {
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn node(&self, idx: usize) -> &PhyloNode {
        &self.nodes[idx]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.children.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn leaf_labels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.children.is_empty())
            .map(|n| n.label.as_deref().unwrap_or("").to_string())
            .collect()
    }

    pub fn nodes(&self) -> &[PhyloNode] {
        &self.nodes
    }

    fn attach(&mut self, child: usize, parent: usize, branch_length: f64) {
        self.nodes[child].parent = Some(parent);
        self.nodes[child].branch_length = Some(branch_length);
    }
}

/// Working distance matrix over the node arena, sized to hold the nodes
/// created during agglomeration.
struct WorkMatrix {
    cap: usize,
    d: Vec<f64>,
}

impl WorkMatrix {
    fn from_distances(dist: &DistanceMatrix, cap: usize) -> Self {
        let n = dist.n();
        let mut d = vec![0.0f64; cap * cap];
        for i in 0..n {
            for j in 0..n {
                d[i * cap + j] = dist.get(i, j);
            }
        }
        Self { cap, d }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.d[i * self.cap + j]
    }

    fn set(&mut self, i: usize, j: usize, val: f64) {
        self.d[i * self.cap + j] = val;
        self.d[j * self.cap + i] = val;
    }
}

/// Saitou-Nei neighbor joining. Returns an unrooted tree whose final
/// internal node connects the last two clusters.
pub fn neighbor_joining(dist: &DistanceMatrix) -> SeqResult<PhyloTree> {
    let n = dist.n();
    if n < 2 {
        return Err(SeqError::TooFewSequences { n });
    }

    let mut tree = PhyloTree {
        nodes: dist
            .labels()
            .iter()
            .map(|label| PhyloNode::leaf(label.clone()))
            .collect(),
        root: None,
    };

    // n leaves plus up to (n-1) internal nodes
    let cap = 2 * n - 1;
    let mut work = WorkMatrix::from_distances(dist, cap);

    let mut active: Vec<usize> = (0..n).collect();
    let mut next_node = n;

    while active.len() > 2 {
        let r = active.len() as f64;

        let mut row_sum = vec![0.0f64; cap];
        for &i in &active {
            for &j in &active {
                row_sum[i] += work.get(i, j);
            }
        }

        // Pair with minimum Q criterion
        let mut min_q = f64::INFINITY;
        let mut min_i = 0;
        let mut min_j = 0;
        for (ai, &i) in active.iter().enumerate() {
            for &j in &active[(ai + 1)..] {
                let q = (r - 2.0) * work.get(i, j) - row_sum[i] - row_sum[j];
                if q < min_q {
                    min_q = q;
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let dij = work.get(min_i, min_j);
        let li = dij / 2.0 + (row_sum[min_i] - row_sum[min_j]) / (2.0 * (r - 2.0));
        let lj = dij - li;

        let u = next_node;
        next_node += 1;
        tree.nodes.push(PhyloNode::internal(vec![min_i, min_j]));
        tree.attach(min_i, u, li);
        tree.attach(min_j, u, lj);

        for &k in &active {
            if k == min_i || k == min_j {
                continue;
            }
            let duk = (work.get(min_i, k) + work.get(min_j, k) - dij) / 2.0;
            work.set(u, k, duk);
        }

        active.retain(|&x| x != min_i && x != min_j);
        active.push(u);
    }

    // Join the last two clusters under one more internal node
    debug_assert_eq!(active.len(), 2);
    let (a, b) = (active[0], active[1]);
    let dab = work.get(a, b);
    let u = next_node;
    tree.nodes.push(PhyloNode::internal(vec![a, b]));
    tree.attach(a, u, dab / 2.0);
    tree.attach(b, u, dab / 2.0);

    Ok(tree)
}

/// UPGMA agglomerative clustering. Returns a rooted ultrametric tree.
pub fn upgma(dist: &DistanceMatrix) -> SeqResult<PhyloTree> {
    let n = dist.n();
    if n < 2 {
        return Err(SeqError::TooFewSequences { n });
    }

    let mut tree = PhyloTree {
        nodes: dist
            .labels()
            .iter()
            .map(|label| PhyloNode::leaf(label.clone()))
            .collect(),
        root: None,
    };

    let cap = 2 * n - 1;
    let mut work = WorkMatrix::from_distances(dist, cap);

    let mut active: Vec<usize> = (0..n).collect();
    let mut cluster_size = vec![1usize; cap];
    let mut heights = vec![0.0f64; cap];
    let mut next_node = n;

    while active.len() > 1 {
        let mut min_d = f64::INFINITY;
        let mut min_i = 0;
        let mut min_j = 0;
        for (ai, &i) in active.iter().enumerate() {
            for &j in &active[(ai + 1)..] {
                if work.get(i, j) < min_d {
                    min_d = work.get(i, j);
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let u = next_node;
        next_node += 1;
        let h = min_d / 2.0;
        heights[u] = h;

        tree.nodes.push(PhyloNode::internal(vec![min_i, min_j]));
        tree.attach(min_i, u, h - heights[min_i]);
        tree.attach(min_j, u, h - heights[min_j]);

        let si = cluster_size[min_i];
        let sj = cluster_size[min_j];
        cluster_size[u] = si + sj;

        // Size-weighted average to the merged cluster
        for &k in &active {
            if k == min_i || k == min_j {
                continue;
            }
            let duk =
                (work.get(min_i, k) * si as f64 + work.get(min_j, k) * sj as f64) / (si + sj) as f64;
            work.set(u, k, duk);
        }

        active.retain(|&x| x != min_i && x != min_j);
        active.push(u);
    }

    tree.root = Some(active[0]);
    Ok(tree)
}
