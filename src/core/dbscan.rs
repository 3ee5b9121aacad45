use std::collections::VecDeque;
use crate::core::error::ClusteringError;
use crate::core::neighbors::NeighborFinder;
use crate::models::{Cluster, DEFAULT_EPSILON_DEGREES, DEFAULT_MIN_POINTS};

/// Density-based clustering (DBSCAN) over an indexed point set.
///
/// Points are visited in index order and clusters grow breadth-first, so the
/// result only depends on the input order: a border point reachable from two
/// clusters stays in the one that reached it first, and cluster ids follow
/// discovery order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    epsilon: f64,
    min_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

impl Dbscan {
    /// Create a clusterer.
    ///
    /// # Arguments
    /// * `epsilon` - Neighborhood radius in degrees, positive and finite
    /// * `min_points` - Neighbors needed for a core point, counting itself
    pub fn new(epsilon: f64, min_points: usize) -> Result<Self, ClusteringError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ClusteringError::InvalidParameter {
                name: "epsilon",
                message: format!("must be a positive finite number, got {}", epsilon),
            });
        }

        if min_points == 0 {
            return Err(ClusteringError::InvalidParameter {
                name: "min_points",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self { epsilon, min_points })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    #[inline]
    fn is_core(&self, neighbors: &[usize]) -> bool {
        neighbors.len() + 1 >= self.min_points
    }

    /// Cluster every point known to `finder`.
    ///
    /// Returns clusters ordered by id; noise points appear in none of them.
    pub fn cluster<F: NeighborFinder + ?Sized>(&self, finder: &F) -> Vec<Cluster> {
        let mut labels = vec![Label::Unvisited; finder.len()];
        let mut clusters = Vec::new();

        for idx in 0..labels.len() {
            if labels[idx] != Label::Unvisited {
                continue;
            }

            let neighbors = finder.within(idx, self.epsilon);
            if !self.is_core(&neighbors) {
                labels[idx] = Label::Noise;
                continue;
            }

            let id = clusters.len();
            labels[idx] = Label::Member(id);
            let mut members = vec![idx];
            let mut queue: VecDeque<usize> = neighbors.into();

            while let Some(next) = queue.pop_front() {
                match labels[next] {
                    Label::Member(_) => continue,
                    // Already known not to be core, so it only joins as a border point
                    Label::Noise => {
                        labels[next] = Label::Member(id);
                        members.push(next);
                    }
                    Label::Unvisited => {
                        labels[next] = Label::Member(id);
                        members.push(next);

                        let reachable = finder.within(next, self.epsilon);
                        if self.is_core(&reachable) {
                            queue.extend(
                                reachable
                                    .into_iter()
                                    .filter(|&j| !matches!(labels[j], Label::Member(_))),
                            );
                        }
                    }
                }
            }

            members.sort_unstable();
            clusters.push(Cluster { id, members });
        }

        clusters
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON_DEGREES,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}
