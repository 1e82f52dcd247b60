//! Post-pass that makes every label a single 4-connected region.
//!
//! Clustering can leave a label split into several islands. Components are
//! relabelled in raster-scan order; a component smaller than `min_size`
//! joins the already-relabelled region touching its first pixel.

use std::collections::VecDeque;

use crate::raster::LabelRaster;

const UNSET: u32 = u32::MAX;

/// Relabel `labels` so each output label is one connected component,
/// numbered consecutively from 0.
pub fn enforce_connectivity(labels: &LabelRaster, min_size: usize) -> LabelRaster {
    let (w, h) = (labels.width, labels.height);
    let mut out = LabelRaster::new(w, h, UNSET);
    let mut next_label = 0u32;
    let mut queue = VecDeque::new();
    let mut component = Vec::new();

    for start in 0..labels.len() {
        if out.data[start] != UNSET {
            continue;
        }
        let original = labels.data[start];

        // Left and upper neighbours are already relabelled in scan order.
        let (sr, sc) = (start / w, start % w);
        let adjacent = if sc > 0 {
            Some(out.data[start - 1])
        } else if sr > 0 {
            Some(out.data[start - w])
        } else {
            None
        };

        // Flood-fill the component, marking it with a provisional label.
        component.clear();
        queue.push_back(start);
        out.data[start] = next_label;
        while let Some(idx) = queue.pop_front() {
            component.push(idx);
            let (r, c) = (idx / w, idx % w);
            let mut visit = |n: usize| {
                if out.data[n] == UNSET && labels.data[n] == original {
                    out.data[n] = next_label;
                    queue.push_back(n);
                }
            };
            if c > 0 {
                visit(idx - 1);
            }
            if c + 1 < w {
                visit(idx + 1);
            }
            if r > 0 {
                visit(idx - w);
            }
            if r + 1 < h {
                visit(idx + w);
            }
        }

        match adjacent {
            Some(target) if component.len() < min_size => {
                for &idx in &component {
                    out.data[idx] = target;
                }
            }
            _ => next_label += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_label_becomes_two_regions() {
        // Label 1 appears on both sides of a column of label 0.
        let l = LabelRaster::from_vec(vec![1, 0, 1, 1, 0, 1], 3, 2).unwrap();
        let out = enforce_connectivity(&l, 0);
        assert_eq!(out.data, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn small_island_merges_into_neighbour() {
        // A single pixel of label 9 inside a field of label 4.
        let mut l = LabelRaster::new(3, 3, 4);
        l.set(1, 1, 9);
        let out = enforce_connectivity(&l, 2);
        assert!(out.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn labels_are_consecutive() {
        let l = LabelRaster::from_vec(vec![7, 7, 3, 3, 5, 5, 7, 7], 4, 2).unwrap();
        let out = enforce_connectivity(&l, 1);
        let mut seen = out.data.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, (0..seen.len() as u32).collect::<Vec<_>>());
    }
}
