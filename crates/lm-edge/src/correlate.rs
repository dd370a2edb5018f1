//! Same-size 2D correlation of an 8-bit image with a small dense kernel.
//!
//! The kernel is applied without flipping. Output pixel `(x, y)` is
//! `sum K[ky][kx] * src(x + kx - ax, y + ky - ay)` for anchor `(ax, ay)`, with
//! out-of-image reads resolved by the [`BorderMode`].
//!
//! Each kernel row is split into runs of equal nonzero weight and every run is
//! evaluated from a prefix sum over the border-padded source row, so the cost
//! per output pixel depends on the number of runs, not the kernel width.

use lm_core::{BorderMode, Error, Image, ImageView, map_index};

/// A maximal horizontal run of equal nonzero weight inside one kernel row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Run {
    start: usize,
    len: usize,
    weight: f64,
}

fn row_runs(row: &[f32]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < row.len() {
        let w = row[i];
        if w == 0.0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < row.len() && row[i] == w {
            i += 1;
        }
        runs.push(Run {
            start,
            len: i - start,
            weight: w as f64,
        });
    }
    runs
}

pub fn correlate_u8(
    src: &ImageView<'_, u8>,
    kernel: &ImageView<'_, f32>,
    anchor: (usize, usize),
    border: &BorderMode<f32>,
    out: &mut Image<f32>,
) -> Result<(), Error> {
    src.require_non_empty()?;
    kernel.require_non_empty()?;
    let (ax, ay) = anchor;
    if ax >= kernel.width() || ay >= kernel.height() {
        return Err(Error::InvalidParameter {
            name: "anchor",
            reason: "anchor must lie inside the kernel",
        });
    }

    let w = src.width();
    let h = src.height();
    out.reset(w, h, 0.0);

    let fill = match border {
        BorderMode::Constant(c) => *c as f64,
        _ => 0.0,
    };

    let pw = w + kernel.width() - 1;
    let xmap: Vec<Option<usize>> = (0..pw)
        .map(|p| map_index(p as isize - ax as isize, w, border))
        .collect();

    let runs: Vec<Vec<Run>> = (0..kernel.height())
        .map(|ky| row_runs(kernel.row(ky)))
        .collect();

    let mut prefix = vec![0.0f64; pw + 1];
    let mut acc = vec![0.0f64; w];

    for y in 0..h {
        acc.fill(0.0);

        for (ky, kruns) in runs.iter().enumerate() {
            if kruns.is_empty() {
                continue;
            }

            let sy = y as isize + ky as isize - ay as isize;
            match map_index(sy, h, border) {
                Some(my) => {
                    let src_row = src.row(my);
                    for (p, m) in xmap.iter().enumerate() {
                        let v = match m {
                            Some(mx) => src_row[*mx] as f64,
                            None => fill,
                        };
                        prefix[p + 1] = prefix[p] + v;
                    }
                    for run in kruns {
                        for (x, a) in acc.iter_mut().enumerate() {
                            let lo = x + run.start;
                            *a += run.weight * (prefix[lo + run.len] - prefix[lo]);
                        }
                    }
                }
                None => {
                    for run in kruns {
                        let contrib = run.weight * fill * run.len as f64;
                        for a in acc.iter_mut() {
                            *a += contrib;
                        }
                    }
                }
            }
        }

        let dst = &mut out.data_mut()[y * w..(y + 1) * w];
        for (d, &a) in dst.iter_mut().zip(acc.iter()) {
            *d = a as f32;
        }
    }

    Ok(())
}
