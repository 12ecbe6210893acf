//! 新设备自动布局
//!
//! 依次尝试：5×5 网格 → 100 个随机点 → 锚点加小幅抖动（允许重叠）。
//! 坐标为示意图百分比。网格点固定为 {10,30,50,70,90}²，按到锚点最近网格点的
//! 距离由近及远排列，因此同一种类最多 25 个设备都能互不重叠。

use domain::DeviceKind;
use rand::Rng;

/// 两个设备之间的最小距离。
pub const MIN_DISTANCE: f64 = 15.0;
/// 网格间距。
pub const GRID_UNIT: f64 = 20.0;
const GRID_SIZE: usize = 5;
const MARGIN_MIN: f64 = 10.0;
const MARGIN_MAX: f64 = 90.0;
const RANDOM_ATTEMPTS: usize = 100;
const FALLBACK_JITTER: f64 = 5.0;

/// 各设备种类的起始锚点。
pub fn anchor_for(kind: DeviceKind) -> (f64, f64) {
    match kind {
        DeviceKind::Tank => (20.0, 20.0),
        DeviceKind::Control => (50.0, 20.0),
        DeviceKind::ElectricalDevice => (20.0, 50.0),
        DeviceKind::Other => (50.0, 50.0),
    }
}

/// 网格候选点，从离锚点最近的网格点向外排列。
fn grid_candidates(anchor: (f64, f64)) -> Vec<(f64, f64)> {
    let lattice = |index: usize| MARGIN_MIN + index as f64 * GRID_UNIT;
    let nearest = |value: f64| {
        (0..GRID_SIZE)
            .min_by(|a, b| {
                (lattice(*a) - value)
                    .abs()
                    .total_cmp(&(lattice(*b) - value).abs())
            })
            .unwrap_or(0)
    };
    let (origin_col, origin_row) = (nearest(anchor.0), nearest(anchor.1));

    let mut cells: Vec<(usize, usize)> = (0..GRID_SIZE)
        .flat_map(|row| (0..GRID_SIZE).map(move |col| (row, col)))
        .collect();
    // 先按环（切比雪夫距离）再按行列排序，结果稳定
    cells.sort_by_key(|&(row, col)| {
        let ring = row.abs_diff(origin_row).max(col.abs_diff(origin_col));
        let spread = row.abs_diff(origin_row) + col.abs_diff(origin_col);
        (ring, spread, row, col)
    });
    cells
        .into_iter()
        .map(|(row, col)| (lattice(col), lattice(row)))
        .collect()
}

fn is_free(candidate: (f64, f64), existing: &[(f64, f64)]) -> bool {
    existing.iter().all(|(x, y)| {
        let dx = candidate.0 - x;
        let dy = candidate.1 - y;
        (dx * dx + dy * dy).sqrt() >= MIN_DISTANCE
    })
}

/// 为新设备选择位置。
pub fn place_new_device<R: Rng + ?Sized>(
    existing: &[(f64, f64)],
    kind: DeviceKind,
    rng: &mut R,
) -> (f64, f64) {
    let (anchor_x, anchor_y) = anchor_for(kind);
    if let Some(candidate) = grid_candidates((anchor_x, anchor_y))
        .into_iter()
        .find(|candidate| is_free(*candidate, existing))
    {
        return candidate;
    }

    for _ in 0..RANDOM_ATTEMPTS {
        let candidate = (
            rng.gen_range(MARGIN_MIN..=MARGIN_MAX),
            rng.gen_range(MARGIN_MIN..=MARGIN_MAX),
        );
        if is_free(candidate, existing) {
            return candidate;
        }
    }

    (
        anchor_x + rng.gen_range(0.0..FALLBACK_JITTER),
        anchor_y + rng.gen_range(0.0..FALLBACK_JITTER),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn first_placement_is_the_grid_point_nearest_the_anchor() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(place_new_device(&[], DeviceKind::Tank, &mut rng), (10.0, 10.0));
        assert_eq!(
            place_new_device(&[], DeviceKind::Control, &mut rng),
            (50.0, 10.0)
        );
        assert_eq!(
            place_new_device(&[], DeviceKind::Other, &mut rng),
            (50.0, 50.0)
        );
    }

    #[test]
    fn placements_keep_minimum_distance() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut placed: Vec<(f64, f64)> = Vec::new();
        for _ in 0..10 {
            let next = place_new_device(&placed, DeviceKind::ElectricalDevice, &mut rng);
            placed.push(next);
        }
        for (i, a) in placed.iter().enumerate() {
            assert!((MARGIN_MIN..=MARGIN_MAX).contains(&a.0));
            assert!((MARGIN_MIN..=MARGIN_MAX).contains(&a.1));
            for b in &placed[i + 1..] {
                let distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                assert!(distance >= MIN_DISTANCE, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn twenty_four_placements_per_kind_never_overlap() {
        for kind in [
            DeviceKind::Tank,
            DeviceKind::Control,
            DeviceKind::ElectricalDevice,
            DeviceKind::Other,
        ] {
            let mut rng = StdRng::seed_from_u64(3);
            let mut placed: Vec<(f64, f64)> = Vec::new();
            for _ in 0..24 {
                let next = place_new_device(&placed, kind, &mut rng);
                placed.push(next);
            }
            for (i, a) in placed.iter().enumerate() {
                for b in &placed[i + 1..] {
                    let distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                    assert!(distance >= MIN_DISTANCE, "{kind:?}: {a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn grid_starts_next_to_the_anchor() {
        let candidates = grid_candidates(anchor_for(DeviceKind::Control));
        assert_eq!(candidates.len(), 25);
        assert_eq!(candidates[0], (50.0, 10.0));
        let mut unique = candidates.clone();
        unique.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        unique.dedup();
        assert_eq!(unique.len(), 25);
    }

    #[test]
    fn crowded_canvas_falls_back_near_anchor() {
        let mut crowded = Vec::new();
        let mut x = 0.0;
        while x <= 100.0 {
            let mut y = 0.0;
            while y <= 100.0 {
                crowded.push((x, y));
                y += 5.0;
            }
            x += 5.0;
        }
        let mut rng = StdRng::seed_from_u64(1);
        let (x, y) = place_new_device(&crowded, DeviceKind::Other, &mut rng);
        assert!((50.0..55.0).contains(&x));
        assert!((50.0..55.0).contains(&y));
    }
}
