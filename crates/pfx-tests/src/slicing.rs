//! Slice coverage and first-tile size over assorted selection shapes.

use pfx_core::{slice_region, Rect, Region};

fn shapes(bounds: Rect) -> Vec<(&'static str, Region)> {
    let ring = Region::ellipse(bounds).exclude(&Region::ellipse(Rect::new(
        bounds.x + bounds.width / 4,
        bounds.y + bounds.height / 4,
        bounds.width / 2,
        bounds.height / 2,
    )));
    let two_boxes = Region::from_rect(Rect::new(2, 3, 10, 4)).union(&Region::from_rect(Rect::new(20, 10, 7, 9)));
    vec![
        ("full", Region::from_rect(bounds)),
        ("ellipse", Region::ellipse(bounds)),
        ("ring", ring),
        ("two boxes", two_boxes),
        // Sticks out on every side and must be clipped
        ("oversized", Region::from_rect(Rect::new(-5, -5, bounds.width + 10, bounds.height + 10))),
        ("single pixel", Region::from_rect(Rect::new(7, 7, 1, 1))),
        ("empty", Region::new()),
    ]
}

/// Coverage count per pixel of `bounds`.
fn coverage(slices: &[Vec<Rect>], bounds: Rect) -> Vec<u32> {
    let mut counts = vec![0u32; (bounds.width * bounds.height) as usize];
    for rect in slices.iter().flatten() {
        assert!(bounds.contains_rect(rect), "{rect} outside {bounds}");
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                counts[((y - bounds.y) * bounds.width + (x - bounds.x)) as usize] += 1;
            }
        }
    }
    counts
}

#[test]
fn slices_cover_the_clipped_region_exactly_once() {
    let bounds = Rect::from_size(32, 24);
    for (name, region) in shapes(bounds) {
        for n in [1, 2, 3, 7, 16, 64] {
            let slices = slice_region(&region, n, bounds).unwrap();
            assert_eq!(slices.len(), n, "{name} / {n}");
            let counts = coverage(&slices, bounds);
            for y in 0..bounds.height {
                for x in 0..bounds.width {
                    let expected = u32::from(region.contains(x, y));
                    assert_eq!(counts[(y * bounds.width + x) as usize], expected, "{name} / {n} at ({x}, {y})");
                }
            }
        }
    }
}

#[test]
fn first_tile_is_at_most_one_run() {
    let bounds = Rect::from_size(32, 24);
    for (name, region) in shapes(bounds) {
        let runs = region.intersect_rect(bounds).scans();
        if runs.len() < 2 {
            continue;
        }
        let widest = runs.iter().map(|s| s.len() as u64).max().unwrap_or(0);
        for n in [2, 3, 8, 100] {
            let slices = slice_region(&region, n, bounds).unwrap();
            let area: u64 = slices[0].iter().map(|r| r.area()).sum();
            assert!(slices[0].len() <= 1, "{name} / {n}");
            assert!(area <= widest, "{name} / {n}: {area} > {widest}");
        }
    }
}

#[test]
fn more_slices_than_runs_leaves_trailing_slices_empty() {
    let bounds = Rect::from_size(8, 8);
    let region = Region::from_rect(Rect::new(0, 0, 8, 3));
    let slices = slice_region(&region, 10, bounds).unwrap();
    let non_empty = slices.iter().filter(|s| !s.is_empty()).count();
    assert_eq!(non_empty, 3);
    let total: u64 = slices.iter().flatten().map(|r| r.area()).sum();
    assert_eq!(total, 24);
}
