//! 2D Perlin gradient noise over a fixed permutation table.

const PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69, 142, 8, 99, 37,
    240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32, 57, 177,
    33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175, 74, 165, 71, 134, 139, 48, 27, 166, 77, 146,
    158, 231, 83, 111, 229, 122, 60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25,
    63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100,
    109, 198, 173, 186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163, 70, 221, 153,
    101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232, 178, 185, 112, 104, 218, 246,
    97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192,
    214, 31, 181, 199, 106, 157, 184, 84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222,
    114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156, 180,
];

/// The permutation table repeated twice, so `perm(i + j)` never wraps for
/// byte-sized `i` and `j`.
const fn doubled() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 512 {
        table[i] = PERMUTATION[i % 256];
        i += 1;
    }
    table
}

static PERM: [u8; 512] = doubled();

#[inline]
fn perm(i: usize) -> usize {
    PERM[i] as usize
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: usize, x: f64, y: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = match h {
        0..=3 => y,
        12 | 14 => x,
        _ => 0.0,
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Noise at fractional offset `(x, y)` inside lattice cell `(ix, iy)`.
///
/// `seed` shifts the permutation lookup, giving 256 distinct noise fields.
/// The result lies roughly in `-1.0..=1.0` and is zero on lattice points.
pub fn noise(ix: u8, iy: u8, x: f64, y: f64, seed: u8) -> f64 {
    let (ix, iy, seed) = (ix as usize, iy as usize, seed as usize);
    let u = fade(x);
    let v = fade(y);

    let a = perm(ix + seed) + iy;
    let aa = perm(a);
    let ab = perm(a + 1);
    let b = perm(ix + 1 + seed) + iy;
    let ba = perm(b);
    let bb = perm(b + 1);

    let gaa = grad(perm(aa), x, y);
    let gba = grad(perm(ba), x - 1.0, y);
    let gab = grad(perm(ab), x, y - 1.0);
    let gbb = grad(perm(bb), x - 1.0, y - 1.0);

    lerp(lerp(gaa, gba, u), lerp(gab, gbb, u), v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_permutation() {
        let mut seen = [false; 256];
        for &p in &PERMUTATION {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        assert_eq!(PERM[256], PERMUTATION[0]);
        assert_eq!(PERM[511], PERMUTATION[255]);
    }

    #[test]
    fn zero_on_lattice_points() {
        for seed in [0u8, 17, 255] {
            for (ix, iy) in [(0u8, 0u8), (255, 255), (12, 200)] {
                assert_eq!(noise(ix, iy, 0.0, 0.0, seed), 0.0);
            }
        }
    }

    #[test]
    fn bounded_and_seed_dependent() {
        let mut differs = false;
        for i in 0..64 {
            let (x, y) = (i as f64 / 64.0, (63 - i) as f64 / 64.0);
            let n0 = noise(i as u8, 3, x, y, 0);
            let n1 = noise(i as u8, 3, x, y, 1);
            assert!(n0.abs() <= 2.0 && n1.abs() <= 2.0);
            differs |= n0 != n1;
        }
        assert!(differs);
    }
}
