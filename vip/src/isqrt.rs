//! Exact integer square root.

/// `floor(sqrt(n))` by Newton's method.
///
/// Starts from a power of two at or above the root, so the iterates
/// decrease monotonically and stop at the floor.
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}
