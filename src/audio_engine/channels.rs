/// Circularly shifts `samples` right by `amount` positions.
///
/// Element `i` of the input lands at `(i + amount) % len`, so the last `amount` samples wrap
/// around to the front. Shifting an empty slice yields an empty vector.
pub fn roll(samples: &[i16], amount: usize) -> Vec<i16> {
    let mut out = samples.to_vec();
    let len = out.len();
    if len > 0 {
        out.rotate_right(amount % len);
    }
    out
}

/// Interleaves two equally long mono signals into one stereo signal.
///
/// # Parameters
///
/// - `left`: Samples for channel 0
/// - `right`: Samples for channel 1
///
/// # Returns
///
/// Interleaved `[l0, r0, l1, r1, ...]` samples. Extra samples of the longer input are dropped.
pub fn interleave(left: &[i16], right: &[i16]) -> Vec<i16> {
    let mut out = Vec::with_capacity(left.len().min(right.len()) * 2);
    for (l, r) in left.iter().zip(right) {
        out.push(*l);
        out.push(*r);
    }
    out
}
