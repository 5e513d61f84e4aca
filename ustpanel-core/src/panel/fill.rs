//! Gap filling over a date-ordered sequence.
//!
//! Both passes work on one field at a time, selected by an accessor, so the
//! same scan serves every static attribute of a timeline slot.

/// Carry the last known value forward into subsequent gaps.
pub fn forward_fill<S, T, F>(slots: &mut [S], mut field: F)
where
    T: Clone,
    F: FnMut(&mut S) -> &mut Option<T>,
{
    let mut last: Option<T> = None;
    for slot in slots.iter_mut() {
        let value = field(slot);
        if value.is_some() {
            last = value.clone();
        } else {
            *value = last.clone();
        }
    }
}

/// Carry the next known value backward into preceding gaps.
///
/// After a forward pass only the leading gap is still empty, so this fills
/// it with the first known value.
pub fn backward_fill<S, T, F>(slots: &mut [S], mut field: F)
where
    T: Clone,
    F: FnMut(&mut S) -> &mut Option<T>,
{
    let mut next: Option<T> = None;
    for slot in slots.iter_mut().rev() {
        let value = field(slot);
        if value.is_some() {
            next = value.clone();
        } else {
            *value = next.clone();
        }
    }
}

/// Forward pass, then backward pass.
pub fn fill_both<S, T, F>(slots: &mut [S], mut field: F)
where
    T: Clone,
    F: FnMut(&mut S) -> &mut Option<T>,
{
    forward_fill(slots, &mut field);
    backward_fill(slots, &mut field);
}
