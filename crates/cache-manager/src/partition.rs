use crate::VersionedTarget;

/// Partition a topologically-ordered run of VTs into groups whose combined
/// source count targets `hint`: before adding a VT to the current group,
/// check whether doing so would bring the group's total to `hint` or
/// beyond. If the group is non-empty, close it first (without the new VT)
/// and start a fresh group with just that VT; an empty group always takes
/// the VT regardless of its size, so a single oversized VT still ends up
/// in a group by itself rather than being rejected outright.
///
/// Checking before the append (rather than accumulating and then checking)
/// is what keeps `vt3` out of the `[vt1, vt2]` group below: folding `vt3`
/// in would reach the hint, so it starts the next group instead of being
/// swept into the one that's closing.
///
/// Ordering is preserved: a group's VTs are a contiguous slice of the input.
pub(crate) fn partition(vts: Vec<VersionedTarget>, hint: usize) -> Vec<Vec<VersionedTarget>> {
    let mut result = Vec::new();
    let mut group: Vec<VersionedTarget> = Vec::new();
    let mut total: usize = 0;

    for vt in vts {
        let sources = vt.cache_key.payloads.len();
        let candidate = total + sources;

        if !group.is_empty() && candidate >= hint {
            result.push(std::mem::take(&mut group));
            total = 0;
        }

        total += sources;
        group.push(vt);
    }

    if !group.is_empty() {
        result.push(group);
    }

    result
}
