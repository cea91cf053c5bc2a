//! Optional passes run over a finished catalog before it is emitted.

use crate::catalog::ControlCatalog;
use tracing::debug;

/// Drop the first narrative fragment of every control that has more than one.
///
/// Some sheets list a bare control row ahead of its enhancement rows, which
/// leaves a leading "Text only" placeholder next to the real fragments.
/// Returns the number of fragments removed. Controls with a single fragment
/// are left alone.
pub fn drop_leading_placeholder(catalog: &mut ControlCatalog) -> usize {
    let mut removed = 0;
    for entry in catalog.entries_mut() {
        if entry.narrative.len() > 1 {
            let dropped = entry.narrative.remove(0);
            debug!(
                control = %entry.control_key,
                text = %dropped.text,
                "dropped leading narrative fragment"
            );
            removed += 1;
        }
    }
    removed
}
