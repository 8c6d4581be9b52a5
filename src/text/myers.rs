//! Shortest edit script between two sequences (Myers, 1986)
//!
//! Explores diagonals in order of increasing edit distance and keeps the
//! script that reaches each diagonal's furthest point. Ties prefer the path
//! coming from the diagonal above, so a replaced element is reported as a
//! removal followed by an insertion.

/// One step of an edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edit {
    /// Element present in both sequences
    Keep,
    /// Element present only in the second sequence
    Insert,
    /// Element present only in the first sequence
    Remove,
}

#[derive(Clone)]
struct Frontier {
    x: usize,
    script: Vec<Edit>,
}

/// Compute a shortest edit script turning `source` into `target`
///
/// The script visits both sequences in order: every `Keep` and `Remove`
/// consumes one source element, every `Keep` and `Insert` one target element.
pub fn diff<T: PartialEq>(source: &[T], target: &[T]) -> Vec<Edit> {
    let n = source.len();
    let m = target.len();
    if n == 0 && m == 0 {
        return Vec::new();
    }

    // Diagonal k = x - y ranges over [-m, n]; one spare slot on each side
    let offset = m + 1;
    let mut frontier: Vec<Option<Frontier>> = vec![None; n + m + 3];
    if let Some(slot) = frontier.get_mut(offset + 1) {
        *slot = Some(Frontier {
            x: 0,
            script: Vec::new(),
        });
    }

    for d in 0..=(n + m) {
        let d = d as isize;
        let mut k = -d;
        while k <= d {
            let below = slot_x(&frontier, offset, k - 1);
            let above = slot_x(&frontier, offset, k + 1);

            let go_down = match (below, above) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(b), Some(a)) => k == -d || (k != d && b < a),
            };

            let origin = if go_down { k + 1 } else { k - 1 };
            let Some(previous) = slot(&frontier, offset, origin).cloned() else {
                set_slot(&mut frontier, offset, k, None);
                k += 2;
                continue;
            };

            let mut x = if go_down { previous.x } else { previous.x + 1 };
            let y_signed = x as isize - k;
            let mut script = previous.script;

            if y_signed < 0 || x > n || y_signed as usize > m {
                set_slot(&mut frontier, offset, k, None);
                k += 2;
                continue;
            }
            let mut y = y_signed as usize;

            if go_down && y >= 1 {
                script.push(Edit::Insert);
            } else if !go_down && x >= 1 {
                script.push(Edit::Remove);
            }

            while x < n && y < m && source.get(x) == target.get(y) {
                x += 1;
                y += 1;
                script.push(Edit::Keep);
            }

            if x >= n && y >= m {
                return script;
            }

            set_slot(&mut frontier, offset, k, Some(Frontier { x, script }));
            k += 2;
        }
    }

    Vec::new()
}

fn slot(frontier: &[Option<Frontier>], offset: usize, k: isize) -> Option<&Frontier> {
    let index = offset as isize + k;
    if index < 0 {
        return None;
    }
    frontier.get(index as usize).and_then(Option::as_ref)
}

fn slot_x(frontier: &[Option<Frontier>], offset: usize, k: isize) -> Option<usize> {
    slot(frontier, offset, k).map(|f| f.x)
}

fn set_slot(frontier: &mut [Option<Frontier>], offset: usize, k: isize, value: Option<Frontier>) {
    let index = offset as isize + k;
    if index < 0 {
        return;
    }
    if let Some(entry) = frontier.get_mut(index as usize) {
        *entry = value;
    }
}
