// Keytouch Input Layer - Key Grid
// Row/key bounds used for hit-testing, recomputed on every size change

use indexmap::IndexMap;

use crate::geometry::{Point, Rect};
use crate::key::KeyId;

/// Keys arranged in horizontal rows together with their screen-space bounds.
///
/// Rows are assumed to share the view height equally, which lets a hit test
/// pick the row by proportional bucketing of the y coordinate before scanning
/// that row's keys.
#[derive(Debug, Clone, Default)]
pub struct KeyGrid {
    rows: Vec<Vec<KeyId>>,
    /// Screen-space bounds per key; `None` while a key is detached
    key_bounds: IndexMap<KeyId, Option<Rect>>,
    /// Screen-space bounds of the whole keyboard view
    view: Rect,
}

impl KeyGrid {
    /// Create a grid for the given rows; no bounds are known yet
    pub fn new(rows: Vec<Vec<KeyId>>) -> Self {
        let key_bounds = rows.iter().flatten().map(|key| (*key, None)).collect();
        Self {
            rows,
            key_bounds,
            view: Rect::default(),
        }
    }

    pub fn rows(&self) -> &[Vec<KeyId>] {
        &self.rows
    }

    /// All keys in layout order
    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.key_bounds.keys().copied()
    }

    pub fn view_bounds(&self) -> Rect {
        self.view
    }

    /// Record the view's screen-space bounds after a size change
    pub fn set_view_bounds(&mut self, view: Rect) {
        self.view = view;
    }

    pub fn key_bounds(&self, key: KeyId) -> Option<Rect> {
        self.key_bounds.get(&key).copied().flatten()
    }

    /// Update (or detach with `None`) a single key's bounds
    pub fn set_key_bounds(&mut self, key: KeyId, bounds: Option<Rect>) {
        if let Some(slot) = self.key_bounds.get_mut(&key) {
            *slot = bounds;
        } else {
            log::warn!("Ignoring bounds for {} which is not part of the grid", key);
        }
    }

    /// Recompute every key's bounds for a view placed at `view`.
    ///
    /// `widths[row][i]` is the fraction of the row taken by key `i`; a
    /// fraction of `0.0` shares whatever the explicit widths leave over.
    /// Rows without width information split the row evenly.
    pub fn layout(&mut self, view: Rect, widths: &[Vec<f32>]) {
        self.view = view;
        if self.rows.is_empty() {
            return;
        }
        let row_height = view.height() / self.rows.len() as f32;
        for (row_index, row) in self.rows.iter().enumerate() {
            let fractions = resolve_fractions(row.len(), widths.get(row_index).map(Vec::as_slice));
            let top = view.top + row_height * row_index as f32;
            let mut left = view.left;
            for (key, fraction) in row.iter().zip(fractions) {
                let width = view.width() * fraction;
                self.key_bounds
                    .insert(*key, Some(Rect::from_origin_size(left, top, width, row_height)));
                left += width;
            }
        }
    }

    /// Find the key under a point given in the view's local coordinates
    pub fn find_key(&self, local: Point) -> Option<KeyId> {
        let height = self.view.height();
        if self.rows.is_empty() || height <= 0.0 || local.y < 0.0 {
            return None;
        }
        let row_index = (local.y * self.rows.len() as f32 / height).floor() as usize;
        let row = self.rows.get(row_index)?;
        let screen = local.offset(self.view.left, self.view.top);
        row.iter()
            .copied()
            .find(|key| self.key_bounds(*key).is_some_and(|b| b.contains(screen)))
    }

    /// Translate a view-local point into `key`'s local coordinate space.
    ///
    /// Returns `None` when the key currently has no bounds.
    pub fn to_key_local(&self, key: KeyId, local: Point) -> Option<Point> {
        let Some(bounds) = self.key_bounds(key) else {
            log::warn!("{} has no bounds, cannot transform pointer position", key);
            return None;
        };
        let screen = Point::new(local.x + self.view.left, local.y + self.view.top);
        Some(bounds.to_local(screen))
    }
}

/// Turn per-key width fractions into final fractions summing to at most 1.0
fn resolve_fractions(count: usize, widths: Option<&[f32]>) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    let explicit: Vec<f32> = (0..count)
        .map(|i| widths.and_then(|w| w.get(i)).copied().unwrap_or(0.0).max(0.0))
        .collect();
    let fixed: f32 = explicit.iter().sum();
    let flexible = explicit.iter().filter(|w| **w == 0.0).count();
    let share = if flexible > 0 {
        (1.0 - fixed).max(0.0) / flexible as f32
    } else {
        0.0
    };
    explicit
        .into_iter()
        .map(|w| if w == 0.0 { share } else { w })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_grid() -> KeyGrid {
        let mut grid = KeyGrid::new(vec![
            vec![KeyId(0), KeyId(1)],
            vec![KeyId(2), KeyId(3), KeyId(4)],
        ]);
        grid.layout(
            Rect::from_origin_size(0.0, 400.0, 300.0, 200.0),
            &[vec![0.5, 0.5], vec![0.25, 0.0, 0.25]],
        );
        grid
    }

    #[test]
    fn test_layout_bounds() {
        let grid = two_row_grid();
        assert_eq!(grid.key_bounds(KeyId(0)), Some(Rect::new(0.0, 400.0, 150.0, 500.0)));
        assert_eq!(grid.key_bounds(KeyId(3)), Some(Rect::new(75.0, 500.0, 225.0, 600.0)));
        assert_eq!(grid.key_bounds(KeyId(4)), Some(Rect::new(225.0, 500.0, 300.0, 600.0)));
    }

    #[test]
    fn test_find_key_by_row_bucket() {
        let grid = two_row_grid();
        assert_eq!(grid.find_key(Point::new(10.0, 10.0)), Some(KeyId(0)));
        assert_eq!(grid.find_key(Point::new(160.0, 99.0)), Some(KeyId(1)));
        assert_eq!(grid.find_key(Point::new(100.0, 150.0)), Some(KeyId(3)));
        assert_eq!(grid.find_key(Point::new(299.0, 199.0)), Some(KeyId(4)));
    }

    #[test]
    fn test_find_key_misses() {
        let grid = two_row_grid();
        assert_eq!(grid.find_key(Point::new(10.0, -1.0)), None);
        assert_eq!(grid.find_key(Point::new(10.0, 250.0)), None);
        assert_eq!(grid.find_key(Point::new(400.0, 10.0)), None);
    }

    #[test]
    fn test_find_key_skips_detached_keys() {
        let mut grid = two_row_grid();
        grid.set_key_bounds(KeyId(0), None);
        assert_eq!(grid.find_key(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn test_to_key_local() {
        let grid = two_row_grid();
        let local = grid.to_key_local(KeyId(3), Point::new(100.0, 150.0)).unwrap();
        assert_eq!(local, Point::new(25.0, 50.0));
    }

    #[test]
    fn test_to_key_local_detached() {
        let mut grid = two_row_grid();
        grid.set_key_bounds(KeyId(3), None);
        assert_eq!(grid.to_key_local(KeyId(3), Point::new(100.0, 150.0)), None);
    }

    #[test]
    fn test_empty_grid_never_hits() {
        let grid = KeyGrid::new(vec![]);
        assert_eq!(grid.find_key(Point::new(0.0, 0.0)), None);
    }
}
