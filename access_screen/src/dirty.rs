use crate::rect::Rect;

/// Regions of the off-screen buffer modified since the last flush.
#[derive(Debug, Clone, Default)]
pub struct DirtyRects {
    rects: Vec<Rect>,
}

impl DirtyRects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a modified region.
    ///
    /// # Panics
    ///
    /// Panics when `rect` has no area; callers must never register one.
    pub fn add(&mut self, rect: Rect) {
        assert!(
            rect.is_well_formed(),
            "dirty rect must have positive width and height: {rect:?}"
        );
        self.rects.push(rect);
    }

    /// Coalesces touching rectangles into their bounding boxes until no pair
    /// in the list touches.
    pub fn merge(&mut self) {
        if self.rects.len() < 2 {
            return;
        }

        let mut outer = 0;
        while outer < self.rects.len() {
            let mut grew = false;
            let mut inner = outer + 1;
            while inner < self.rects.len() {
                if self.rects[outer].touches(&self.rects[inner]) {
                    let absorbed = self.rects.remove(inner);
                    self.rects[outer] = self.rects[outer].union(&absorbed);
                    grew = true;
                    inner = outer + 1;
                } else {
                    inner += 1;
                }
            }

            // A grown rect may now reach entries that were already scanned.
            outer = if grew { 0 } else { outer + 1 };
        }
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(rects: &[Rect]) -> Vec<Rect> {
        let mut dirty = DirtyRects::new();
        for rect in rects {
            dirty.add(*rect);
        }
        dirty.merge();
        dirty.rects().to_vec()
    }

    #[test]
    fn overlapping_rects_collapse_to_bounds() {
        let result = merged(&[Rect::new(0, 0, 5, 5), Rect::new(3, 3, 8, 8)]);
        assert_eq!(result, vec![Rect::new(0, 0, 8, 8)]);
    }

    #[test]
    fn edge_sharing_rects_merge() {
        let result = merged(&[Rect::new(0, 0, 10, 10), Rect::new(10, 0, 20, 10)]);
        assert_eq!(result, vec![Rect::new(0, 0, 20, 10)]);
    }

    #[test]
    fn disjoint_rects_survive_in_order() {
        let rects = [Rect::new(0, 0, 4, 4), Rect::new(50, 50, 60, 60)];
        assert_eq!(merged(&rects), rects.to_vec());
    }

    #[test]
    fn single_rect_is_untouched() {
        assert_eq!(merged(&[Rect::new(1, 1, 2, 2)]), vec![Rect::new(1, 1, 2, 2)]);
        assert!(merged(&[]).is_empty());
    }

    #[test]
    fn growth_pulls_in_earlier_entries() {
        // The first rect only touches the union of the later two.
        let result = merged(&[
            Rect::new(15, 0, 25, 5),
            Rect::new(0, 0, 10, 10),
            Rect::new(10, 8, 20, 10),
        ]);
        assert_eq!(result, vec![Rect::new(0, 0, 25, 10)]);
    }

    #[test]
    fn merged_list_has_no_touching_pairs() {
        let mut state = 0x2545_f491_u32;
        let mut next = move |bound: i32| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % bound as u32) as i32
        };

        for _ in 0..200 {
            let mut dirty = DirtyRects::new();
            for _ in 0..(1 + next(24)) {
                let left = next(300);
                let top = next(180);
                dirty.add(Rect::from_size(left, top, 1 + next(30), 1 + next(30)));
            }
            dirty.merge();

            let rects = dirty.rects();
            for (i, a) in rects.iter().enumerate() {
                for b in &rects[i + 1..] {
                    assert!(!a.touches(b), "{a:?} still touches {b:?}");
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "positive width and height")]
    fn degenerate_rect_is_fatal() {
        DirtyRects::new().add(Rect::new(4, 4, 4, 9));
    }
}
