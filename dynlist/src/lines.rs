//! Line metrics: the mapping between scroll offsets and fractional lines.
//!
//! A line holds `items_per_line` consecutive items (one for a list, several
//! for a tile view). Its extent along the scroll axis is the largest extent
//! of its items. Offsets are prefix sums of line extents, so any scroll
//! offset maps to a fractional line and back.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct LineMetrics {
    items_per_line: usize,
    num_items: usize,
    /// `starts[l]` is the offset where line `l` begins; the last entry is the
    /// total length.
    starts: Vec<f32>,
}

impl LineMetrics {
    pub fn empty() -> Self {
        Self {
            items_per_line: 1,
            num_items: 0,
            starts: vec![0.0],
        }
    }

    /// Build metrics from per-item extents.
    pub fn from_extents(extents: impl IntoIterator<Item = f32>, items_per_line: usize) -> Self {
        let items_per_line = items_per_line.max(1);
        let mut starts = vec![0.0];
        let mut num_items = 0;
        let mut line_extent = 0.0f32;
        let mut running = 0.0f32;

        for extent in extents {
            line_extent = line_extent.max(extent.max(0.0));
            num_items += 1;
            if num_items % items_per_line == 0 {
                running += line_extent;
                starts.push(running);
                line_extent = 0.0;
            }
        }
        if num_items % items_per_line != 0 {
            running += line_extent;
            starts.push(running);
        }

        Self {
            items_per_line,
            num_items,
            starts,
        }
    }

    pub fn items_per_line(&self) -> usize {
        self.items_per_line
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn num_lines(&self) -> usize {
        self.starts.len() - 1
    }

    pub fn total_length(&self) -> f32 {
        self.starts.last().copied().unwrap_or(0.0)
    }

    pub fn line_start(&self, line: usize) -> f32 {
        self.starts[line.min(self.num_lines())]
    }

    pub fn line_extent(&self, line: usize) -> f32 {
        if line >= self.num_lines() {
            return 0.0;
        }
        self.starts[line + 1] - self.starts[line]
    }

    pub fn line_of_item(&self, index: usize) -> usize {
        index / self.items_per_line
    }

    pub fn items_in_line(&self, line: usize) -> Range<usize> {
        let start = (line * self.items_per_line).min(self.num_items);
        let end = (start + self.items_per_line).min(self.num_items);
        start..end
    }

    /// Fractional line at `offset`, clamped to `[0, num_lines]`.
    pub fn line_at_offset(&self, offset: f32) -> f32 {
        let num_lines = self.num_lines();
        if num_lines == 0 || offset <= 0.0 {
            return 0.0;
        }
        if offset >= self.total_length() {
            return num_lines as f32;
        }
        let line = self.starts.partition_point(|start| *start <= offset) - 1;
        let extent = self.line_extent(line);
        let fraction = if extent > 0.0 {
            (offset - self.starts[line]) / extent
        } else {
            0.0
        };
        line as f32 + fraction
    }

    /// Offset of a fractional line. Lines outside the list extrapolate with
    /// the extent of the nearest line.
    pub fn offset_at_line(&self, line: f32) -> f32 {
        let num_lines = self.num_lines();
        if num_lines == 0 {
            return 0.0;
        }
        if line < 0.0 {
            return line * self.line_extent(0);
        }
        let whole = line.floor() as usize;
        if whole >= num_lines {
            let last = self.line_extent(num_lines - 1);
            return self.total_length() + (line - num_lines as f32) * last;
        }
        self.starts[whole] + line.fract() * self.line_extent(whole)
    }
}

impl Default for LineMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_prefix_sums() {
        let lines = LineMetrics::from_extents([10.0, 20.0, 30.0], 1);
        assert_eq!(lines.num_lines(), 3);
        assert_eq!(lines.total_length(), 60.0);
        assert_eq!(lines.line_at_offset(15.0), 1.25);
        assert_eq!(lines.offset_at_line(2.5), 45.0);
        assert_eq!(lines.line_at_offset(1000.0), 3.0);
    }

    #[test]
    fn tiles_use_tallest_item_per_line() {
        let lines = LineMetrics::from_extents([10.0, 40.0, 20.0, 5.0, 5.0], 2);
        assert_eq!(lines.num_lines(), 3);
        assert_eq!(lines.line_extent(0), 40.0);
        assert_eq!(lines.line_extent(2), 5.0);
        assert_eq!(lines.items_in_line(2), 4..5);
        assert_eq!(lines.line_of_item(3), 1);
    }

    #[test]
    fn zero_length_lines_are_skipped() {
        let lines = LineMetrics::from_extents([50.0, 0.0, 50.0], 1);
        assert_eq!(lines.line_at_offset(50.0), 2.0);
    }

    #[test]
    fn negative_lines_extrapolate() {
        let lines = LineMetrics::from_extents([40.0, 40.0], 1);
        assert_eq!(lines.offset_at_line(-0.25), -10.0);
        assert_eq!(LineMetrics::empty().offset_at_line(3.0), 0.0);
    }
}
