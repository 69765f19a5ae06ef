//! Content runs: candidate break offsets used to guess a balanced height
//!
//! A run is the stretch of flow content between two explicit breaks (or
//! between the last break and the end of the group). Each run may be assumed
//! to contain some implicit breaks; its column height is its length divided
//! evenly between the columns it would occupy.

/// A run of content ending at an explicit break
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRun {
    break_offset: f32,
    assumed_implicit_breaks: u32,
}

impl ContentRun {
    pub fn new(break_offset: f32) -> Self {
        Self {
            break_offset,
            assumed_implicit_breaks: 0,
        }
    }

    /// Flow thread offset where the run ends
    pub fn break_offset(&self) -> f32 {
        self.break_offset
    }

    pub fn assumed_implicit_breaks(&self) -> u32 {
        self.assumed_implicit_breaks
    }

    pub fn assume_another_implicit_break(&mut self) {
        self.assumed_implicit_breaks += 1;
    }

    /// Column height needed to fit the run, given where the previous run ended
    pub fn column_logical_height(&self, start_offset: f32) -> f32 {
        ((self.break_offset - start_offset) / (self.assumed_implicit_breaks + 1) as f32).ceil()
    }
}

/// Ordered content runs of one fragmentainer group
#[derive(Debug, Clone, Default)]
pub struct ContentRuns {
    runs: Vec<ContentRun>,
}

impl ContentRuns {
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentRun> {
        self.runs.iter()
    }

    /// Record an explicit break at `end_offset`.
    ///
    /// Offsets at or before the previous break are ignored. Once `capacity`
    /// runs exist there are no columns left for further runs, so they are
    /// dropped too.
    pub fn add(&mut self, end_offset: f32, capacity: usize) {
        if let Some(last) = self.runs.last() {
            if end_offset <= last.break_offset() {
                return;
            }
        }
        if self.runs.len() < capacity {
            self.runs.push(ContentRun::new(end_offset));
        }
    }

    /// Index of the run needing the tallest columns. Ties go to the earliest run.
    pub fn run_with_tallest_columns(&self, group_top: f32) -> Option<usize> {
        let mut tallest: Option<(usize, f32)> = None;
        let mut previous_offset = group_top;
        for (index, run) in self.runs.iter().enumerate() {
            let height = run.column_logical_height(previous_offset);
            if tallest.is_none_or(|(_, tallest_height)| tallest_height < height) {
                tallest = Some((index, height));
            }
            previous_offset = run.break_offset();
        }
        tallest.map(|(index, _)| index)
    }

    /// Column height required by the tallest run
    pub fn tallest_column_height(&self, group_top: f32) -> Option<f32> {
        let index = self.run_with_tallest_columns(group_top)?;
        let start = match index {
            0 => group_top,
            _ => self.runs[index - 1].break_offset(),
        };
        Some(self.runs[index].column_logical_height(start))
    }

    /// Hand out implicit breaks, always to the run with the tallest columns,
    /// until the runs and their implicit breaks account for `column_count`
    /// columns.
    pub fn distribute_implicit_breaks(&mut self, group_top: f32, column_count: usize) {
        let mut break_count = self.runs.len();
        while break_count < column_count {
            let Some(index) = self.run_with_tallest_columns(group_top) else {
                return;
            };
            self.runs[index].assume_another_implicit_break();
            break_count += 1;
        }
    }
}
