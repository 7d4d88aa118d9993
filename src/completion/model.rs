//! Completion state, layout and selection

use unicode_width::UnicodeWidthStr;

use crate::types::SessionId;

use super::client::CompletionRequest;
use super::parser::{CompletionOption, CompletionResult, Directive};

/// Never show more rows of suggestions than this
pub const MAX_ROWS: usize = 15;

/// Spaces between suggestion columns
pub const COLUMN_PADDING: usize = 3;

/// The suggestions of the current completion query
#[derive(Debug, Clone)]
pub struct CompletionModel {
    id: SessionId,
    parent: SessionId,
    seq: u64,
    pending: bool,
    options: Vec<CompletionOption>,
    directive: Directive,
    selected: usize,
    width: usize,
    height: usize,
}

/// One suggestion as laid out for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Escaped candidate
    pub name: String,
    /// Description, shown in annotated layouts only
    pub description: Option<String>,
    /// True for the highlighted candidate
    pub selected: bool,
}

/// Suggestions arranged for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionList {
    /// Single column with descriptions
    pub annotated: bool,
    /// Number of columns
    pub columns: usize,
    /// Width of the widest candidate
    pub name_width: usize,
    /// Visible rows, each holding up to `columns` suggestions
    pub rows: Vec<Vec<Suggestion>>,
}

impl SuggestionList {
    /// Plain-text rendering, one string per row
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let mut line = String::new();
                for (column, suggestion) in row.iter().enumerate() {
                    if self.annotated {
                        line.push_str(&suggestion.name);
                        if let Some(description) = &suggestion.description {
                            line.push_str(&" ".repeat(self.name_width - suggestion.name.width()));
                            line.push_str(" - ");
                            line.push_str(description);
                        }
                    } else {
                        if column > 0 {
                            line.push_str(&" ".repeat(COLUMN_PADDING));
                        }
                        line.push_str(&suggestion.name);
                        if column + 1 < row.len() {
                            line.push_str(&" ".repeat(self.name_width - suggestion.name.width()));
                        }
                    }
                }
                line
            })
            .collect()
    }
}

impl CompletionModel {
    /// Create an empty model owned by the session `parent`
    #[must_use]
    pub fn new(id: SessionId, parent: SessionId) -> Self {
        Self {
            id,
            parent,
            seq: 0,
            pending: false,
            options: Vec::new(),
            directive: Directive::empty(),
            selected: 0,
            width: 0,
            height: 0,
        }
    }

    /// Id results for this model are addressed to
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Session which owns this model
    #[must_use]
    pub const fn parent(&self) -> SessionId {
        self.parent
    }

    /// Update the space available for layout
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Start a new query, discarding the current suggestions
    pub fn begin(&mut self, line: impl Into<String>) -> CompletionRequest {
        self.seq += 1;
        self.pending = true;
        self.options.clear();
        self.directive = Directive::empty();
        self.selected = 0;

        CompletionRequest {
            target: self.id,
            seq: self.seq,
            line: line.into(),
        }
    }

    /// Apply the answer to a query
    ///
    /// # Returns
    /// The number of options, or `None` if the answer is stale
    pub fn apply(&mut self, seq: u64, result: CompletionResult) -> Option<usize> {
        if !self.pending || seq != self.seq {
            log::debug!("Dropping stale completion result {seq} (current {})", self.seq);
            return None;
        }

        self.pending = false;
        self.options = result.options;
        self.directive = result.directive;
        self.selected = 0;
        Some(self.options.len())
    }

    /// Drop the suggestions and ignore any query still in flight
    pub fn clear(&mut self) {
        self.seq += 1;
        self.pending = false;
        self.options.clear();
        self.directive = Directive::empty();
        self.selected = 0;
    }

    /// Sequence number of the latest query
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns true if `seq` is the latest query and its answer is applied
    #[must_use]
    pub const fn is_current(&self, seq: u64) -> bool {
        !self.pending && seq == self.seq
    }

    /// Returns true while a query is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Current suggestions, sorted by name
    #[must_use]
    pub fn options(&self) -> &[CompletionOption] {
        &self.options
    }

    /// Directive of the last answer
    #[must_use]
    pub const fn directive(&self) -> Directive {
        self.directive
    }

    /// Index of the highlighted suggestion
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// The highlighted suggestion, if any
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.options.get(self.selected).map(|option| option.name.as_str())
    }

    /// Select the next suggestion, wrapping around
    pub fn next_result(&mut self) {
        self.move_result(1);
    }

    /// Select the previous suggestion, wrapping around
    pub fn previous_result(&mut self) {
        self.move_result(-1);
    }

    /// Move down one row
    pub fn next_row(&mut self) {
        self.move_row(1);
    }

    /// Move up one row
    pub fn previous_row(&mut self) {
        self.move_row(-1);
    }

    /// Move right one column
    pub fn next_column(&mut self) {
        self.move_column(1);
    }

    /// Move left one column
    pub fn previous_column(&mut self) {
        self.move_column(-1);
    }

    fn move_result(&mut self, delta: isize) {
        let len = self.options.len();
        if len == 0 {
            return;
        }
        let len = len as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    fn move_row(&mut self, delta: isize) {
        let step = delta * self.columns() as isize;
        self.move_within(step);
    }

    fn move_column(&mut self, delta: isize) {
        let columns = self.columns() as isize;
        let column = (self.selected % self.columns()) as isize;
        if column + delta < 0 || column + delta >= columns {
            return;
        }
        self.move_within(delta);
    }

    fn move_within(&mut self, delta: isize) {
        if let Some(index) = self.selected.checked_add_signed(delta)
            && index < self.options.len()
        {
            self.selected = index;
        }
    }

    fn max_rows(&self) -> usize {
        MAX_ROWS.min(self.height.saturating_sub(2)).max(1)
    }

    fn name_width(&self) -> usize {
        self.options
            .iter()
            .map(|option| option.name.width())
            .max()
            .unwrap_or(0)
    }

    fn all_described(&self) -> bool {
        !self.options.is_empty() && self.options.iter().all(|option| option.description.is_some())
    }

    /// Number of columns the suggestions are laid out in
    #[must_use]
    pub fn columns(&self) -> usize {
        if self.all_described() && self.options.len() <= self.max_rows() {
            return 1;
        }
        (self.width / (self.name_width() + COLUMN_PADDING)).max(1)
    }

    /// Lay the suggestions out for display
    ///
    /// Options are placed row-major. When there are more rows than fit, the
    /// visible window follows the selection.
    #[must_use]
    pub fn layout(&self) -> Option<SuggestionList> {
        if self.options.is_empty() {
            return None;
        }

        let columns = self.columns();
        let annotated = columns == 1 && self.all_described();
        let max_rows = self.max_rows();
        let selected_row = self.selected / columns;
        let first_row = (selected_row + 1).saturating_sub(max_rows);

        let rows = self
            .options
            .chunks(columns)
            .enumerate()
            .skip(first_row)
            .take(max_rows)
            .map(|(row, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    .map(|(column, option)| Suggestion {
                        name: option.name.clone(),
                        description: if annotated {
                            option.description.clone()
                        } else {
                            None
                        },
                        selected: row * columns + column == self.selected,
                    })
                    .collect()
            })
            .collect();

        Some(SuggestionList {
            annotated,
            columns,
            name_width: self.name_width(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionIdGenerator;

    fn model_with(names: &[&str], described: bool, width: usize, height: usize) -> CompletionModel {
        let ids = SessionIdGenerator::new();
        let mut model = CompletionModel::new(ids.next_id(), ids.next_id());
        model.resize(width, height);
        let request = model.begin("");
        let result = CompletionResult {
            directive: Directive::empty(),
            options: names
                .iter()
                .map(|name| CompletionOption {
                    name: (*name).to_string(),
                    description: described.then(|| format!("about {name}")),
                })
                .collect(),
        };
        assert_eq!(model.apply(request.seq, result), Some(names.len()));
        model
    }

    #[test]
    fn stale_results_are_ignored() {
        let ids = SessionIdGenerator::new();
        let mut model = CompletionModel::new(ids.next_id(), ids.next_id());
        let first = model.begin("a");
        let second = model.begin("ab");
        assert_eq!(model.apply(first.seq, CompletionResult::default()), None);
        assert_eq!(model.apply(second.seq, CompletionResult::default()), Some(0));
        model.clear();
        assert_eq!(model.apply(second.seq, CompletionResult::default()), None);
    }

    #[test]
    fn described_options_use_one_annotated_column() {
        let model = model_with(&["add", "commit", "status"], true, 80, 24);
        let layout = model.layout().unwrap();
        assert!(layout.annotated);
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.lines()[1], "commit - about commit");
    }

    #[test]
    fn undescribed_options_use_a_grid() {
        // "aaaa" is 4 wide, so 20 / 7 = 2 columns
        let model = model_with(&["aaaa", "bb", "cc", "dd", "ee"], false, 20, 24);
        let layout = model.layout().unwrap();
        assert!(!layout.annotated);
        assert_eq!(layout.columns, 2);
        assert_eq!(layout.lines(), ["aaaa   bb", "cc     dd", "ee"]);
    }

    #[test]
    fn result_moves_wrap_but_grid_moves_do_not() {
        let mut model = model_with(&["a", "b", "c", "d", "e"], false, 8, 24);
        assert_eq!(model.columns(), 2);

        model.previous_result();
        assert_eq!(model.selected(), 4);
        model.next_result();
        assert_eq!(model.selected(), 0);

        model.previous_row();
        assert_eq!(model.selected(), 0);
        model.next_row();
        assert_eq!(model.selected(), 2);
        model.next_column();
        assert_eq!(model.selected(), 3);
        model.next_column();
        assert_eq!(model.selected(), 3);
        model.next_row();
        assert_eq!(model.selected(), 3);
        assert_eq!(model.accept(), Some("d"));
    }

    #[test]
    fn window_follows_the_selection() {
        let names: Vec<String> = (0..10).map(|i| format!("opt{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut model = model_with(&names, false, 4, 5);
        assert_eq!(model.columns(), 1);
        for _ in 0..6 {
            model.next_result();
        }

        let layout = model.layout().unwrap();
        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.rows[2][0].name, "opt6");
        assert!(layout.rows[2][0].selected);
    }
}
