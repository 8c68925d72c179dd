//! Notebook document collaborator
//!
//! Views are placed into the widget area of the cell that requested the
//! display. The widget core only talks to the [`Document`] trait; [`Notebook`]
//! is the in-memory implementation used by the runtime and tests.

use color_eyre::eyre::{bail, Result};

use crate::core::msg::{GroupKey, ViewId};

/// How many cells past the end an execution may create at once.
pub const MAX_NEW_CELLS: usize = 64;

/// Default container for standalone views of one grouping key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WidgetArea {
    views: Vec<ViewId>,
    shown: bool,
}

impl WidgetArea {
    pub fn append(&mut self, view: ViewId) {
        self.views.push(view);
    }

    /// Returns whether the view was present.
    pub fn remove(&mut self, view: ViewId) -> bool {
        let before = self.views.len();
        self.views.retain(|v| *v != view);
        before != self.views.len()
    }

    pub fn show(&mut self) {
        self.shown = true;
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn views(&self) -> &[ViewId] {
        &self.views
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub last_msg_id: Option<String>,
    pub widget_area: WidgetArea,
    pub outputs: Vec<String>,
}

impl Cell {
    pub fn append_output(&mut self, text: &str) {
        self.outputs.push(text.to_string());
    }
}

pub trait Document {
    fn get_cell(&self, index: usize) -> Option<&Cell>;
    fn get_cell_mut(&mut self, index: usize) -> Option<&mut Cell>;
    fn get_selected_cell(&self) -> Option<usize>;
    fn cell_count(&self) -> usize;

    /// Index of the cell whose last execution request had `msg_id`.
    fn cell_index_for_msg(&self, msg_id: &str) -> Option<usize>;

    /// Records that the cell at `index` was executed by request `msg_id`.
    fn cell_executed(&mut self, index: usize, msg_id: &str) -> Result<()>;

    /// The widget area for `key`, falling back to the detached area when the
    /// key names no existing cell.
    fn widget_area(&self, key: GroupKey) -> &WidgetArea;
    fn widget_area_mut(&mut self, key: GroupKey) -> &mut WidgetArea;
}

#[derive(Clone, Debug, Default)]
pub struct Notebook {
    cells: Vec<Cell>,
    selected: Option<usize>,
    detached: WidgetArea,
}

impl Notebook {
    pub fn with_cells(count: usize) -> Self {
        Self {
            cells: vec![Cell::default(); count],
            selected: if count > 0 { Some(0) } else { None },
            detached: WidgetArea::default(),
        }
    }

    pub fn select(&mut self, index: usize) {
        if index < self.cells.len() {
            self.selected = Some(index);
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl Document for Notebook {
    fn get_cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    fn get_cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    fn get_selected_cell(&self) -> Option<usize> {
        self.selected
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_index_for_msg(&self, msg_id: &str) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| cell.last_msg_id.as_deref() == Some(msg_id))
    }

    fn cell_executed(&mut self, index: usize, msg_id: &str) -> Result<()> {
        let count = self.cells.len();
        if index >= count.saturating_add(MAX_NEW_CELLS) {
            bail!("cell index {index} is out of range for {count} cells");
        }
        if index >= count {
            self.cells.resize_with(index + 1, Cell::default);
        }
        self.cells[index].last_msg_id = Some(msg_id.to_string());
        self.selected = Some(index);
        Ok(())
    }

    fn widget_area(&self, key: GroupKey) -> &WidgetArea {
        match key {
            GroupKey::Cell(index) if index < self.cells.len() => &self.cells[index].widget_area,
            _ => &self.detached,
        }
    }

    fn widget_area_mut(&mut self, key: GroupKey) -> &mut WidgetArea {
        match key {
            GroupKey::Cell(index) if index < self.cells.len() => {
                &mut self.cells[index].widget_area
            }
            _ => &mut self.detached,
        }
    }
}
