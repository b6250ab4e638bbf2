//! Paged selection over an in-memory result list.
//!
//! [`browse`] shows a list one page at a time, lets the operator move
//! between pages with `0` (next) and `-1` (previous), and returns the
//! absolute index of the row picked by its 1-based position on the page.

use crate::console::Console;
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::ops::Range;

/// Page bookkeeping for one browsing session.
///
/// The item count and page size are fixed when the session starts; only
/// the current page moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    current_page: usize,
    page_size: NonZeroUsize,
    total_items: usize,
}

impl PageState {
    pub fn new(total_items: usize, page_size: NonZeroUsize) -> PageState {
        PageState {
            current_page: 0,
            page_size,
            total_items,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size())
    }

    /// Item range `[start, end)` of the current page.
    pub fn bounds(&self) -> Range<usize> {
        self.page_bounds(self.current_page)
    }

    pub fn page_bounds(&self, page: usize) -> Range<usize> {
        let start = (page * self.page_size()).min(self.total_items);
        let end = (start + self.page_size()).min(self.total_items);
        start..end
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.total_pages()
    }

    /// Returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.is_last_page() {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// Returns false when already on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.is_first_page() {
            return false;
        }
        self.current_page -= 1;
        true
    }

    /// Maps a 1-based position on the current page to an absolute index.
    pub fn select(&self, position: i64) -> Option<usize> {
        let range = self.bounds();
        let offset = usize::try_from(position).ok()?.checked_sub(1)?;
        let index = range.start + offset;
        range.contains(&index).then_some(index)
    }
}

/// What an operator's number means on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Next,
    Previous,
    Select(usize),
    Invalid,
}

impl PageCommand {
    pub fn interpret(state: &PageState, choice: i64) -> PageCommand {
        match choice {
            0 => PageCommand::Next,
            -1 => PageCommand::Previous,
            other => state
                .select(other)
                .map_or(PageCommand::Invalid, PageCommand::Select),
        }
    }
}

/// Lets the operator pick one of `items`, a page at a time.
///
/// `display` renders an item given its 1-based position on the page.
/// Returns `Ok(None)` for an empty list (without prompting) or when the
/// input runs out before a selection is made.
pub fn browse<T, R, W, F>(
    console: &mut Console<R, W>,
    items: &[T],
    prompt: &str,
    mut display: F,
) -> io::Result<Option<usize>>
where
    R: BufRead,
    W: Write,
    F: FnMut(&mut W, &T, usize) -> io::Result<()>,
{
    if items.is_empty() {
        writeln!(console.out(), "No items found.")?;
        return Ok(None);
    }

    writeln!(
        console.out(),
        "There are {} rows in the result. How many do you want to see per page?",
        items.len()
    )?;
    let Some(page_size) = read_page_size(console)? else {
        return Ok(None);
    };

    let mut state = PageState::new(items.len(), page_size);
    tracing::debug!(
        items = items.len(),
        page_size = page_size.get(),
        pages = state.total_pages(),
        "browsing session started"
    );

    loop {
        let range = state.bounds();
        let out = console.out();
        write!(out, "\n{}", prompt)?;
        if state.is_first_page() {
            writeln!(out, "(enter 0 to go to the next page):")?;
        } else {
            writeln!(
                out,
                "(enter 0 to go to the next page or -1 to go to the previous page):"
            )?;
        }
        for (position, item) in items[range].iter().enumerate() {
            display(&mut *out, item, position + 1)?;
        }

        let Some(choice) = console.read_int("Invalid input. Please enter a valid number.")? else {
            return Ok(None);
        };

        match PageCommand::interpret(&state, choice) {
            PageCommand::Next => {
                if !state.next_page() {
                    writeln!(console.out(), "This is the last page.")?;
                }
            }
            PageCommand::Previous => {
                if !state.previous_page() {
                    writeln!(console.out(), "This is the first page.")?;
                }
            }
            PageCommand::Select(index) => return Ok(Some(index)),
            PageCommand::Invalid => writeln!(console.out(), "Invalid selection. Try again.")?,
        }
    }
}

fn read_page_size<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> io::Result<Option<NonZeroUsize>> {
    const RETRY: &str = "Invalid input. Please enter a valid positive number.";
    loop {
        let Some(value) = console.read_int(RETRY)? else {
            return Ok(None);
        };
        match usize::try_from(value).ok().and_then(NonZeroUsize::new) {
            Some(size) => return Ok(Some(size)),
            None => writeln!(console.out(), "{}", RETRY)?,
        }
    }
}
