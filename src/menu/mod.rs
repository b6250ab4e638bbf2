use crate::console::Console;
use crate::db::{Database, DbError};
use anyhow::Result;
use std::io::{BufRead, Write};

/// Value the operator enters to leave a menu.
pub const QUIT: i64 = -1;

pub type Action<R, W> = fn(&Database, &mut Console<R, W>) -> Result<()>;

pub struct MenuItem<R, W> {
    pub label: &'static str,
    pub action: Action<R, W>,
}

/// A numbered list of actions run in a read-eval loop until [`QUIT`].
pub struct Menu<R, W> {
    items: Vec<MenuItem<R, W>>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new() -> Self {
        Menu { items: Vec::new() }
    }

    pub fn item(mut self, label: &'static str, action: Action<R, W>) -> Self {
        self.items.push(MenuItem { label, action });
        self
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.label).collect()
    }

    /// Action for a 1-based menu number.
    pub fn lookup(&self, choice: i64) -> Option<&MenuItem<R, W>> {
        let index = usize::try_from(choice).ok()?.checked_sub(1)?;
        self.items.get(index)
    }

    /// Runs until the operator quits or input ends.
    ///
    /// A database failure inside an action is reported and the menu is
    /// shown again; any other error ends the loop.
    pub fn run(&self, db: &Database, console: &mut Console<R, W>) -> Result<()> {
        loop {
            self.render(console)?;
            let Some(choice) = console.read_int("Invalid input. Please enter a valid number.")?
            else {
                return Ok(());
            };
            if choice == QUIT {
                return Ok(());
            }

            let Some(item) = self.lookup(choice) else {
                writeln!(
                    console.out(),
                    "Invalid option. Please choose a valid menu option."
                )?;
                continue;
            };

            tracing::debug!(choice, label = item.label, "dispatching menu action");
            if let Err(err) = (item.action)(db, console) {
                if err.downcast_ref::<DbError>().is_none() {
                    return Err(err);
                }
                writeln!(console.out(), "{:#}", err)?;
            }
        }
    }

    fn render(&self, console: &mut Console<R, W>) -> Result<()> {
        let out = console.out();
        writeln!(
            out,
            "\n**********Please choose an option (enter {} to quit):**********",
            QUIT
        )?;
        for (number, item) in self.items.iter().enumerate() {
            writeln!(out, "{}. {}", number + 1, item.label)?;
        }
        console.prompt("Enter Choice: ")?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Default for Menu<R, W> {
    fn default() -> Self {
        Menu::new()
    }
}
