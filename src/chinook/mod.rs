//! Listings over the Chinook music sample database, plus ad-hoc queries
//! printed in the same `column = value` layout.

use crate::console::Console;
use crate::db::{Database, Row, Value, int_cell, text_cell};
use crate::pager::browse;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

const ARTISTS: &str = "SELECT artistid, name FROM artists;";

const ALBUMS_WITH_ARTISTS: &str = "select alb.albumid, alb.title, art.artistid \
     from albums alb join artists art on alb.artistid = art.artistid;";

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

pub fn artists(db: &Database) -> Result<Vec<Artist>> {
    let artists = db
        .collect(ARTISTS, [], |row| {
            Ok(Artist {
                id: int_cell(row, 0)?,
                name: text_cell(row, 1)?,
            })
        })
        .context("Failed to prepare statement")?;
    Ok(artists)
}

pub fn print_artists<W: Write>(out: &mut W, artists: &[Artist]) -> std::io::Result<()> {
    for artist in artists {
        writeln!(out, "ID: {}, Name: {}", artist.id, artist.name)?;
    }
    Ok(())
}

pub fn albums(db: &Database) -> Result<Vec<Row>> {
    run_query(db, ALBUMS_WITH_ARTISTS, &[])
}

/// Runs `sql` with `params` bound to its `?` placeholders in order.
pub fn run_query(db: &Database, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    let rows = db
        .rows(sql, rusqlite::params_from_iter(params.iter()))
        .context("Failed to run query")?;
    Ok(rows)
}

/// One `name = value` line per cell and a blank line after the row.
pub fn print_row<W: Write>(out: &mut W, row: &Row) -> std::io::Result<()> {
    for cell in &row.cells {
        writeln!(out, "{} = {}", cell.name, cell.value)?;
    }
    writeln!(out)
}

pub fn print_rows<W: Write>(out: &mut W, rows: &[Row]) -> std::io::Result<()> {
    for row in rows {
        print_row(out, row)?;
    }
    Ok(())
}

/// Lets the operator page through `rows` and prints the picked one in full.
pub fn browse_rows<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    rows: &[Row],
) -> Result<()> {
    let selected = browse(
        console,
        rows,
        "Choose the row you want to see ",
        |out, row, position| {
            let summary: Vec<String> =
                row.cells.iter().map(|cell| cell.value.to_string()).collect();
            writeln!(out, "{}. {}", position, summary.join(" | "))
        },
    )?;

    if let Some(index) = selected {
        writeln!(console.out())?;
        print_row(console.out(), &rows[index])?;
    }
    Ok(())
}
