//! # CLI - interactive shell over the entity table engine
//!
//! A REPL-style command-line interface over a single `people` table. Reads
//! commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted
//! testing (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! SAVE id name age   Insert or update a person by id
//! GET id             Load a person by id (prints row or "(nil)")
//! DEL id             Delete a person by id
//! LIST               List every row in primary-key order
//! FIND name          Exact, case-insensitive lookup by name
//! RANGE lo hi        Rows whose age falls in [lo, hi] inclusive
//! COMPACT            Repack the data stream, reclaiming free-list gaps
//! PURGE              Delete every row, truncating both streams to zero
//! STATS              Print row count and table name
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! DB_DIR   Schema directory for the instance   (default: "data/db")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! entity-store started (dir=data/db, rows=0)
//! > SAVE 1 Alice 30
//! OK Created
//! > GET 1
//! 1	Alice	30
//! > FIND alice
//! 1	Alice	30
//! (1 rows)
//! > EXIT
//! bye
//! ```
mod person;

use anyhow::{anyhow, Result};
use config::{IndexValue, PrimaryKey};
use engine::{Instance, Table};
use person::{schema, Person};
use std::io::{self, BufRead, Write};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_person(mut parts: std::str::SplitWhitespace<'_>) -> Result<Person> {
    let id: i32 = parts.next().ok_or_else(|| anyhow!("usage: SAVE id name age"))?.parse()?;
    let name = parts.next().ok_or_else(|| anyhow!("usage: SAVE id name age"))?.to_string();
    let age: i32 = parts.next().ok_or_else(|| anyhow!("usage: SAVE id name age"))?.parse()?;
    Ok(Person { id, name, age })
}

fn print_rows(rows: &[Person]) {
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    for row in rows {
        println!("{row}");
    }
    println!("({} rows)", rows.len());
}

fn main() -> Result<()> {
    // Configuration via environment variables with sensible defaults.
    //
    //  DB_DIR - schema directory for the instance (default: "data/db")
    let db_dir = env_or("DB_DIR", "data/db");

    let instance = Instance::open(&db_dir)?;
    let table: Table<Person> = instance.open_table(schema())?;

    println!("entity-store started (dir={}, rows={})", db_dir, table.len());
    println!("Commands: SAVE id name age | GET id | DEL id | LIST | FIND name | RANGE lo hi");
    println!("          COMPACT | PURGE | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SAVE" => match parse_person(parts) {
                    Ok(person) => match table.save(&person) {
                        Ok(outcome) => println!("OK {outcome:?}"),
                        Err(e) => println!("ERR save failed: {e}"),
                    },
                    Err(e) => println!("ERR {e}"),
                },
                "GET" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                    Some(id) => match table.load_by_key(&PrimaryKey::I32(id)) {
                        Ok(Some(person)) => println!("{person}"),
                        Ok(None) => println!("(nil)"),
                        Err(e) => println!("ERR read failed: {e}"),
                    },
                    None => println!("ERR usage: GET id"),
                },
                "DEL" => match parts.next().and_then(|s| s.parse::<i32>().ok()) {
                    Some(id) => match table.delete_by_key(&PrimaryKey::I32(id)) {
                        Ok(true) => println!("OK"),
                        Ok(false) => println!("(nil)"),
                        Err(e) => println!("ERR del failed: {e}"),
                    },
                    None => println!("ERR usage: DEL id"),
                },
                "LIST" => match table.load_all() {
                    Ok(rows) => print_rows(&rows),
                    Err(e) => println!("ERR list failed: {e}"),
                },
                "FIND" => match parts.next() {
                    Some(name) => match table.query("name").key(IndexValue::Str(name.to_string())).to_list() {
                        Ok(rows) => print_rows(&rows),
                        Err(e) => println!("ERR find failed: {e}"),
                    },
                    None => println!("ERR usage: FIND name"),
                },
                "RANGE" => {
                    let lo = parts.next().and_then(|s| s.parse::<i32>().ok());
                    let hi = parts.next().and_then(|s| s.parse::<i32>().ok());
                    match (lo, hi) {
                        (Some(lo), Some(hi)) => {
                            match table
                                .query("age")
                                .greater_than(IndexValue::I32(lo), true)
                                .less_than(IndexValue::I32(hi), true)
                                .to_list()
                            {
                                Ok(rows) => print_rows(&rows),
                                Err(e) => println!("ERR range failed: {e}"),
                            }
                        }
                        _ => println!("ERR usage: RANGE lo hi"),
                    }
                }
                "COMPACT" => match table.compact() {
                    Ok(stats) => println!("OK (rows_moved={}, bytes_reclaimed={})", stats.rows_moved, stats.bytes_reclaimed),
                    Err(e) => println!("ERR compact failed: {e}"),
                },
                "PURGE" => match table.purge() {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR purge failed: {e}"),
                },
                "STATS" => {
                    println!("table={:?} rows={}", table.name(), table.len());
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {other}");
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
