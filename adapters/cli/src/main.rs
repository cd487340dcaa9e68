#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Bubble Burst in the terminal.
//!
//! This binary is the engine's visual-effect consumer: it reacts to each
//! `TasksAvailable` notification by draining the pending queue, activating
//! every task, printing the transition that a graphical front end would
//! animate, and completing the task to advance the game.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use bubble_burst_core::{BubbleId, BubbleKind, GridCoord, MatrixEvent, TaskKind};
use bubble_burst_matrix::{query, BubbleMatrix};
use clap::Parser;

/// Match-and-clear bubble puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(name = "bubble-burst")]
struct Options {
    /// Number of bubble rows.
    #[arg(long, default_value_t = 8)]
    rows: u32,

    /// Number of bubble columns.
    #[arg(long, default_value_t = 10)]
    columns: u32,

    /// Population seed; drawn from system entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Entry point for the Bubble Burst command-line interface.
fn main() -> Result<()> {
    let options = Options::parse();
    let seed = options.seed.unwrap_or_else(rand::random);

    let mut matrix = BubbleMatrix::with_seed(seed);
    matrix
        .set_dimensions(options.rows, options.columns)
        .context("configuring matrix dimensions")?;
    matrix.start_new_game();

    println!("bubble-burst (seed {seed:#018x})");
    println!("commands: burst R C | group R C | undo | new | quit");
    render(&matrix);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().context("flushing prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("reading command")?;
        if read == 0 {
            break;
        }

        match run_command(line.trim(), &mut matrix)? {
            Flow::Continue => {}
            Flow::Quit => break,
        }
    }

    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

fn run_command(line: &str, matrix: &mut BubbleMatrix) -> Result<Flow> {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("burst") => {
            if let Some(origin) = parse_origin(words, matrix) {
                let mut events = Vec::new();
                matrix
                    .burst_bubble_group(Some(origin), &mut events)
                    .context("bursting bubble group")?;
                pump(matrix, events);
                render(matrix);
            }
        }
        Some("group") => {
            if let Some(origin) = parse_origin(words, matrix) {
                let group = query::group_at(matrix, origin);
                println!("group of {} bubble(s)", group.len());
            }
        }
        Some("undo") => {
            let mut events = Vec::new();
            matrix.undo(&mut events).context("undoing burst")?;
            if events.is_empty() {
                println!("nothing to undo");
            } else {
                pump(matrix, events);
                render(matrix);
            }
        }
        Some("new") => {
            matrix.start_new_game();
            render(matrix);
        }
        Some("quit") => return Ok(Flow::Quit),
        Some(other) => println!("unknown command: {other}"),
        None => {}
    }
    Ok(Flow::Continue)
}

fn parse_origin<'a>(
    mut words: impl Iterator<Item = &'a str>,
    matrix: &BubbleMatrix,
) -> Option<BubbleId> {
    let row: u32 = words.next()?.parse().ok()?;
    let column: u32 = words.next()?.parse().ok()?;
    let origin = query::bubble_at(matrix, GridCoord::new(row, column));
    if origin.is_none() {
        println!("no bubble at ({row}, {column})");
    }
    origin
}

/// Drains every published batch, driving each task through the pull
/// protocol: activate, present, complete.
fn pump(matrix: &mut BubbleMatrix, events: Vec<MatrixEvent>) {
    let mut pending = events;
    while !pending.is_empty() {
        let batch = std::mem::take(&mut pending);
        for event in batch {
            match event {
                MatrixEvent::TasksAvailable => {
                    while let Some(mut task) = matrix.next_pending_task() {
                        let bubbles = matrix.activate_task(&mut task);
                        present(task.kind(), task.is_undo(), bubbles.len());
                        matrix.complete_task(task, &mut pending);
                    }
                }
                MatrixEvent::GameEnded => {
                    let remaining = query::remaining_bubbles(matrix);
                    if remaining == 0 {
                        println!("congratulations, the board is clear!");
                    } else {
                        println!("game over: {remaining} bubble(s) left");
                    }
                    println!(
                        "most bubbles popped at once: {}",
                        query::most_bubbles_popped_at_once(matrix)
                    );
                }
            }
        }
    }
}

fn present(kind: TaskKind, is_undo: bool, count: usize) {
    if count == 0 {
        return;
    }
    let line = match (kind, is_undo) {
        (TaskKind::Burst, false) => format!("{count} bubble(s) burst"),
        (TaskKind::MoveDown, false) => format!("{count} bubble(s) fall"),
        (TaskKind::MoveRight, false) => format!("{count} bubble(s) slide right"),
        (TaskKind::Burst, true) => format!("{count} bubble(s) reappear"),
        (TaskKind::MoveDown, true) => format!("{count} bubble(s) rise"),
        (TaskKind::MoveRight, true) => format!("{count} bubble(s) slide left"),
    };
    println!("  {line}");
}

fn render(matrix: &BubbleMatrix) {
    let rows = query::row_count(matrix) as usize;
    let columns = query::column_count(matrix) as usize;

    let mut cells = vec![vec!['.'; columns]; rows];
    for snapshot in query::bubble_view(matrix).iter() {
        let row = snapshot.location.row() as usize;
        let column = snapshot.location.column() as usize;
        cells[row][column] = kind_glyph(snapshot.kind);
    }

    let mut header = String::from("    ");
    for column in 0..columns {
        header.push_str(&format!(" {}", column % 10));
    }
    println!("{header}");

    for (row, glyphs) in cells.iter().enumerate() {
        let mut line = format!("{row:>3} ");
        for &glyph in glyphs {
            line.push(' ');
            line.push(glyph);
        }
        println!("{line}");
    }

    println!(
        "{} bubble(s) left | undo {}",
        query::remaining_bubbles(matrix),
        if query::can_undo(matrix) {
            "available"
        } else {
            "unavailable"
        }
    );
}

fn kind_glyph(kind: BubbleKind) -> char {
    match kind {
        BubbleKind::Azure => 'a',
        BubbleKind::Crimson => 'c',
        BubbleKind::Emerald => 'e',
        BubbleKind::Amber => 'm',
        BubbleKind::Violet => 'v',
    }
}
