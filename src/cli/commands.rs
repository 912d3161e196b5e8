use std::fmt::Write as _;
use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::{App, AppState};
use crate::config::AppConfig;
use crate::gateway::NoteGateway;
use crate::notes::editor::NoteEdit;
use crate::notes::format::{DateStyle, TimestampFormatter};
use crate::notes::sort::SortOrder;
use crate::notes::store::{DeleteOutcome, NoteStore, StoreError};
use crate::notes::{Note, NoteDraft, NoteId};
use crate::sources::{ContentSources, SourceKind};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Display order (date-descending, date-ascending, title-ascending, title-descending)
    #[arg(long, default_value_t = SortOrder::DateDescending)]
    pub sort: SortOrder,
    /// Timestamp style (full, abbr, year)
    #[arg(long, default_value_t = DateStyle::Abbr)]
    pub style: DateStyle,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note
    #[arg()]
    pub title: String,
    /// Provide the note content inline. If omitted, reads from piped stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub id: u64,
    /// Replacement title
    #[arg(long)]
    pub title: Option<String>,
    /// Replacement content
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: u64,
    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TodayArgs {
    /// Date style (full, abbr, year)
    #[arg(long, default_value_t = DateStyle::Full)]
    pub style: DateStyle,
}

pub fn run_tui(
    config: &AppConfig,
    gateway: Arc<dyn NoteGateway>,
    sources: ContentSources,
    formatter: TimestampFormatter,
) -> Result<()> {
    let state = AppState::new(formatter, config.backend.persist_edits);
    let mut app = App::new(state, gateway, sources)?;
    app.run()
}

pub fn list_notes(
    gateway: &dyn NoteGateway,
    formatter: &TimestampFormatter,
    args: &ListArgs,
) -> Result<()> {
    let store = load_store(gateway)?;
    print!("{}", render_list(&store, formatter, args));
    Ok(())
}

fn load_store(gateway: &dyn NoteGateway) -> Result<NoteStore> {
    let mut store = NoteStore::new();
    store
        .hydrate(gateway)
        .with_context(|| format!("fetching notes from {} backend", gateway.name()))?;
    Ok(store)
}

fn render_list(store: &NoteStore, formatter: &TimestampFormatter, args: &ListArgs) -> String {
    let notes = crate::notes::sort::sorted(store.notes(), args.sort);
    if notes.is_empty() {
        return "No notes yet.\n".to_string();
    }
    let mut out = String::new();
    for note in &notes {
        write_note(&mut out, note, formatter, args.style);
        out.push('\n');
    }
    out
}

fn write_note(out: &mut String, note: &Note, formatter: &TimestampFormatter, style: DateStyle) {
    let _ = writeln!(out, "#{}  {}", note.id, note.title);
    let _ = writeln!(out, "    {}", formatter.format_instant(note.time_stamp, style));
    for line in note.content.lines() {
        let _ = writeln!(out, "    {line}");
    }
}

pub fn new_note(gateway: &dyn NoteGateway, args: NewArgs) -> Result<()> {
    let content = match args.content {
        Some(content) => content,
        None => read_stdin()?.unwrap_or_default(),
    };
    let note = create_note(gateway, &NoteDraft::new(args.title, content))?;
    println!("Created note #{}", note.id);
    Ok(())
}

fn create_note(gateway: &dyn NoteGateway, draft: &NoteDraft) -> Result<Note> {
    let mut store = NoteStore::new();
    store
        .create(gateway, draft)
        .with_context(|| format!("creating note on {} backend", gateway.name()))
}

pub fn fetch_note(
    gateway: &dyn NoteGateway,
    sources: &ContentSources,
    kind: SourceKind,
) -> Result<()> {
    let note = fetch_and_create(gateway, sources, kind)?;
    println!("Created note #{}  {}", note.id, note.title);
    if !note.content.is_empty() {
        println!("    {}", note.content);
    }
    Ok(())
}

fn fetch_and_create(
    gateway: &dyn NoteGateway,
    sources: &ContentSources,
    kind: SourceKind,
) -> Result<Note> {
    let draft = sources.fetch(kind).context(kind.failure_alert())?;
    create_note(gateway, &draft)
}

pub fn edit_note(gateway: &dyn NoteGateway, args: EditArgs) -> Result<()> {
    let note = apply_edit(gateway, args)?;
    println!("Updated note #{}  {}", note.id, note.title);
    Ok(())
}

fn apply_edit(gateway: &dyn NoteGateway, args: EditArgs) -> Result<Note> {
    if args.title.is_none() && args.content.is_none() {
        bail!("nothing to change: pass --title and/or --content");
    }
    let id = NoteId(args.id);
    let mut store = load_store(gateway)?;
    let current = store
        .get(id)
        .cloned()
        .ok_or(StoreError::NotFound(id))
        .with_context(|| format!("editing note #{id}"))?;
    let edit = NoteEdit {
        note_id: id,
        title: args.title.unwrap_or(current.title),
        content: args.content.unwrap_or(current.content),
    };
    store
        .save_edit(gateway, &edit)
        .with_context(|| format!("saving note #{id}"))?;
    store
        .get(id)
        .cloned()
        .with_context(|| format!("note #{id} vanished after saving"))
}

pub fn delete_note(gateway: &dyn NoteGateway, args: &DeleteArgs) -> Result<()> {
    ensure_can_confirm(args.confirm.yes)?;
    let id = NoteId(args.id);
    let mut store = load_store(gateway)?;
    let outcome = store
        .delete_one(gateway, id, |prompt| {
            args.confirm.yes || confirm(&prompt.to_string())
        })
        .with_context(|| format!("deleting note #{id}"))?;
    report(outcome, &format!("Deleted note #{id}"));
    Ok(())
}

pub fn delete_all_notes(gateway: &dyn NoteGateway, args: &ConfirmArgs) -> Result<()> {
    ensure_can_confirm(args.yes)?;
    let mut store = load_store(gateway)?;
    let count = store.len();
    let outcome = store
        .delete_all(gateway, |prompt| args.yes || confirm(prompt))
        .context("deleting all notes")?;
    report(
        outcome,
        &format!("Deleted {count} note{}", if count == 1 { "" } else { "s" }),
    );
    Ok(())
}

fn report(outcome: DeleteOutcome, done: &str) {
    match outcome {
        DeleteOutcome::Deleted => println!("{done}"),
        DeleteOutcome::Cancelled => println!("Cancelled."),
    }
}

pub fn today(formatter: &TimestampFormatter, args: &TodayArgs) -> Result<()> {
    println!("{}", formatter.format_now(args.style));
    Ok(())
}

fn ensure_can_confirm(yes: bool) -> Result<()> {
    if !yes && !atty::is(atty::Stream::Stdin) {
        bail!("refusing to delete without --yes when stdin is not a terminal");
    }
    Ok(())
}

fn confirm(question: &str) -> bool {
    match prompt(&format!("{question} [y/N]")) {
        Ok(answer) => matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"),
        Err(err) => {
            tracing::warn!(%err, "could not read confirmation");
            false
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label} ")?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading note content from stdin")?;
    Ok(Some(buf))
}
