//! Drag blocks between markdown outlines from the command line.
//!
//! Usage:
//!   # Move line 2 of today.md below line 5 as a sibling
//!   outline-dnd drop --notes ~/notes --source today.md --line 2 --target-line 5 --mode parent
//!
//!   # Embed a block from one file into another
//!   outline-dnd drop --notes ~/notes --source a.md --line 3 --target b.md --target-line 1
//!
//!   # Change what a shift-drop does
//!   outline-dnd settings set shift embed

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use outline_dnd_config::{DragSettings, Modifiers, OperationKind, SettingSlot};
use outline_dnd_engine::{
    DragController, DropOutcome, HighlightMode, Workspace, drag_handle_lines, io,
    parsing::format_tree,
};
use relative_path::RelativePathBuf;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "outline-dnd")]
#[command(about = "Move, copy or embed outline blocks between markdown files")]
struct Args {
    /// Settings file (defaults to ~/.config/outline-dnd/settings.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drag one block and drop it somewhere else
    Drop(DropArgs),
    /// List the lines that carry a drag handle
    Handles {
        #[arg(long)]
        notes: PathBuf,
        file: RelativePathBuf,
    },
    /// Print the structural tree of a file
    Tree {
        #[arg(long)]
        notes: PathBuf,
        file: RelativePathBuf,
    },
    /// Show or change the drop settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Args, Debug)]
struct DropArgs {
    /// Notes directory the file paths are relative to
    #[arg(long)]
    notes: PathBuf,

    /// File the block is dragged from
    #[arg(long)]
    source: RelativePathBuf,

    /// Line of the dragged block (1-based)
    #[arg(long)]
    line: usize,

    /// File the block is dropped into (defaults to the source file)
    #[arg(long)]
    target: Option<RelativePathBuf>,

    /// Line the block is dropped onto (1-based)
    #[arg(long)]
    target_line: usize,

    #[arg(long, value_enum, default_value_t = ModeArg::Current)]
    mode: ModeArg,

    #[arg(long)]
    shift: bool,

    #[arg(long)]
    alt: bool,

    #[arg(long)]
    ctrl: bool,

    /// Drop into a second pane even when source and target are the same file
    #[arg(long)]
    split: bool,

    /// Print the resulting files instead of writing them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(value_enum)]
        slot: SlotArg,
        #[arg(value_parser = parse_operation)]
        operation: OperationKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Insert as the first child of the hovered block
    Current,
    /// Insert as the next sibling of the hovered block
    Parent,
}

impl From<ModeArg> for HighlightMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Current => HighlightMode::Current,
            ModeArg::Parent => HighlightMode::Parent,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[value(rename_all = "snake_case")]
enum SlotArg {
    SimpleSamePane,
    SimpleDifferentPanes,
    Shift,
    Alt,
    Ctrl,
}

impl From<SlotArg> for SettingSlot {
    fn from(slot: SlotArg) -> Self {
        match slot {
            SlotArg::SimpleSamePane => SettingSlot::SimpleSamePane,
            SlotArg::SimpleDifferentPanes => SettingSlot::SimpleDifferentPanes,
            SlotArg::Shift => SettingSlot::Shift,
            SlotArg::Alt => SettingSlot::Alt,
            SlotArg::Ctrl => SettingSlot::Ctrl,
        }
    }
}

fn parse_operation(value: &str) -> Result<OperationKind, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let settings_path = args.settings.unwrap_or_else(DragSettings::config_path);
    log::debug!("Settings path: {}", settings_path.display());

    match args.command {
        Command::Drop(drop_args) => {
            let settings = load_settings(&settings_path)?;
            run_drop(settings, drop_args)
        }
        Command::Handles { notes, file } => {
            let document = io::read_document(&file, &notes)
                .with_context(|| format!("Failed to read {file}"))?;
            let tree = document.parse();
            for line in drag_handle_lines(&tree) {
                println!("{line}\t{}", tree.line_text(line)?);
            }
            Ok(())
        }
        Command::Tree { notes, file } => {
            let document = io::read_document(&file, &notes)
                .with_context(|| format!("Failed to read {file}"))?;
            print!("{}", format_tree(&document.parse()));
            Ok(())
        }
        Command::Settings { action } => {
            let mut settings = load_settings(&settings_path)?;
            if let SettingsAction::Set { slot, operation } = action {
                settings.set(slot.into(), operation);
                settings
                    .save_to_path(&settings_path)
                    .with_context(|| format!("Failed to save {}", settings_path.display()))?;
                log::info!("Saved settings to {}", settings_path.display());
            }
            print_settings(&settings);
            Ok(())
        }
    }
}

fn load_settings(path: &Path) -> Result<DragSettings> {
    Ok(DragSettings::load_from_path(path)?.unwrap_or_default())
}

fn print_settings(settings: &DragSettings) {
    println!("simple_same_pane       = {}", settings.simple_same_pane);
    println!("simple_different_panes = {}", settings.simple_different_panes);
    println!("shift                  = {}", settings.shift);
    println!("alt                    = {}", settings.alt);
    match settings.ctrl {
        Some(kind) => println!("ctrl                   = {kind}"),
        None => println!("ctrl                   = (unset)"),
    }
}

fn run_drop(settings: DragSettings, args: DropArgs) -> Result<()> {
    io::validate_notes_dir(&args.notes)
        .with_context(|| format!("Cannot use notes directory {}", args.notes.display()))?;

    let mut workspace = Workspace::new();
    let source = io::read_document(&args.source, &args.notes)
        .with_context(|| format!("Failed to read {}", args.source))?;
    let source_ref = workspace.insert_document(source);
    let source_pane = workspace.open(&source_ref)?;

    let target_path = args.target.as_ref().unwrap_or(&args.source);
    let target_pane = if *target_path == args.source {
        if args.split {
            workspace.open(&source_ref)?
        } else {
            source_pane
        }
    } else {
        let target = io::read_document(target_path, &args.notes)
            .with_context(|| format!("Failed to read {target_path}"))?;
        let target_ref = workspace.insert_document(target);
        workspace.open(&target_ref)?
    };

    let mut controller = DragController::new(settings);
    if !controller.drag_start(&workspace, source_pane, args.line)? {
        bail!("Line {} of {} has no draggable block", args.line, args.source);
    }

    let point = workspace.point_at_line(target_pane, args.target_line, args.mode.into())?;
    if let Some(highlight) = controller.drag_over(&workspace, target_pane, point, Instant::now())? {
        log::debug!("Dropping onto lines {:?}", highlight.hovered.lines());
    }

    let modifiers = Modifiers {
        shift: args.shift,
        alt: args.alt,
        ctrl: args.ctrl,
    };
    match controller.drop(&mut workspace, target_pane, point, modifiers)? {
        DropOutcome::Applied { kind, .. } => println!("Applied {kind}"),
        DropOutcome::NoOp => {
            println!("Nothing to do");
            return Ok(());
        }
        DropOutcome::Aborted => {
            println!("Drop target is outside the document");
            return Ok(());
        }
    }

    let changed: Vec<_> = workspace.documents().filter(|doc| doc.version() > 0).collect();
    for document in changed {
        if args.dry_run {
            println!("--- {}", document.reference());
            print!("{}", document.text());
        } else {
            io::write_document(document, &args.notes)
                .with_context(|| format!("Failed to write {}", document.reference()))?;
            log::info!("Updated {}", document.reference());
        }
    }

    Ok(())
}
