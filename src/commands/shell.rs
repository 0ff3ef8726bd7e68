use crate::commands::render;
use crate::error::AppError;
use crate::models::notification_types::Severity;
use crate::services::workbench::Workbench;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  add <path>...    select images (directories add the files inside them)
  remove <index>   drop one image from the selection
  clear            drop every image and hide results
  list             show the current selection
  predict          submit the selection (runs in the background)
  results          show the last results
  detail <index>   show class probabilities for one result
  health           check the service and its model
  info             show model information
  help             show this text
  quit             leave";

/// One line of user input, mapped onto a single workbench operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(Vec<PathBuf>),
    Remove(usize),
    Clear,
    List,
    Predict,
    Results,
    Detail(usize),
    Health,
    Info,
    Help,
    Quit,
}

impl ShellCommand {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => {
                if args.is_empty() {
                    return Err("usage: add <path>...".to_string());
                }
                ShellCommand::Add(args.iter().map(PathBuf::from).collect())
            }
            "remove" | "rm" => ShellCommand::Remove(parse_index("remove", &args)?),
            "detail" => ShellCommand::Detail(parse_index("detail", &args)?),
            "clear" => ShellCommand::Clear,
            "list" | "ls" => ShellCommand::List,
            "predict" => ShellCommand::Predict,
            "results" => ShellCommand::Results,
            "health" => ShellCommand::Health,
            "info" => ShellCommand::Info,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

fn parse_index(verb: &str, args: &[&str]) -> Result<usize, String> {
    match args {
        [index] => index
            .parse()
            .map_err(|_| format!("'{}' is not an index", index)),
        _ => Err(format!("usage: {} <index>", verb)),
    }
}

pub async fn run_shell(workbench: Workbench, initial: Vec<PathBuf>) -> Result<(), AppError> {
    let renderer = render::spawn_renderer(workbench.subscribe());

    workbench.check_health().await;
    if !initial.is_empty() {
        add(&workbench, &initial).await;
    }
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ShellCommand::parse(&line) {
            Ok(Some(command)) => {
                if !dispatch(&workbench, command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => println!("{}", message),
        }
    }

    renderer.abort();
    Ok(())
}

/// Run one command. Returns false when the shell should exit.
pub async fn dispatch(workbench: &Workbench, command: ShellCommand) -> bool {
    debug!(?command, "Shell command");

    match command {
        ShellCommand::Add(paths) => add(workbench, &paths).await,
        ShellCommand::Remove(index) => {
            let count = workbench.selection_len();
            if index >= count {
                println!("No image at index {} ({} selected)", index, count);
            } else {
                workbench.remove_at(index).await;
            }
        }
        ShellCommand::Clear => workbench.clear(),
        ShellCommand::List => println!("{}", render::format_previews(&workbench.previews())),
        ShellCommand::Predict => {
            if !workbench.control().enabled {
                println!("A prediction is already running.");
            } else {
                let background = workbench.clone();
                tokio::spawn(async move {
                    // Failures are reported through notifications.
                    let _ = background.submit().await;
                });
            }
        }
        ShellCommand::Results => println!("{}", render::format_results(&workbench.results())),
        ShellCommand::Detail(index) => match workbench.detail(index) {
            Some(view) => println!("{}", render::format_detail(&view)),
            None => println!("No result card at index {}", index),
        },
        ShellCommand::Health => {
            workbench.check_health().await;
        }
        ShellCommand::Info => match workbench.model_info().await {
            Ok(info) => println!("{}", render::format_model_info(&info)),
            Err(e) => workbench.notifier().notify(e.message(), Severity::Error),
        },
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => return false,
    }
    true
}

async fn add(workbench: &Workbench, paths: &[PathBuf]) {
    if let Err(e) = workbench.add_paths(paths).await {
        workbench.notifier().notify(e.message(), Severity::Error);
    }
}
