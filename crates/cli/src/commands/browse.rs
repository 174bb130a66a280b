//! Interactive product list.
//!
//! Reads one command per line from stdin. Search input is debounced: lines
//! typed within the debounce window replace each other and only the last one
//! is sent, together with any sort change made meanwhile.

use shopdesk_admin::config::AdminConfig;
use shopdesk_admin::services::SyncController;
use shopdesk_admin::shopify::AdminClient;
use shopdesk_core::{ProductGid, SortConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use super::{CliError, emit, render};

const HELP: &str = "\
/<term>        search titles (\"/\" clears)
sort <option>  TITLE-ASC, TITLE-DESC, CREATED_AT-ASC, CREATED_AT-DESC
n | p          next / previous page
open <id>      show a product
q              quit";

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Sort(SortConfig),
    Next,
    Previous,
    Open(ProductGid),
    Help,
    Quit,
    Invalid(String),
}

/// Interpret one input line.
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return Command::Search(term.trim().to_string());
    }
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match verb {
        "q" | "quit" | "exit" => Command::Quit,
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "?" | "h" | "help" => Command::Help,
        "sort" => SortConfig::parse_option(rest)
            .map_or_else(|e| Command::Invalid(e.to_string()), Command::Sort),
        "open" => ProductGid::parse(rest)
            .map_or_else(|e| Command::Invalid(e.to_string()), Command::Open),
        _ => Command::Invalid(format!("unknown command: {line} (? for help)")),
    }
}

/// Run the browse loop until `q` or end of input.
///
/// # Errors
///
/// Returns `CliError::Io` if stdin cannot be read.
pub async fn run(config: &AdminConfig) -> Result<(), CliError> {
    let client = AdminClient::from_config(&config.shopify);
    let mut controller = SyncController::new(client, config.page_size, config.debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    controller.load_initial().await;
    emit(&render::browse(&controller));
    emit("? for help");

    loop {
        let line = match controller.search().deadline() {
            Some(deadline) => tokio::select! {
                line = lines.next_line() => line?,
                () = tokio::time::sleep_until(deadline) => {
                    if controller.sync(Instant::now()).await {
                        emit(&render::browse(&controller));
                    }
                    continue;
                }
            },
            None => lines.next_line().await?,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Command::Quit => break,
            Command::Search(term) => {
                controller.type_search(&term, Instant::now());
                continue;
            }
            Command::Sort(sort) => {
                controller.select_sort(sort);
                controller.sync(Instant::now()).await;
            }
            Command::Next => {
                if !controller.load_more().await {
                    emit("No next page");
                }
            }
            Command::Previous => {
                if !controller.load_previous().await {
                    emit("No previous page");
                }
            }
            Command::Open(id) => {
                match controller.open_product(id).await {
                    Ok(snapshot) => emit(&render::product(snapshot)),
                    Err(e) => emit(&format!("error: {e}")),
                }
                continue;
            }
            Command::Help => {
                emit(HELP);
                continue;
            }
            Command::Invalid(message) => {
                emit(&message);
                continue;
            }
        }
        emit(&render::browse(&controller));
    }

    // Input closed while a search was still settling.
    if controller.settle().await {
        emit(&render::browse(&controller));
    }
    Ok(())
}
