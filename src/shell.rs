use std::future::Future;
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use crate::search::{Gated, LatestWins, SearchFacade, SearchOptions};
use crate::view::{Notice, Renderer, SearchView};

const PROMPT: &str = "search> ";

fn is_exit(line: &str) -> bool {
    matches!(line, ":q" | "quit" | "exit")
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

/// Interactive search loop over stdin. Ctrl-C quits like `:q`.
///
/// Each line starts a search immediately; typing the next query before the
/// previous one returns supersedes it, so only the newest answer is shown.
pub async fn run(search: Arc<SearchFacade>, renderer: Renderer, options: SearchOptions) -> Result<()> {
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::debug!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_with(
        search,
        renderer,
        options,
        BufReader::new(tokio::io::stdin()),
        interrupted,
    )
    .await
}

/// The loop behind [`run`], reading from `input` until end of input, an exit
/// word, or `interrupt` resolving.
pub async fn run_with<R, I>(
    search: Arc<SearchFacade>,
    renderer: Renderer,
    options: SearchOptions,
    input: R,
    interrupt: I,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    let gate = Arc::new(LatestWins::new());
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();
    tokio::pin!(interrupt);

    println!("Type a query and press Enter. `:q` to quit.");
    prompt();
    let mut quit = false;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupt => {
                quit = true;
                break;
            }
        };
        let Some(line) = line else { break };
        let query = line.trim().to_string();
        if is_exit(&query) {
            quit = true;
            break;
        }
        if query.is_empty() {
            eprintln!("{}", renderer.notice(Notice::Warning, "Please enter a search query"));
            prompt();
            continue;
        }

        let (search, gate, renderer) = (search.clone(), gate.clone(), renderer.clone());
        tasks.spawn(async move {
            match search.search_latest(&gate, &query, options).await {
                Gated::Completed(Ok(response)) => {
                    println!("\n{}", renderer.search(&SearchView::from_response(&response)));
                }
                Gated::Completed(Err(e)) => {
                    eprintln!("\n{}", renderer.notice(Notice::Error, &e.to_string()));
                }
                Gated::Superseded => {
                    tracing::debug!(%query, "Search superseded by a newer query");
                }
            }
            prompt();
        });

        // Reap finished searches so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}
    }

    // End of input lets the last search finish; an explicit quit does not.
    if quit {
        gate.cancel();
    }
    while tasks.join_next().await.is_some() {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::api::ApiClient;
    use crate::prefs::Preferences;

    fn facade() -> Arc<SearchFacade> {
        let api = Arc::new(ApiClient::new("http://127.0.0.1:9", None).unwrap());
        Arc::new(SearchFacade::new(api, 5, true))
    }

    #[test]
    fn exit_words() {
        assert!(is_exit(":q"));
        assert!(is_exit("exit"));
        assert!(!is_exit("exit strategy"));
    }

    #[tokio::test]
    async fn interrupt_ends_loop_while_input_is_open() {
        // The writer half stays alive, so input never reaches EOF.
        let (_writer, reader) = tokio::io::duplex(64);
        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run_with(
                facade(),
                Renderer::new(Preferences::default()),
                SearchOptions::default(),
                BufReader::new(reader),
                interrupt,
            ),
        )
        .await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn exit_word_ends_loop() {
        let input: &[u8] = b"   \n:q\nnever searched\n";
        run_with(
            facade(),
            Renderer::new(Preferences::default()),
            SearchOptions::default(),
            input,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();
    }
}
