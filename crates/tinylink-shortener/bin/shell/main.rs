mod cli;
mod shell;

use crate::cli::{LogFormatArg, CLI};
use crate::shell::Shell;
use anyhow::Context;
use clap::Parser;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Duration;
use tinylink_core::ConsoleNotifier;
use tinylink_generator::{Base62Generator, Generator};
use tinylink_shortener::{ServiceSettings, ShortenerService, Sweeper, SweeperSettings};
use tinylink_storage::{JsonFileStore, Persistence};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        data_dir = %config.data_dir.display(),
        base_url = %config.base_url,
        sweep_interval_secs = config.sweep_interval_secs,
        "starting tinylink shell"
    );

    let settings = ServiceSettings::builder()
        .max_code_attempts(config.max_code_attempts)
        .build();
    let store = JsonFileStore::new(config.data_dir.clone());
    let service = ShortenerService::open(Base62Generator::new(), store)
        .with_context(|| format!("failed to load state from {}", config.data_dir.display()))?
        .with_notifier(ConsoleNotifier::new(config.base_url.clone()))
        .with_settings(settings);
    let service = Arc::new(service);

    let sweeper = Sweeper::start(
        Arc::clone(&service),
        SweeperSettings::builder()
            .interval(Duration::from_secs(config.sweep_interval_secs))
            .build(),
    );

    run_session(
        service,
        sweeper,
        config.base_url,
        BufReader::new(std::io::stdin()),
        std::io::stdout(),
    )
    .await
}

/// Runs the shell to completion, then stops the sweeper and flushes state.
///
/// Shutdown happens even when the shell fails; its error is returned after.
async fn run_session<G, P, R, W>(
    service: Arc<ShortenerService<G, P>>,
    sweeper: Sweeper,
    base_url: String,
    input: R,
    output: W,
) -> anyhow::Result<()>
where
    G: Generator,
    P: Persistence,
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let shell_service = Arc::clone(&service);
    let outcome = tokio::task::spawn_blocking(move || {
        let mut shell = Shell::new(&*shell_service, base_url, output);
        shell.run(input)
    })
    .await;

    sweeper.shutdown().await;
    service.flush();
    info!("tinylink shell stopped");

    outcome
        .context("shell task panicked")?
        .context("failed to read commands")
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use tinylink_core::RecordingNotifier;
    use tinylink_generator::SequenceGenerator;
    use tinylink_storage::MemoryStore;

    /// Yields one command line, then fails.
    struct BrokenInput {
        script: io::Cursor<&'static [u8]>,
    }

    impl Read for BrokenInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.read(buf)? {
                0 => Err(io::Error::other("terminal went away")),
                n => Ok(n),
            }
        }
    }

    fn service() -> Arc<ShortenerService<SequenceGenerator, MemoryStore>> {
        Arc::new(
            ShortenerService::open(SequenceGenerator::new(), MemoryStore::new())
                .unwrap()
                .with_notifier(RecordingNotifier::new()),
        )
    }

    fn fast_sweeper(service: &Arc<ShortenerService<SequenceGenerator, MemoryStore>>) -> Sweeper {
        Sweeper::start(
            Arc::clone(service),
            SweeperSettings::builder()
                .interval(Duration::from_millis(10))
                .build(),
        )
    }

    #[tokio::test]
    async fn session_flushes_after_exit() {
        let service = service();
        let sweeper = fast_sweeper(&service);
        let input = io::Cursor::new(b"register alice pw1\nexit\n".to_vec());

        run_session(Arc::clone(&service), sweeper, "clck.ru".into(), input, io::sink())
            .await
            .unwrap();

        // one flush from register, one on the way out
        assert_eq!(service.persistence().save_count(), 2);
    }

    #[tokio::test]
    async fn session_shuts_down_when_input_fails() {
        let service = service();
        let sweeper = fast_sweeper(&service);
        let input = BufReader::new(BrokenInput {
            script: io::Cursor::new(&b"register alice pw1\n"[..]),
        });

        let err = run_session(Arc::clone(&service), sweeper, "clck.ru".into(), input, io::sink())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("terminal went away"));
        assert_eq!(service.persistence().save_count(), 2);
        assert_eq!(service.persistence().current().users.len(), 1);
    }
}
