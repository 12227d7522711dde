//! Interactive dashboard session with periodic auto-refresh.

use crate::api::DashboardApi;
use crate::controller::{fetch_cycle, CycleOutcome, Dashboard};
use crate::events::{parse_command, Effect, HELP};
use crate::export::{export_spreadsheet, ExportError};
use crate::render::{ChartView, MapView};
use crate::status::describe_view;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{error, info};

type ExportResult = Result<PathBuf, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<A: ?Sized, M, C> {
    dashboard: Dashboard<A, M, C>,
    refresh_interval: Duration,
    done_tx: mpsc::UnboundedSender<CycleOutcome>,
    done_rx: mpsc::UnboundedReceiver<CycleOutcome>,
    export_tx: mpsc::UnboundedSender<ExportResult>,
    export_rx: mpsc::UnboundedReceiver<ExportResult>,
}

impl<A, M, C> Session<A, M, C>
where
    A: DashboardApi + ?Sized + 'static,
    M: MapView,
    C: ChartView,
{
    pub fn new(dashboard: Dashboard<A, M, C>, refresh_interval: Duration) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (export_tx, export_rx) = mpsc::unbounded_channel();
        Self {
            dashboard,
            refresh_interval,
            done_tx,
            done_rx,
            export_tx,
            export_rx,
        }
    }

    /// Run until `quit`, end of input or Ctrl+C.
    ///
    /// Network work never runs inside the loop itself, so a stalled request
    /// cannot hold back input handling or the next refresh tick.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        info!(
            "Starting dashboard session with {}s auto-refresh",
            self.refresh_interval.as_secs()
        );
        let period = self.refresh_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        let mut lines = input.lines();

        self.start_cycle(false);
        self.prompt();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("Auto-refreshing dashboard data");
                    self.start_cycle(true);
                }
                Some(outcome) = self.done_rx.recv() => {
                    self.dashboard.commit(outcome);
                    print!("{}", self.dashboard.status().render());
                    self.prompt();
                }
                Some(result) = self.export_rx.recv() => {
                    report_export(&result);
                    self.prompt();
                }
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if self.handle_line(&line) == Flow::Quit {
                            break;
                        }
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Validate and, if accepted, fetch in the background.
    ///
    /// Nothing waits on the spawned fetch; its outcome is committed whenever
    /// it arrives, even if a newer cycle was started meanwhile.
    fn start_cycle(&mut self, is_auto: bool) {
        match self.dashboard.begin_cycle(is_auto) {
            Some(request) => {
                let api = self.dashboard.api();
                let done = self.done_tx.clone();
                tokio::spawn(async move {
                    let outcome = fetch_cycle(api.as_ref(), request).await;
                    // receiver only goes away when the session ends
                    let _ = done.send(outcome);
                });
            }
            None => print!("{}", self.dashboard.status().render()),
        }
    }

    fn start_export(&self) {
        let api = self.dashboard.api();
        let filters = self.dashboard.export_filters();
        let dir = self.dashboard.export_dir().to_path_buf();
        let done = self.export_tx.clone();
        info!("Exporting spreadsheet to {}", dir.display());
        tokio::spawn(async move {
            let result = export_spreadsheet(api.as_ref(), &filters, &dir).await;
            let _ = done.send(result);
        });
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }

        let event = match parse_command(line) {
            Ok(event) => event,
            Err(e) => {
                println!("{}", e);
                return Flow::Continue;
            }
        };

        match self.dashboard.apply(event) {
            Effect::None => {}
            Effect::Reconcile => self.start_cycle(false),
            Effect::Copy(id) => println!("{}", self.dashboard.copy_id(&id)),
            Effect::Export => self.start_export(),
            Effect::ShowHelp => println!("{}", HELP),
            Effect::Quit => return Flow::Quit,
        }

        self.prompt();
        Flow::Continue
    }

    fn prompt(&self) {
        println!("{}", describe_view(&self.dashboard.view_state()));
    }

    #[cfg(test)]
    pub fn dashboard(&self) -> &Dashboard<A, M, C> {
        &self.dashboard
    }

    /// Wait for the next fetch to settle and commit it
    #[cfg(test)]
    pub async fn commit_next(&mut self) {
        if let Some(outcome) = self.done_rx.recv().await {
            self.dashboard.commit(outcome);
        }
    }

    #[cfg(test)]
    pub async fn next_export(&mut self) -> Option<ExportResult> {
        self.export_rx.recv().await
    }
}

fn report_export(result: &ExportResult) {
    match result {
        Ok(path) => println!("Planilha salva em {}", path.display()),
        Err(e) => {
            error!("Export failed: {}", e);
            eprintln!("\n  ⚠  {}\n", e.alert_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ExportPayload};
    use crate::clipboard::{Clipboard, ClipboardError, ClipboardStrategy};
    use crate::config::DashboardConfig;
    use crate::filters::ValidatedFilters;
    use crate::model::{CriticalPointRow, KpiSummary, ZoneCollection};
    use crate::render::{TextChart, TextMap};
    use async_trait::async_trait;
    use std::io::Sink;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncWriteExt, BufReader};

    #[derive(Default)]
    struct CountingApi {
        calls: AtomicUsize,
        hang_export: AtomicBool,
    }

    impl CountingApi {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DashboardApi for CountingApi {
        async fn kpis(&self, _: &ValidatedFilters) -> Result<KpiSummary, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(KpiSummary::default())
        }
        async fn map_data(&self, _: &ValidatedFilters) -> Result<ZoneCollection, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ZoneCollection::default())
        }
        async fn critical_points(&self, _: &ValidatedFilters) -> Result<Vec<CriticalPointRow>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
        async fn export(&self, _: &ValidatedFilters) -> Result<ExportPayload, ApiError> {
            if self.hang_export.load(Ordering::SeqCst) {
                return std::future::pending().await;
            }
            Err(ApiError::Status {
                endpoint: "export",
                status: 400,
                body: "Período obrigatório.".to_string(),
            })
        }
    }

    struct NoClipboard;

    impl ClipboardStrategy for NoClipboard {
        fn name(&self) -> &'static str {
            "none"
        }
        fn copy(&self, _: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::Unavailable("none"))
        }
    }

    type TestSession = Session<CountingApi, TextMap<Sink>, TextChart<Sink>>;

    fn session(api: Arc<CountingApi>) -> TestSession {
        let dashboard = Dashboard::new(
            api,
            TextMap::new(std::io::sink()),
            TextChart::new(std::io::sink()),
            &DashboardConfig::default(),
        )
        .with_clipboard(Clipboard::new(vec![Box::new(NoClipboard)]));
        Session::new(dashboard, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn refresh_command_fetches_in_background() {
        let api = Arc::new(CountingApi::default());
        let mut session = session(api.clone());

        assert_eq!(session.handle_line("refresh"), Flow::Continue);
        session.commit_next().await;

        assert_eq!(api.calls(), 3);
        assert!(session.dashboard().cache().is_populated());
    }

    #[tokio::test]
    async fn layer_toggle_does_not_fetch() {
        let api = Arc::new(CountingApi::default());
        let mut session = session(api.clone());
        session.handle_line("layer good off");
        assert_eq!(api.calls(), 0);
        assert!(!session.dashboard().view_state().layers.good);
    }

    #[tokio::test]
    async fn bad_input_and_failures_keep_session_alive() {
        let mut session = session(Arc::new(CountingApi::default()));
        assert_eq!(session.handle_line("nonsense"), Flow::Continue);
        assert_eq!(session.handle_line("copy abc"), Flow::Continue);
        assert_eq!(session.handle_line("export"), Flow::Continue);
        assert_eq!(session.handle_line(""), Flow::Continue);
        assert_eq!(session.handle_line("quit"), Flow::Quit);
    }

    #[tokio::test]
    async fn rejected_export_reports_server_message() {
        let mut session = session(Arc::new(CountingApi::default()));
        session.handle_line("export");

        let err = session.next_export().await.unwrap().unwrap_err();
        assert_eq!(err.alert_message(), "Período obrigatório.");
    }

    #[tokio::test]
    async fn run_stops_at_end_of_input() {
        let mut session = session(Arc::new(CountingApi::default()));
        let input: &[u8] = b"map tmut\nhelp\n";
        session.run(input).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_export_does_not_block_input() {
        let api = Arc::new(CountingApi::default());
        api.hang_export.store(true, Ordering::SeqCst);
        let mut session = session(api);

        let input: &[u8] = b"export\nquit\n";
        let finished = time::timeout(Duration::from_secs(2), session.run(input)).await;
        assert!(finished.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_fires_one_period_after_start() {
        let api = Arc::new(CountingApi::default());
        let mut session = session(api.clone());
        let (mut writer, reader) = tokio::io::duplex(64);

        let observer = api.clone();
        let typist = tokio::spawn(async move {
            time::sleep(Duration::from_secs(59)).await;
            let before_tick = observer.calls();
            time::sleep(Duration::from_secs(2)).await;
            writer.write_all(b"quit\n").await.unwrap();
            (before_tick, writer)
        });

        session.run(BufReader::new(reader)).await.unwrap();
        let (before_tick, _writer) = typist.await.unwrap();

        // initial manual cycle only
        assert_eq!(before_tick, 3);
        assert_eq!(api.calls(), 6);
        assert_eq!(session.dashboard().last_committed(), 2);
        assert!(session.dashboard().cache().is_populated());
        assert!(!session.dashboard().status().loading);
    }
}
